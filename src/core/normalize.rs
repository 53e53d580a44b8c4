//! Converts source-native quotes into a canonical [`RateSet`].
//!
//! Every entry of the produced set reads "1 unit of `code` = `rate` units of the
//! domestic currency", whatever convention the upstream used.

use crate::core::currency::display_name;
use crate::core::error::SourceError;
use crate::core::rates::{DataQuality, RateEntry, RateSet};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Default symmetric spread applied when a source only publishes a midpoint.
pub const DEFAULT_SPREAD: f64 = 0.002;

/// A buy/sell quote already priced in domestic currency.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadQuote {
    pub code: String,
    pub buying: f64,
    pub selling: f64,
    /// Source-provided reference price, if any.
    pub mid: Option<f64>,
    /// Number of foreign units the prices refer to (1, 100, 1000...).
    pub unit: f64,
}

impl SpreadQuote {
    pub fn new(code: &str, buying: f64, selling: f64) -> Self {
        Self {
            code: code.to_string(),
            buying,
            selling,
            mid: None,
            unit: 1.0,
        }
    }
}

/// Quotes in the shape an upstream delivers them.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeQuotes {
    /// Prices in domestic currency, buy/sell already split.
    Domestic(Vec<SpreadQuote>),
    /// Midpoints where `1 base = value code`.
    ForeignBase {
        base: String,
        rates: Vec<(String, f64)>,
    },
}

/// Provenance and policy attached to a normalization run.
#[derive(Debug, Clone)]
pub struct SourceMeta {
    pub source: String,
    pub quality: DataQuality,
    pub reliability: String,
    pub timestamp: DateTime<Utc>,
    pub domestic: String,
    pub spread: f64,
}

fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn from_spread_quote(quote: &SpreadQuote) -> Option<(f64, f64, f64)> {
    if !usable(quote.unit) || !usable(quote.buying) || !usable(quote.selling) {
        return None;
    }
    let buying = quote.buying / quote.unit;
    let selling = quote.selling / quote.unit;
    let rate = match quote.mid {
        Some(mid) if usable(mid) => mid / quote.unit,
        Some(_) => return None,
        None => (buying + selling) / 2.0,
    };
    Some((buying, selling, rate))
}

pub fn normalize(native: NativeQuotes, meta: &SourceMeta) -> Result<RateSet, SourceError> {
    let domestic = meta.domestic.to_uppercase();
    let mut entries = BTreeMap::new();

    let mut insert = |code: String, buying: f64, selling: f64, rate: f64| {
        entries.insert(
            code.clone(),
            RateEntry {
                name: display_name(&code),
                code,
                buying,
                selling,
                rate,
                change: None,
                change_percent: None,
            },
        );
    };

    match native {
        NativeQuotes::Domestic(quotes) => {
            for quote in quotes {
                let code = quote.code.to_uppercase();
                if code == domestic {
                    continue;
                }
                match from_spread_quote(&quote) {
                    Some((buying, selling, rate)) => insert(code, buying, selling, rate),
                    None => debug!(code = %code, source = %meta.source, "Skipping malformed quote"),
                }
            }
        }
        NativeQuotes::ForeignBase { base, rates } => {
            let base = base.to_uppercase();
            let reference = if base == domestic {
                1.0
            } else {
                rates
                    .iter()
                    .find(|(code, _)| code.eq_ignore_ascii_case(&domestic))
                    .map(|(_, value)| *value)
                    .filter(|value| usable(*value))
                    .ok_or_else(|| {
                        SourceError::ParseError(format!(
                            "{} quotes against {} without a {} reference rate",
                            meta.source, base, domestic
                        ))
                    })?
            };

            let base_listed = rates.iter().any(|(code, _)| code.eq_ignore_ascii_case(&base));
            let implicit_base = (!base_listed).then(|| (base.clone(), 1.0));

            for (code, value) in rates.into_iter().chain(implicit_base) {
                let code = code.to_uppercase();
                if code == domestic {
                    continue;
                }
                if !usable(value) {
                    debug!(code = %code, source = %meta.source, "Skipping malformed rate");
                    continue;
                }
                let rate = reference / value;
                insert(
                    code,
                    rate * (1.0 - meta.spread),
                    rate * (1.0 + meta.spread),
                    rate,
                );
            }
        }
    }

    if entries.is_empty() {
        return Err(SourceError::EmptyResult(meta.source.clone()));
    }

    entries.insert(
        domestic.clone(),
        RateEntry {
            code: domestic.clone(),
            name: display_name(&domestic),
            buying: 1.0,
            selling: 1.0,
            rate: 1.0,
            change: None,
            change_percent: None,
        },
    );

    Ok(RateSet {
        base: domestic,
        entries,
        source: meta.source.clone(),
        data_quality: meta.quality,
        reliability: meta.reliability.clone(),
        timestamp: meta.timestamp,
        last_update: meta.timestamp.format("%Y-%m-%d").to_string(),
    })
}
