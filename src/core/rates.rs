//! Rate snapshot types and the rate source abstraction

use crate::core::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Trust tier of a rate set. Ordered: `Official > Verified > Estimated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataQuality {
    Estimated,
    Verified,
    Official,
}

impl Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DataQuality::Official => "OFFICIAL",
                DataQuality::Verified => "VERIFIED",
                DataQuality::Estimated => "ESTIMATED",
            }
        )
    }
}

impl FromStr for DataQuality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OFFICIAL" => Ok(DataQuality::Official),
            "VERIFIED" => Ok(DataQuality::Verified),
            "ESTIMATED" => Ok(DataQuality::Estimated),
            _ => Err(anyhow::anyhow!("Invalid data quality: {}", s)),
        }
    }
}

/// One currency's quote, priced in units of the set's base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub code: String,
    pub name: String,
    pub buying: f64,
    pub selling: f64,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}

/// A coherent snapshot of rates from a single source.
///
/// Built once per aggregation cycle and shared behind an `Arc`; replaced,
/// never mutated, when a newer snapshot wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSet {
    pub base: String,
    pub entries: BTreeMap<String, RateEntry>,
    pub source: String,
    pub data_quality: DataQuality,
    pub reliability: String,
    /// When the upstream asserted the data valid, not when it was fetched.
    pub timestamp: DateTime<Utc>,
    pub last_update: String,
}

impl RateSet {
    pub fn get(&self, code: &str) -> Option<&RateEntry> {
        self.entries.get(&code.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-expresses every entry against `code`, which must be present with a
    /// positive rate. The receiver is left untouched.
    pub fn rebased(&self, code: &str) -> Option<RateSet> {
        let code = code.to_uppercase();
        if code == self.base {
            return Some(self.clone());
        }
        let pivot = self.entries.get(&code)?.rate;
        if !pivot.is_finite() || pivot <= 0.0 {
            return None;
        }

        let entries = self
            .entries
            .iter()
            .map(|(c, entry)| {
                let rebased = if *c == code {
                    RateEntry {
                        buying: 1.0,
                        selling: 1.0,
                        rate: 1.0,
                        ..entry.clone()
                    }
                } else {
                    RateEntry {
                        buying: entry.buying / pivot,
                        selling: entry.selling / pivot,
                        rate: entry.rate / pivot,
                        ..entry.clone()
                    }
                };
                (c.clone(), rebased)
            })
            .collect();

        Some(RateSet {
            base: code,
            entries,
            ..self.clone()
        })
    }
}

/// One upstream provider of currency rates.
///
/// Implementations issue their own requests, parse and normalize the result,
/// and hold no shared mutable state. Caching belongs to the aggregator.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Stable identifier used by the priority configuration.
    fn id(&self) -> &str;

    /// Upper bound the aggregator waits for `fetch`.
    fn timeout(&self) -> Duration;

    async fn fetch(&self) -> Result<RateSet, SourceError>;
}
