use crate::core::currency::display_name;
use crate::core::rates::{DataQuality, RateEntry, RateSet};
use crate::providers::util::start_of_day;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::warn;

/// Currency the compiled-in snapshot is priced in.
const SNAPSHOT_CURRENCY: &str = "TRY";

/// Date the snapshot below was last refreshed.
const SNAPSHOT_DATE: (i32, u32, u32) = (2025, 10, 17);

/// (code, buying, selling, rate) in TRY
const SNAPSHOT: &[(&str, f64, f64, f64)] = &[
    ("USD", 42.30, 42.70, 42.50),
    ("EUR", 45.00, 45.40, 45.20),
    ("GBP", 52.50, 53.10, 52.80),
    ("JPY", 0.283, 0.287, 0.285),
    ("CHF", 47.20, 47.80, 47.50),
    ("CAD", 30.80, 31.20, 31.00),
    ("AUD", 28.30, 28.70, 28.50),
    ("SEK", 3.88, 3.92, 3.90),
];

/// Last-known rates compiled into the binary. Lowest trust tier; the
/// aggregator serves it directly when every live source failed, so it is not
/// registered as a `RateSource`.
pub struct StaticFallback {
    domestic: String,
}

impl StaticFallback {
    pub fn new(domestic: &str) -> Self {
        StaticFallback {
            domestic: domestic.to_uppercase(),
        }
    }

    fn snapshot(&self) -> RateSet {
        let (y, m, d) = SNAPSHOT_DATE;
        let timestamp = NaiveDate::from_ymd_opt(y, m, d)
            .map(start_of_day)
            .unwrap_or_else(Utc::now);

        let mut entries: BTreeMap<String, RateEntry> = SNAPSHOT
            .iter()
            .map(|(code, buying, selling, rate)| {
                let entry = RateEntry {
                    code: code.to_string(),
                    name: display_name(code),
                    buying: *buying,
                    selling: *selling,
                    rate: *rate,
                    change: None,
                    change_percent: None,
                };
                (code.to_string(), entry)
            })
            .collect();
        entries.insert(
            SNAPSHOT_CURRENCY.to_string(),
            RateEntry {
                code: SNAPSHOT_CURRENCY.to_string(),
                name: display_name(SNAPSHOT_CURRENCY),
                buying: 1.0,
                selling: 1.0,
                rate: 1.0,
                change: None,
                change_percent: None,
            },
        );

        RateSet {
            base: SNAPSHOT_CURRENCY.to_string(),
            entries,
            source: "Fallback (Latest Data)".to_string(),
            data_quality: DataQuality::Estimated,
            reliability: "Estimated (last known rates)".to_string(),
            timestamp,
            last_update: timestamp.format("%Y-%m-%d").to_string(),
        }
    }

    /// The snapshot priced in the configured domestic currency. When that
    /// currency is not part of the snapshot, the snapshot's own base is kept.
    pub fn rates(&self) -> RateSet {
        let snapshot = self.snapshot();
        if self.domestic == SNAPSHOT_CURRENCY {
            return snapshot;
        }
        match snapshot.rebased(&self.domestic) {
            Some(rebased) => rebased,
            None => {
                warn!(
                    domestic = %self.domestic,
                    "Static snapshot has no rate for domestic currency, serving {} base",
                    SNAPSHOT_CURRENCY
                );
                snapshot
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_rates() {
        let rates = StaticFallback::new("TRY").rates();

        assert_eq!(rates.data_quality, DataQuality::Estimated);
        assert_eq!(rates.base, "TRY");
        assert_eq!(rates.last_update, "2025-10-17");
        assert_eq!(rates.len(), SNAPSHOT.len() + 1);

        let usd = rates.get("USD").unwrap();
        assert_eq!((usd.buying, usd.selling, usd.rate), (42.30, 42.70, 42.50));
        assert_eq!(rates.get("TRY").unwrap().rate, 1.0);
    }

    #[test]
    fn test_every_entry_has_prices() {
        for entry in StaticFallback::new("TRY").rates().entries.values() {
            assert!(entry.selling > 0.0, "{}", entry.code);
            assert!(entry.buying > 0.0, "{}", entry.code);
            assert!(entry.selling >= entry.buying, "{}", entry.code);
        }
    }

    #[test]
    fn test_fallback_rebased_to_domestic() {
        let rates = StaticFallback::new("EUR").rates();
        assert_eq!(rates.base, "EUR");
        assert_eq!(rates.get("EUR").unwrap().rate, 1.0);
        assert!((rates.get("USD").unwrap().rate - 42.50 / 45.20).abs() < 1e-12);

        let unknown = StaticFallback::new("PLN").rates();
        assert_eq!(unknown.base, "TRY");
    }
}
