pub mod exchangerate_api;
pub mod fallback;
pub mod fixer;
pub mod tcmb;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::rates::RateSource;
use std::sync::Arc;

pub use exchangerate_api::ExchangeRateApiSource;
pub use fallback::StaticFallback;
pub use fixer::FixerSource;
pub use tcmb::TcmbSource;

/// Builds the live sources described by `config`, in registration order.
pub fn live_sources(config: &AppConfig) -> Vec<Arc<dyn RateSource>> {
    let domestic = &config.domestic_currency;
    let sources = &config.sources;
    vec![
        Arc::new(ExchangeRateApiSource::new(
            &sources.exchangerate_api.url,
            sources.exchangerate_api.timeout(),
            domestic,
            config.spread,
        )),
        Arc::new(TcmbSource::new(
            &sources.tcmb.url,
            sources.tcmb.timeout(),
            domestic,
        )),
        Arc::new(FixerSource::new(
            &sources.fixer.url,
            sources.fixer.timeout(),
            sources.fixer.access_key.as_deref(),
            domestic,
            config.spread,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_PRIORITY;

    #[test]
    fn test_default_priority_names_live_sources() {
        let ids: Vec<String> = live_sources(&AppConfig::default())
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        for id in DEFAULT_PRIORITY {
            assert!(ids.contains(&id.to_string()), "{id} is not a live source");
        }
        assert_eq!(ids.len(), DEFAULT_PRIORITY.len());
    }

    #[test]
    fn test_live_sources_have_positive_timeouts() {
        // the static snapshot is served by the aggregator, never raced
        for source in live_sources(&AppConfig::default()) {
            assert!(!source.timeout().is_zero(), "{}", source.id());
        }
    }
}
