//! Fans out to every rate source, picks a winner by configured priority and
//! caches it.

use crate::core::cache::RateCache;
use crate::core::config::AppConfig;
use crate::core::convert::{Conversion, convert, validate_amount};
use crate::core::error::{ConversionError, SourceError};
use crate::core::rates::{RateSet, RateSource};
use crate::providers::{StaticFallback, live_sources};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Settled result of one source within a fan-out.
#[derive(Debug)]
pub struct SourceOutcome {
    pub id: String,
    /// Position of the source in registration order.
    pub index: usize,
    pub result: Result<RateSet, SourceError>,
}

pub struct RateAggregator {
    sources: Vec<Arc<dyn RateSource>>,
    fallback: StaticFallback,
    priority: Vec<String>,
    cache: RateCache,
    refresh: Mutex<()>,
}

impl RateAggregator {
    pub fn new(
        sources: Vec<Arc<dyn RateSource>>,
        fallback: StaticFallback,
        priority: Vec<String>,
        cache: RateCache,
    ) -> Self {
        for id in &priority {
            if !sources.iter().any(|s| s.id() == id) {
                warn!(id = %id, "Priority names an unknown rate source");
            }
        }
        RateAggregator {
            sources,
            fallback,
            priority,
            cache,
            refresh: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            live_sources(config),
            StaticFallback::new(&config.domestic_currency),
            config.priority.clone(),
            RateCache::new(config.cache_ttl()),
        )
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Returns the current rate set. Never fails: when every source fails the
    /// static fallback is served.
    pub async fn get_rates(&self, force_refresh: bool) -> Arc<RateSet> {
        if !force_refresh && let Some(cached) = self.cache.get().await {
            return cached;
        }

        // one fan-out at a time; callers that waited reuse its result
        let _guard = self.refresh.lock().await;
        if !force_refresh && let Some(cached) = self.cache.get().await {
            debug!("Served by concurrent refresh");
            return cached;
        }

        let outcomes = self.fan_out().await;
        let winner = match self.select_winner(outcomes) {
            Some(winner) => winner,
            None => {
                warn!("All rate sources failed, using fallback data");
                self.fallback.rates()
            }
        };

        info!(
            source = %winner.source,
            quality = %winner.data_quality,
            entries = winner.len(),
            "Rates refreshed"
        );
        let winner = Arc::new(winner);
        self.cache.set(Arc::clone(&winner)).await;
        winner
    }

    /// Converts `amount` using the current rates. The amount is validated
    /// before any cache or network access.
    pub async fn convert(
        &self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<(Conversion, Arc<RateSet>), ConversionError> {
        let amount = validate_amount(amount)?;
        let rates = self.get_rates(false).await;
        let conversion = convert(&rates, from, to, amount)?;
        Ok((conversion, rates))
    }

    /// Runs every source concurrently, each bounded by its own timeout, and
    /// waits for all of them to settle.
    #[instrument(name = "RatesFanOut", skip(self), fields(sources = self.sources.len()))]
    pub async fn fan_out(&self) -> Vec<SourceOutcome> {
        let tasks = self.sources.iter().enumerate().map(|(index, source)| {
            let source = Arc::clone(source);
            async move {
                let id = source.id().to_string();
                let limit = source.timeout();
                let handle =
                    tokio::spawn(async move { tokio::time::timeout(limit, source.fetch()).await });

                let result = match handle.await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => Err(SourceError::UpstreamUnavailable(format!(
                        "timed out after {limit:?}"
                    ))),
                    Err(e) => Err(SourceError::UpstreamUnavailable(format!(
                        "source task failed: {e}"
                    ))),
                };

                match &result {
                    Ok(rates) => debug!(source = %id, entries = rates.len(), "Source succeeded"),
                    Err(e) => warn!(source = %id, error = %e, "Source failed"),
                }
                SourceOutcome { id, index, result }
            }
        });

        join_all(tasks).await
    }

    /// Position in the configured priority; unlisted sources rank after all
    /// listed ones, in registration order.
    fn rank(&self, outcome: &SourceOutcome) -> (usize, usize) {
        match self.priority.iter().position(|id| *id == outcome.id) {
            Some(position) => (0, position),
            None => (1, outcome.index),
        }
    }

    /// Picks the highest-priority successful outcome, independent of the
    /// order in which sources completed.
    pub fn select_winner(&self, outcomes: Vec<SourceOutcome>) -> Option<RateSet> {
        outcomes
            .into_iter()
            .filter(|outcome| outcome.result.is_ok())
            .min_by_key(|outcome| self.rank(outcome))
            .and_then(|outcome| outcome.result.ok())
    }
}
