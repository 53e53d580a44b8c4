use crate::core::rates::RateSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default lifetime of a cached rate set.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

struct CacheEntry {
    rates: Arc<RateSet>,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() <= ttl
    }
}

/// Single-slot, time-bound store for the current winning rate set.
///
/// Readers share the stored `Arc<RateSet>`; `set` swaps the slot wholesale.
/// Expired entries are dropped lazily on the next `get`.
pub struct RateCache {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self) -> Option<Arc<RateSet>> {
        {
            let slot = self.slot.read().await;
            match slot.as_ref() {
                Some(entry) if entry.is_fresh(self.ttl) => {
                    debug!(source = %entry.rates.source, "Cache HIT");
                    return Some(Arc::clone(&entry.rates));
                }
                Some(_) => {}
                None => {
                    debug!("Cache MISS");
                    return None;
                }
            }
        }

        let mut slot = self.slot.write().await;
        // another writer may have refreshed the slot in between
        if let Some(entry) = slot.as_ref() {
            if entry.is_fresh(self.ttl) {
                return Some(Arc::clone(&entry.rates));
            }
            debug!(source = %entry.rates.source, "Cache entry expired");
            *slot = None;
        }
        None
    }

    pub async fn set(&self, rates: Arc<RateSet>) {
        let mut slot = self.slot.write().await;
        debug!(source = %rates.source, "Cache PUT");
        *slot = Some(CacheEntry {
            rates,
            stored_at: Instant::now(),
        });
    }

    pub async fn clear(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
        debug!("Cache CLEAR");
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
