//! # Freshness Cache
//!
//! Single-slot in-memory cache over the canonical bay collection.
//!
//! Three logical states: Empty (nothing ever captured), Fresh (age < TTL),
//! Stale (age >= TTL). Reads on the fresh path never touch the network. On
//! miss or expiry the gateway is invoked behind a single-flight mutex, and
//! the entry is replaced wholesale; readers never observe a collection
//! mid-build. When the refresh fails and an older collection exists, that
//! collection is served with a warning instead of an error.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::CanonicalBay;
use crate::remote::{Gateway, UpstreamError};

/// Warning attached to stale-fallback responses so callers can tell
/// authoritative data from degraded data.
pub const STALE_WARNING: &str = "Using cached data, may not be the latest";

#[derive(Clone)]
pub struct CacheEntry {
    pub bays: Arc<Vec<CanonicalBay>>,
    pub captured_at: DateTime<Utc>,
}

/// Where a response's collection came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub cached: bool,
    pub last_updated: DateTime<Utc>,
    pub warning: Option<&'static str>,
}

pub struct FreshnessCache {
    entry: RwLock<Option<CacheEntry>>,
    // Single-flight guard: one refresh at a time. Losers of the race
    // re-check the entry and reuse a result written while they waited.
    refresh: Mutex<()>,
    ttl: chrono::Duration,
}

impl FreshnessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
            ttl: chrono::Duration::from_std(ttl).expect("cache TTL out of range"),
        }
    }

    /// Current collection with provenance, refreshing through `gateway` when
    /// the entry is missing or expired.
    pub async fn get<G: Gateway>(
        &self,
        gateway: &G,
    ) -> Result<(Arc<Vec<CanonicalBay>>, Provenance), UpstreamError> {
        if let Some(entry) = self.fresh_entry() {
            return Ok((
                entry.bays,
                Provenance {
                    cached: true,
                    last_updated: entry.captured_at,
                    warning: None,
                },
            ));
        }

        let _flight = self.refresh.lock().await;
        if let Some(entry) = self.fresh_entry() {
            return Ok((
                entry.bays,
                Provenance {
                    cached: true,
                    last_updated: entry.captured_at,
                    warning: None,
                },
            ));
        }

        match gateway.sync().await {
            Ok(bays) => {
                let entry = self.store(bays);
                info!("Cache refreshed, {} parking bays", entry.bays.len());
                Ok((
                    entry.bays,
                    Provenance {
                        cached: false,
                        last_updated: entry.captured_at,
                        warning: None,
                    },
                ))
            }
            Err(err) => match self.snapshot() {
                Some(entry) if !entry.bays.is_empty() => {
                    warn!("Upstream sync failed, serving stale cache: {err}");
                    Ok((
                        entry.bays,
                        Provenance {
                            cached: true,
                            last_updated: entry.captured_at,
                            warning: Some(STALE_WARNING),
                        },
                    ))
                }
                _ => Err(err),
            },
        }
    }

    /// Discards the entry and refetches. No stale fallback: the caller asked
    /// for fresh data explicitly. Returns the new collection size.
    pub async fn force_refresh<G: Gateway>(&self, gateway: &G) -> Result<usize, UpstreamError> {
        let _flight = self.refresh.lock().await;

        *self.entry.write().expect("cache lock poisoned") = None;

        let bays = gateway.sync().await?;
        let entry = self.store(bays);
        info!("Cache force-refreshed, {} parking bays", entry.bays.len());
        Ok(entry.bays.len())
    }

    /// Current entry without triggering a refresh. Stats, search, and lookup
    /// operations read whatever is cached, possibly nothing.
    pub fn snapshot(&self) -> Option<CacheEntry> {
        self.entry.read().expect("cache lock poisoned").clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|entry| entry.captured_at)
    }

    fn fresh_entry(&self) -> Option<CacheEntry> {
        self.snapshot()
            .filter(|entry| Utc::now().signed_duration_since(entry.captured_at) < self.ttl)
    }

    fn store(&self, bays: Vec<CanonicalBay>) -> CacheEntry {
        let entry = CacheEntry {
            bays: Arc::new(bays),
            captured_at: Utc::now(),
        };
        *self.entry.write().expect("cache lock poisoned") = Some(entry.clone());
        entry
    }
}
