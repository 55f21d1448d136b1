//! # Bays
//!
//! Data-freshness and query layer for on-street parking bay records.
//!
//! The upstream open-data feed is slow and occasionally unavailable, so the
//! whole collection lives behind a single-slot TTL cache. A refresh rebuilds
//! the full canonical collection before publishing it; readers never see a
//! half-built collection. When a refresh fails and an older collection
//! exists, the stale collection is served with a warning rather than an
//! error.
//!
//! Bay type and restriction rules are synthesized deterministically from the
//! road segment id because the feed does not carry them; see
//! [`transform::classify_bay_type`].

pub mod cache;
pub mod geo;
pub mod models;
pub mod query;
pub mod remote;
pub mod transform;

pub use cache::{CacheEntry, FreshnessCache, Provenance, STALE_WARNING};
pub use models::{BayType, CanonicalBay, CostInfo, Restriction, Stats};
pub use remote::{Gateway, SyncGateway, UpstreamError};
