//! Time-boxed collection caches with stale-on-error fallback.
//!
//! [`CollectionCache`] holds one snapshot per collection and refreshes it from
//! a [`Fetcher`]; [`CacheService`] pairs the asset and intervention caches
//! behind the [`Remote`](crate::remote::Remote) seam.

mod entry;
mod error;
mod manager;
mod service;

pub use entry::{CacheEntry, Freshness, Snapshot};
pub use error::FetchError;
pub use manager::{CollectionCache, Fetcher};
pub use service::CacheService;
