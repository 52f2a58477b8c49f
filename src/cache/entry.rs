use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::FetchError;

/// Last good snapshot of one collection.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub records: Arc<Vec<T>>,
    pub fetched_at: Instant,
    /// Set by `invalidate`; the records stay available as a fallback.
    pub invalidated: bool,
}

impl<T> CacheEntry<T> {
    pub fn new(records: Arc<Vec<T>>, fetched_at: Instant) -> Self {
        Self {
            records,
            fetched_at,
            invalidated: false,
        }
    }

    pub fn is_fresh(&self, window: Duration, now: Instant) -> bool {
        !self.invalidated && now.saturating_duration_since(self.fetched_at) < window
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }
}

/// Where a snapshot handed to a caller came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Served from memory inside the freshness window.
    Cached,
    /// Fetched from the remote for this call (or a call it joined).
    Refreshed,
    /// The refresh failed; this is the previous snapshot.
    Stale(FetchError),
}

/// Immutable view of a collection; cheap to clone.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub records: Arc<Vec<T>>,
    pub freshness: Freshness,
}

impl<T> Snapshot<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale(_))
    }

    pub fn stale_reason(&self) -> Option<&FetchError> {
        match &self.freshness {
            Freshness::Stale(err) => Some(err),
            _ => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
