//! Repairs the asset reference the flat intervention listing leaves out.

pub mod algorithm;

pub use algorithm::{
    history_for_asset, interventions_for_asset, reconcile, unresolved, OwnerIndex, Reconciled,
};

use std::sync::Arc;

use crate::cache::{CacheService, FetchError};

/// Reconciled interventions plus whether either input was a stale fallback.
#[derive(Debug, Clone)]
pub struct ReconciledSnapshot {
    pub reconciled: Reconciled,
    pub stale: bool,
}

#[derive(Clone)]
pub struct Reconciler {
    cache: Arc<CacheService>,
}

impl Reconciler {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }

    /// Fetch both collections through the cache and reconcile them.
    ///
    /// The asset listing is loaded and indexed in full before the flat
    /// listing is consulted.
    pub async fn interventions(&self, force_refresh: bool) -> Result<ReconciledSnapshot, FetchError> {
        let assets = self.cache.assets(force_refresh).await?;
        let index = OwnerIndex::build(&assets.records);

        let flat = self.cache.interventions(force_refresh).await?;
        let reconciled = algorithm::reconcile_with(&index, &flat.records);

        Ok(ReconciledSnapshot {
            stale: assets.is_stale() || flat.is_stale(),
            reconciled,
        })
    }
}
