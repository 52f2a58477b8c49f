use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Asset, InterventionRecord};
use crate::remote::Remote;

use super::entry::Snapshot;
use super::manager::{CollectionCache, Fetcher};
use super::FetchError;

struct AssetFetcher(Arc<dyn Remote>);

#[async_trait]
impl Fetcher<Asset> for AssetFetcher {
    async fn fetch(&self) -> anyhow::Result<Vec<Asset>> {
        self.0.list_assets().await
    }
}

struct InterventionFetcher(Arc<dyn Remote>);

#[async_trait]
impl Fetcher<InterventionRecord> for InterventionFetcher {
    async fn fetch(&self) -> anyhow::Result<Vec<InterventionRecord>> {
        self.0.list_interventions().await
    }
}

/// The two collection caches every consumer (map, scan flow, dashboard)
/// shares.
///
/// Construct once per session and hand out clones of the `Arc`; call
/// [`CacheService::dispose`] when the session ends.
pub struct CacheService {
    assets: CollectionCache<Asset>,
    interventions: CollectionCache<InterventionRecord>,
}

impl CacheService {
    pub fn new(remote: Arc<dyn Remote>, freshness: Duration) -> Self {
        Self {
            assets: CollectionCache::new(
                "assets",
                freshness,
                Arc::new(AssetFetcher(remote.clone())),
            ),
            interventions: CollectionCache::new(
                "interventions",
                freshness,
                Arc::new(InterventionFetcher(remote)),
            ),
        }
    }

    pub async fn assets(&self, force_refresh: bool) -> Result<Snapshot<Asset>, FetchError> {
        self.assets.get(force_refresh).await
    }

    pub async fn interventions(
        &self,
        force_refresh: bool,
    ) -> Result<Snapshot<InterventionRecord>, FetchError> {
        self.interventions.get(force_refresh).await
    }

    pub async fn invalidate_assets(&self) {
        self.assets.invalidate().await;
    }

    pub async fn invalidate_interventions(&self) {
        self.interventions.invalidate().await;
    }

    pub async fn asset_age(&self) -> Option<Duration> {
        self.assets.age().await
    }

    pub async fn intervention_age(&self) -> Option<Duration> {
        self.interventions.age().await
    }

    pub async fn dispose(&self) {
        self.assets.dispose().await;
        self.interventions.dispose().await;
    }
}
