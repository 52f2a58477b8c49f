pub mod cache;
pub mod error;
pub mod geo;
pub mod models;
pub mod reconcile;
pub mod remote;
pub mod scan;
pub mod settings;
pub mod tag;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;

use cache::CacheService;
use reconcile::Reconciler;
use remote::{ApiClient, Remote};
use scan::ScanController;
use settings::Settings;

pub use error::{ScanError, ValidationError};
pub use utils::init_logging;

/// Everything one client session shares: a single cache feeding both the
/// reconciler and the scan screen.
#[derive(Clone)]
pub struct FieldClient {
    pub settings: Settings,
    pub cache: Arc<CacheService>,
    pub reconciler: Reconciler,
    pub scan: ScanController,
}

impl FieldClient {
    pub fn new(remote: Arc<dyn Remote>, settings: Settings) -> Self {
        let cache = Arc::new(CacheService::new(
            remote.clone(),
            settings.freshness_window(),
        ));

        Self {
            reconciler: Reconciler::new(cache.clone()),
            scan: ScanController::new(cache.clone(), remote),
            cache,
            settings,
        }
    }

    /// Connect to the service described by `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = ApiClient::from_settings(&settings)?;
        log::info!("fieldscan client ready for {}", client.base_url());
        Ok(Self::new(Arc::new(client), settings))
    }

    /// Tear down: the scan screen stops accepting work and cached snapshots
    /// are dropped.
    pub async fn dispose(&self) {
        self.scan.unmount();
        self.cache.dispose().await;
    }
}
