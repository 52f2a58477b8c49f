//! In-memory [`Remote`] for deterministic tests.
//!
//! Collections are served from memory, writes are recorded, and every call is
//! counted so tests can assert on the exact number of network round trips.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map};

use crate::models::{
    Asset, AssetReceipt, InterventionReceipt, InterventionRecord, NewAsset, NewIntervention,
};

use super::Remote;

#[derive(Default)]
struct Collections {
    assets: Vec<Asset>,
    interventions: Vec<InterventionRecord>,
    created_assets: Vec<NewAsset>,
    created_interventions: Vec<NewIntervention>,
}

#[derive(Clone, Default)]
pub struct MockRemote {
    data: Arc<Mutex<Collections>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    asset_fetches: Arc<AtomicUsize>,
    intervention_fetches: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    read_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: Vec<Asset>) -> Self {
        let remote = Self::new();
        remote.set_assets(assets);
        remote
    }

    pub fn set_assets(&self, assets: Vec<Asset>) {
        self.lock().assets = assets;
    }

    pub fn set_interventions(&self, interventions: Vec<InterventionRecord>) {
        self.lock().interventions = interventions;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every list call sleep first, so concurrent callers overlap.
    pub fn set_read_delay(&self, delay: Duration) {
        if let Ok(mut guard) = self.read_delay.lock() {
            *guard = Some(delay);
        }
    }

    pub fn asset_fetches(&self) -> usize {
        self.asset_fetches.load(Ordering::SeqCst)
    }

    pub fn intervention_fetches(&self) -> usize {
        self.intervention_fetches.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn created_assets(&self) -> Vec<NewAsset> {
        self.lock().created_assets.clone()
    }

    pub fn created_interventions(&self) -> Vec<NewIntervention> {
        self.lock().created_interventions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        match self.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn before_read(&self) -> Result<()> {
        let delay = self.read_delay.lock().ok().and_then(|guard| *guard);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("mock remote unavailable");
        }
        Ok(())
    }

    fn before_write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("mock remote rejected write"));
        }
        Ok(())
    }
}

#[async_trait]
impl Remote for MockRemote {
    async fn list_assets(&self) -> Result<Vec<Asset>> {
        self.asset_fetches.fetch_add(1, Ordering::SeqCst);
        self.before_read().await?;
        Ok(self.lock().assets.clone())
    }

    async fn list_interventions(&self) -> Result<Vec<InterventionRecord>> {
        self.intervention_fetches.fetch_add(1, Ordering::SeqCst);
        self.before_read().await?;
        Ok(self.lock().interventions.clone())
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<AssetReceipt> {
        self.before_write()?;
        let mut data = self.lock();
        data.created_assets.push(asset.clone());
        Ok(AssetReceipt {
            id: format!("asset-{}", data.created_assets.len()),
            tag: Some(asset.tag.clone()),
            extra: Map::new(),
        })
    }

    async fn create_intervention(&self, intervention: &NewIntervention) -> Result<InterventionReceipt> {
        self.before_write()?;
        let mut data = self.lock();
        data.created_interventions.push(intervention.clone());
        let mut extra = Map::new();
        extra.insert("ledger_tx".into(), json!(format!("tx-{}", data.created_interventions.len())));
        Ok(InterventionReceipt {
            id: format!("intervention-{}", data.created_interventions.len()),
            extra,
        })
    }
}
