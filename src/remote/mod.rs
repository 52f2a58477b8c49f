//! Remote inventory/maintenance service seam.
//!
//! [`Remote`] is the only way the rest of the crate talks to the service;
//! [`ApiClient`] is the HTTP implementation and [`MockRemote`] an in-memory
//! one for tests.

mod client;
mod mock;

pub use client::{ApiClient, API_KEY_HEADER};
pub use mock::MockRemote;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    Asset, AssetReceipt, InterventionReceipt, InterventionRecord, NewAsset, NewIntervention,
};

#[async_trait]
pub trait Remote: Send + Sync + 'static {
    /// `GET /assets`, each asset with its nested interventions.
    async fn list_assets(&self) -> Result<Vec<Asset>>;

    /// `GET /interventions`, flat; owner references are unreliable.
    async fn list_interventions(&self) -> Result<Vec<InterventionRecord>>;

    async fn create_asset(&self, asset: &NewAsset) -> Result<AssetReceipt>;

    async fn create_intervention(&self, intervention: &NewIntervention) -> Result<InterventionReceipt>;
}
