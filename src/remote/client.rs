//! HTTP client for the inventory/maintenance service.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::{
    Asset, AssetReceipt, InterventionReceipt, InterventionRecord, NewAsset, NewIntervention,
};
use crate::settings::Settings;

use super::Remote;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Every response body is wrapped as `{ "payload": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    payload: T,
}

/// List endpoints nest their records one level deeper.
#[derive(Debug, Deserialize)]
struct DataList<T> {
    data: Vec<T>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.base_url, &settings.api_key, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET {path}"))?;

        handle_response(path, response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST {path}"))?;

        handle_response(path, response).await
    }
}

async fn handle_response<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("{path} returned {status}: {}", body.trim()));
    }

    let envelope: Envelope<T> = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {path} response body"))?;
    Ok(envelope.payload)
}

#[async_trait]
impl Remote for ApiClient {
    async fn list_assets(&self) -> Result<Vec<Asset>> {
        let list: DataList<Asset> = self.get("/assets").await?;
        Ok(list.data)
    }

    async fn list_interventions(&self) -> Result<Vec<InterventionRecord>> {
        let list: DataList<InterventionRecord> = self.get("/interventions").await?;
        Ok(list.data)
    }

    async fn create_asset(&self, asset: &NewAsset) -> Result<AssetReceipt> {
        self.post("/assets", asset).await
    }

    async fn create_intervention(&self, intervention: &NewIntervention) -> Result<InterventionReceipt> {
        self.post("/interventions", intervention).await
    }
}
