use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

pub const ENV_BASE_URL: &str = "FIELDSCAN_BASE_URL";
pub const ENV_API_KEY: &str = "FIELDSCAN_API_KEY";
pub const ENV_FRESHNESS_SECS: &str = "FIELDSCAN_FRESHNESS_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub api_key: String,
    /// How long a cached collection is served without touching the network.
    pub freshness_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            freshness_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Read settings from `path` (defaults when absent), apply environment
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse settings in {}", path.display()))?
            }
            _ => Settings::default(),
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// `lookup` abstracts the environment so overrides are testable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(raw) = lookup(ENV_FRESHNESS_SECS) {
            self.freshness_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FRESHNESS_SECS} must be a number of seconds, got '{raw}'"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url is not configured (set {ENV_BASE_URL})");
        }
        if self.api_key.trim().is_empty() {
            bail!("api_key is not configured (set {ENV_API_KEY})");
        }
        if self.freshness_secs == 0 {
            bail!("freshness_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
