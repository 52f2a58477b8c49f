use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::coordinate::deserialize_opt_coordinate;

/// Placeholder owner the remote service understands as "unknown asset".
pub const SENTINEL_ASSET_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    Install,
    Maintain,
    Replace,
    Verify,
    Decommission,
}

impl InterventionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionType::Install => "install",
            InterventionType::Maintain => "maintain",
            InterventionType::Replace => "replace",
            InterventionType::Verify => "verify",
            InterventionType::Decommission => "decommission",
        }
    }
}

impl fmt::Display for InterventionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of an intervention record after reconciliation.
///
/// On the wire this is a plain id string; `Unresolved` is written as
/// [`SENTINEL_ASSET_ID`], and a missing, null or sentinel value reads back as
/// `Unresolved`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AssetRef {
    Known(String),
    #[default]
    Unresolved,
}

impl AssetRef {
    pub fn from_wire(value: Option<String>) -> Self {
        match value {
            Some(id) if !id.trim().is_empty() && !is_sentinel(&id) => AssetRef::Known(id),
            _ => AssetRef::Unresolved,
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            AssetRef::Known(id) => id,
            AssetRef::Unresolved => SENTINEL_ASSET_ID,
        }
    }

    pub fn known_id(&self) -> Option<&str> {
        match self {
            AssetRef::Known(id) => Some(id),
            AssetRef::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, AssetRef::Known(_))
    }
}

fn is_sentinel(id: &str) -> bool {
    Uuid::parse_str(id).map(|uuid| uuid.is_nil()).unwrap_or(false)
}

impl Serialize for AssetRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for AssetRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(AssetRef::from_wire)
    }
}

/// An event performed against one asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterventionRecord {
    pub id: String,
    pub intervention_type: InterventionType,
    #[serde(default, deserialize_with = "deserialize_opt_coordinate")]
    pub gps_lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_coordinate")]
    pub gps_lng: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
    #[serde(default)]
    pub certificate_number: Option<String>,
    pub performed_at: DateTime<Utc>,
    #[serde(default, rename = "asset_id")]
    pub asset: AssetRef,
}
