use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::coordinate::deserialize_opt_coordinate;
use super::intervention::InterventionRecord;

/// A physical inventory item as listed by `GET /assets`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    /// Scan tag; unique across live assets and never reissued.
    pub tag: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Technical attributes are passed through untouched.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, deserialize_with = "deserialize_opt_coordinate")]
    pub gps_lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_coordinate")]
    pub gps_lng: Option<f64>,
    /// Nested listing; the only place the owner of an intervention is
    /// reliably reported.
    #[serde(default)]
    pub interventions: Vec<InterventionRecord>,
}
