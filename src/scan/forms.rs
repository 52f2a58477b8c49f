use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::geo::{self, Axis};
use crate::models::{InterventionType, NewAsset, NewIntervention};

/// Intervention form contents as entered in the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterventionDraft {
    pub intervention_type: InterventionType,
    pub gps_lat: Option<f64>,
    pub gps_lng: Option<f64>,
    pub certificate_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub technician: Option<String>,
}

impl InterventionDraft {
    /// Build the write body, or explain why it cannot be sent.
    pub fn validate(
        &self,
        asset_id: &str,
        permitted: &[InterventionType],
    ) -> Result<NewIntervention, ValidationError> {
        if !permitted.contains(&self.intervention_type) {
            return Err(ValidationError::TypeNotPermitted(self.intervention_type));
        }

        let certificate_number = self.certificate_number.trim();
        if certificate_number.is_empty() {
            return Err(ValidationError::MissingField("certificate_number"));
        }

        let (gps_lat, gps_lng) = geo::format_pair(self.gps_lat, self.gps_lng)?;

        Ok(NewIntervention {
            asset_id: asset_id.to_string(),
            intervention_type: self.intervention_type,
            gps_lat,
            gps_lng,
            certificate_number: certificate_number.to_string(),
            notes: non_blank(&self.notes),
            technician: non_blank(&self.technician),
        })
    }
}

/// Creation form contents. The tag comes from the scan, not the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssetDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub gps_lat: Option<f64>,
    #[serde(default)]
    pub gps_lng: Option<f64>,
}

impl AssetDraft {
    /// Location is optional for assets, but half a pair is rejected.
    pub fn validate(&self, tag: &str) -> Result<NewAsset, ValidationError> {
        let (gps_lat, gps_lng) = match (self.gps_lat, self.gps_lng) {
            (None, None) => (None, None),
            (lat, lng) => {
                let lat = geo::format(lat, Axis::Lat)?;
                let lng = geo::format(lng, Axis::Lng)?;
                (Some(lat), Some(lng))
            }
        };

        Ok(NewAsset {
            tag: tag.to_string(),
            name: non_blank(&self.name),
            attributes: self.attributes.clone(),
            gps_lat,
            gps_lng,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
