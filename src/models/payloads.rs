use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::intervention::InterventionType;

/// Body of `POST /assets`. Coordinates are pre-formatted strings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAsset {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_lng: Option<String>,
}

/// Body of `POST /interventions`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewIntervention {
    pub asset_id: String,
    pub intervention_type: InterventionType,
    pub gps_lat: String,
    pub gps_lng: String,
    pub certificate_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetReceipt {
    pub id: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Created intervention identifiers. Ledger and receipt metadata the service
/// attaches are kept verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterventionReceipt {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intervention_body_carries_string_coordinates() {
        let body = NewIntervention {
            asset_id: "a-1".into(),
            intervention_type: InterventionType::Verify,
            gps_lat: "45.000001".into(),
            gps_lng: "7.500000".into(),
            certificate_number: "CERT-1".into(),
            notes: None,
            technician: Some("jr".into()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "asset_id": "a-1",
                "intervention_type": "verify",
                "gps_lat": "45.000001",
                "gps_lng": "7.500000",
                "certificate_number": "CERT-1",
                "technician": "jr"
            })
        );
    }

    #[test]
    fn receipt_keeps_unknown_fields() {
        let receipt: InterventionReceipt = serde_json::from_value(json!({
            "id": "i-9",
            "ledger_tx": "0xabc",
            "receipt": { "block": 12 }
        }))
        .unwrap();
        assert_eq!(receipt.id, "i-9");
        assert_eq!(receipt.extra["ledger_tx"], json!("0xabc"));
        assert_eq!(receipt.extra["receipt"]["block"], json!(12));
    }
}
