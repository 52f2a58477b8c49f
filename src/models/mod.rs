pub mod asset;
pub mod coordinate;
pub mod intervention;
pub mod payloads;

pub use asset::Asset;
pub use intervention::{AssetRef, InterventionRecord, InterventionType, SENTINEL_ASSET_ID};
pub use payloads::{AssetReceipt, InterventionReceipt, NewAsset, NewIntervention};
