//! Scan screen orchestration: resolve a scanned tag, branch on the selected
//! operation, and drive the resulting form to a write.

pub mod controller;
pub mod forms;
pub mod state;
pub mod status;

pub use controller::ScanController;
pub use forms::{AssetDraft, InterventionDraft};
pub use state::{Modal, Resolution, ScanOperation, ScanOutcome, ScanPhase, ScanSession, WriteKind};
pub use status::{install_status, permitted_types, InstallStatus};
