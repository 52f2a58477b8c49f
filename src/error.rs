//! Errors surfaced by the scan workflow.

use thiserror::Error;

use crate::cache::FetchError;
use crate::geo::PrecisionError;
use crate::models::InterventionType;

/// Rejected input. Never reaches the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error(transparent)]
    Coordinate(#[from] PrecisionError),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("intervention type '{0}' is not permitted for this asset")]
    TypeNotPermitted(InterventionType),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("no asset matches tag '{tag}'")]
    NotFound { tag: String },

    #[error("an asset with tag '{tag}' already exists")]
    Conflict { tag: String },

    /// Remote read failed and no earlier snapshot was available.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Remote write failed; the user must resubmit.
    #[error("write failed: {0:#}")]
    Write(anyhow::Error),

    #[error("{action} is not allowed while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("scan screen is no longer mounted")]
    Unmounted,
}

impl ScanError {
    /// Whether the session was reset as part of reporting this error.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            ScanError::NotFound { .. } | ScanError::Conflict { .. } | ScanError::Fetch(_)
        )
    }
}
