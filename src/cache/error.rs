//! Cache error types.

use thiserror::Error;

/// A refresh of a cached collection failed.
///
/// Carries the rendered cause rather than the source error so it can be
/// cloned to every caller waiting on the same refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or remote failure while refreshing.
    #[error("{collection} refresh failed: {message}")]
    Transient {
        collection: &'static str,
        message: String,
    },

    /// The refresh task ended without reporting a result.
    #[error("{collection} refresh was abandoned")]
    Abandoned { collection: &'static str },
}

impl FetchError {
    pub fn transient(collection: &'static str, err: &anyhow::Error) -> Self {
        FetchError::Transient {
            collection,
            message: format!("{err:#}"),
        }
    }
}
