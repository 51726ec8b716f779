//! Error type shared by the analysis engine and its upstream clients.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A route endpoint could not be resolved to a coordinate.
    #[error("could not geocode location '{0}'")]
    GeocodeNotFound(String),

    /// The upstream service answered, but not with a usable result.
    #[error("{service} returned an error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Transport-level failure talking to an upstream service.
    #[error("request to {service} failed")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure inside a background job that is not an upstream error.
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("failed to write artifact '{0}'")]
    ArtifactIo(PathBuf, #[source] std::io::Error),

    #[error("failed to encode artifact")]
    ArtifactEncode(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| AnalysisError::Http { service, source }
    }

    pub(crate) fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        AnalysisError::Upstream {
            service,
            message: message.into(),
        }
    }

    /// True for failures reported by (or while reaching) an upstream collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AnalysisError::Upstream { .. } | AnalysisError::Http { .. })
    }
}
