//! Analysis adapter error types.

use owlhub_domain::error::OwlHubError;

/// Errors specific to the HTTP analysis adapter.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisHttpError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed (connection, timeout, etc.).
    #[error("analysis request failed")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status code.
    #[error("analysis service returned HTTP {0}")]
    HttpStatus(u16),

    /// The response body was not JSON.
    #[error("analysis response is not valid JSON")]
    Decode(#[source] reqwest::Error),
}

impl AnalysisHttpError {
    /// Whether the service could not be reached at all.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Request(err) if err.is_connect())
    }

    /// Convert into the matching [`OwlHubError`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> OwlHubError {
        if self.is_unreachable() {
            OwlHubError::AnalysisUnreachable
        } else {
            OwlHubError::AnalysisProtocol(Box::new(self))
        }
    }
}

impl From<AnalysisHttpError> for OwlHubError {
    fn from(err: AnalysisHttpError) -> Self {
        err.into_domain()
    }
}
