use std::sync::Arc;

use thiserror::Error;

/// Outcome of a failed upstream forecast request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("City not found for: {0}")]
    CityNotFound(String),

    #[error("Unauthorized access to weather API")]
    Unauthorized,

    #[error("Client error: {0}")]
    ClientError(u16),

    #[error("Weather service API unavailable")]
    ServiceUnavailable,

    #[error("Unexpected upstream status: {0}")]
    UnexpectedStatus(u16),

    #[error("Malformed forecast payload: {0}")]
    UpstreamFormat(#[source] serde_json::Error),

    #[error("Forecast request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl FetchError {
    /// Upstream rejections carry a message that is safe to return to API callers.
    /// Everything else is reported as an opaque internal error.
    pub fn is_upstream_rejection(&self) -> bool {
        matches!(
            self,
            FetchError::CityNotFound(_)
                | FetchError::Unauthorized
                | FetchError::ClientError(_)
                | FetchError::ServiceUnavailable
        )
    }
}

/// Failure of a cached lookup.
///
/// The fetch error is shared, so every caller coalesced onto the same upstream
/// request observes the same value.
#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct LookupError(Arc<FetchError>);

impl LookupError {
    pub fn fetch_error(&self) -> &FetchError {
        &self.0
    }
}

impl From<Arc<FetchError>> for LookupError {
    fn from(err: Arc<FetchError>) -> Self {
        Self(err)
    }
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        Self(Arc::new(err))
    }
}
