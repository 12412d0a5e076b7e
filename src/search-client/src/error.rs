/// Errors from the search service client
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Service answered with anything but `200 OK`
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        message: String,
    },
    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl SearchError {
    /// HTTP status code, when the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Api { status, .. } => Some(*status),
            SearchError::Http(e) => e.status().map(|s| s.as_u16()),
            SearchError::Deserialize(_) => None,
        }
    }
}
