//! Client error type

/// Error from talking to the search endpoint.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP-level failure: transport error or a non-2xx response
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Response body did not decode as the expected JSON shape
    Json(serde_json::Error),
    /// Response decoded, but violated the expected protocol shape
    Unexpected(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Json(e) => write!(f, "invalid response: {e}"),
            Self::Unexpected(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::Json(_) | Self::Unexpected(_) => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
