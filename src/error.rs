use thiserror::Error;

/// Main error type for Cyrene client operations
#[derive(Debug, Error)]
pub enum CyreneError {
    /// Invalid construction arguments or environment
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Token exchange failed
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network failure on a protected request
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Protected request answered with a non-success status
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Server answered, but not with a readable envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Arguments rejected before any request was made
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CyreneError {
    /// Create an authentication error without an HTTP status
    pub fn authentication<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CyreneError::Authentication {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication error for a rejected token request
    pub fn authentication_status(status: u16, message: impl Into<String>) -> Self {
        CyreneError::Authentication {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Check if the token exchange failed
    pub fn is_authentication(&self) -> bool {
        matches!(self, CyreneError::Authentication { .. })
    }

    /// Check if the server could not be reached
    pub fn is_transport(&self) -> bool {
        matches!(self, CyreneError::Transport(_))
    }

    /// Check if the server answered with something other than an envelope
    pub fn is_malformed(&self) -> bool {
        matches!(self, CyreneError::MalformedResponse(_))
    }

    /// Get the HTTP status code, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CyreneError::Authentication { status, .. } => *status,
            CyreneError::Http { status, .. } => Some(*status),
            CyreneError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for Cyrene operations
pub type Result<T> = std::result::Result<T, CyreneError>;
