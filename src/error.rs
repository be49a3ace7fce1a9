use thiserror::Error;

/// Type alias for Result with PrunerError
pub type Result<T> = std::result::Result<T, PrunerError>;

/// Error types for the mailbox pruner
#[derive(Error, Debug)]
pub enum PrunerError {
    /// Credential file, config file or command-line input is unusable
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Authorization code could not be read or was rejected
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Token file exists but cannot be decoded
    #[error("Cached token at {path} is unreadable: {reason} (rerun with --reauthorize to replace it)")]
    TokenCorrupt { path: String, reason: String },

    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A delete call failed part way through a run
    #[error("Unable to delete message {message_id}")]
    DeleteFailed {
        message_id: String,
        #[source]
        source: Box<PrunerError>,
    },

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PrunerError {
    /// Wrap an API failure with the id of the message being deleted
    pub fn delete_failed(message_id: impl Into<String>, source: PrunerError) -> Self {
        PrunerError::DeleteFailed {
            message_id: message_id.into(),
            source: Box::new(source),
        }
    }
}

/// Seconds Google asked us to wait on a 429, defaulting to 5
///
/// Only the delay-seconds form is read; the value is reported, not acted on.
fn retry_after_seconds<B>(response: &hyper::Response<B>) -> u64 {
    response
        .headers()
        .get(hyper::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(5)
}

impl From<google_gmail1::Error> for PrunerError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let message = format!(
                    "HTTP {}: {}",
                    status_code,
                    status.canonical_reason().unwrap_or("Unknown")
                );

                match status_code {
                    429 => PrunerError::RateLimitExceeded {
                        retry_after: retry_after_seconds(response),
                    },
                    404 => PrunerError::NotFound(message),
                    400 => PrunerError::BadRequest(message),
                    401 | 403 => PrunerError::Forbidden(message),
                    500..=599 => PrunerError::ServerError {
                        status: status_code,
                        message,
                    },
                    _ => PrunerError::ApiError(message),
                }
            }
            google_gmail1::Error::BadRequest(ref err) => PrunerError::BadRequest(format!("{}", err)),
            google_gmail1::Error::HttpError(ref err) => {
                PrunerError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => PrunerError::NetworkError(err.to_string()),
            google_gmail1::Error::MissingToken(err) => {
                PrunerError::AuthError(format!("No usable access token: {}", err))
            }
            _ => PrunerError::ApiError(error.to_string()),
        }
    }
}
