//! Error types for influx-link.

use thiserror::Error;

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors raised by the HTTP client.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Client could not be constructed from the given settings
    #[error("{0}")]
    ConfigurationError(String),

    /// Address could not be turned into a server URL
    #[error("invalid connection string {input:?}: {reason}")]
    InvalidConnectionString { input: String, reason: String },

    /// Transport-level failure (DNS, refused connection, TLS, timeout)
    #[error("{0}")]
    NetworkError(String),

    /// Non-success status without a structured error body
    #[error("received status code {status_code} from server: {message}")]
    ServerError { status_code: u16, message: String },

    /// Body could not be decoded
    #[error("unable to decode json: {0}")]
    SerializationError(String),

    /// Server rejected the credentials
    #[error("{0}")]
    AuthenticationError(String),

    /// Server closed the exchange without sending a body
    #[error("")]
    EmptyResponse,

    /// Request was abandoned because its cancellation token fired
    #[error("")]
    Cancelled,
}

impl LinkError {
    /// True for errors that carry no diagnostic text of their own.
    ///
    /// Callers inspect their cancellation state to decide what to report
    /// for these.
    pub fn is_unlabeled(&self) -> bool {
        matches!(self, LinkError::EmptyResponse | LinkError::Cancelled)
    }
}

impl From<reqwest::Error> for LinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LinkError::SerializationError(err.to_string())
        } else {
            LinkError::NetworkError(describe_reqwest_error(&err))
        }
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::SerializationError(err.to_string())
    }
}

/// Flattens the source chain so TLS and socket causes show up in the message.
fn describe_reqwest_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
