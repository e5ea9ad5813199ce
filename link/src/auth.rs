//! Authentication provider for the InfluxDB HTTP API.
//!
//! Attaches HTTP Basic credentials to outgoing requests.

use base64::{engine::general_purpose, Engine as _};

/// Credentials presented to the server.
///
/// # Examples
///
/// ```rust
/// use influx_link::AuthProvider;
///
/// let auth = AuthProvider::basic_auth("admin", "secret");
/// assert_eq!(auth.username(), "admin");
///
/// let anonymous = AuthProvider::none();
/// assert!(!anonymous.is_authenticated());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password)
    BasicAuth(String, String),

    /// No authentication (server has auth disabled)
    #[default]
    None,
}

impl AuthProvider {
    pub fn basic_auth(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::BasicAuth(username.into(), password.into())
    }

    /// Basic auth when a username is given, otherwise anonymous.
    pub fn from_credentials(username: &str, password: &str) -> Self {
        if username.is_empty() {
            Self::None
        } else {
            Self::basic_auth(username, password)
        }
    }

    pub fn none() -> Self {
        Self::None
    }

    pub fn username(&self) -> &str {
        match self {
            Self::BasicAuth(username, _) => username,
            Self::None => "",
        }
    }

    /// Value of the `Authorization` header, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::BasicAuth(username, password) => {
                // RFC 7617
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {}", encoded))
            },
            Self::None => None,
        }
    }

    /// Attach authentication headers to an HTTP request builder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.header_value() {
            Some(value) => request.header(reqwest::header::AUTHORIZATION, value),
            None => request,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
