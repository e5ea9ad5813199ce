//! Main InfluxDB client with builder pattern.
//!
//! Provides the primary interface for connecting to a server and running
//! queries and writes against it.

use crate::{
    auth::AuthProvider,
    connection_string::parse_connection_string,
    error::{LinkError, Result},
    models::PingResponse,
    query::extract_error_message,
};
use std::{future::Future, time::Duration, time::Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Header carrying the server build version on every reply.
pub const VERSION_HEADER: &str = "X-Influxdb-Version";

/// InfluxDB 1.x HTTP client.
///
/// Use [`InfluxLinkClientBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust,no_run
/// use influx_link::{InfluxLinkClient, Query};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = InfluxLinkClient::builder()
///     .address("localhost:8086")
///     .build()?;
///
/// let ping = client.ping().await?;
/// println!("server version {}", ping.version);
///
/// let response = client
///     .query(&Query::new("SHOW DATABASES"), &CancellationToken::new())
///     .await?;
/// println!("{:?}", response);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InfluxLinkClient {
    pub(crate) base_url: Url,
    pub(crate) http_client: reqwest::Client,
    pub(crate) auth: AuthProvider,
    pub(crate) precision: String,
}

impl InfluxLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> InfluxLinkClientBuilder {
        InfluxLinkClientBuilder::new()
    }

    /// Server address without a trailing slash, e.g. `http://localhost:8086`.
    pub fn addr(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// Replace the credentials sent with every subsequent request.
    pub fn set_auth(&mut self, username: &str, password: &str) {
        self.auth = AuthProvider::from_credentials(username, password);
    }

    pub fn auth(&self) -> &AuthProvider {
        &self.auth
    }

    /// Epoch precision requested for query timestamps; empty means RFC3339.
    pub fn set_precision(&mut self, precision: &str) {
        self.precision = precision.to_string();
    }

    pub fn precision(&self) -> &str {
        &self.precision
    }

    /// Check that the server answers and read its version header.
    ///
    /// Anything other than `204 No Content` is an error carrying the
    /// server's message.
    pub async fn ping(&self) -> Result<PingResponse> {
        let url = self.endpoint("ping");
        log::debug!("[LINK_PING] GET {}", url);

        let start = Instant::now();
        let request = self.auth.apply_to_request(self.http_client.get(url));
        let response = request.send().await?;
        let round_trip = start.elapsed();

        let version = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        log::debug!(
            "[LINK_PING] status={} version={:?} rtt_ms={}",
            response.status(),
            version,
            round_trip.as_millis()
        );

        let status = response.status();
        if status != reqwest::StatusCode::NO_CONTENT {
            let text = response.text().await.unwrap_or_default();
            let mut message = extract_error_message(&text);
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("unknown").to_string();
            }
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Err(LinkError::AuthenticationError(message));
            }
            return Err(LinkError::ServerError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(PingResponse {
            round_trip,
            version,
        })
    }

    /// `base_url` joined with an API path, preserving any path prefix.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.addr(), path)
    }
}

/// Runs `fut` until it completes or `cancel` fires, whichever is first.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LinkError::Cancelled),
        result = fut => result,
    }
}

/// Builder for configuring [`InfluxLinkClient`] instances.
pub struct InfluxLinkClientBuilder {
    base_url: Option<String>,
    address: Option<String>,
    ssl: bool,
    unsafe_ssl: bool,
    timeout: Option<Duration>,
    auth: AuthProvider,
    user_agent: String,
    precision: String,
}

impl InfluxLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            address: None,
            ssl: false,
            unsafe_ssl: false,
            timeout: None,
            auth: AuthProvider::none(),
            user_agent: format!("influx-link/{}", env!("CARGO_PKG_VERSION")),
            precision: String::new(),
        }
    }

    /// Full server URL such as `https://host:8086/prefix`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Shell-style `host:port[/prefix]` address; see
    /// [`parse_connection_string`]. Uses the scheme chosen by [`Self::ssl`].
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    pub fn ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Skip certificate verification.
    pub fn unsafe_ssl(mut self, unsafe_ssl: bool) -> Self {
        self.unsafe_ssl = unsafe_ssl;
        self
    }

    /// Per-request timeout; `None` waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn precision(mut self, precision: impl Into<String>) -> Self {
        self.precision = precision.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<InfluxLinkClient> {
        let base_url = match (self.address, self.base_url) {
            (Some(addr), _) => parse_connection_string(&addr, self.ssl)?,
            (None, Some(raw)) => Url::parse(&raw).map_err(|e| LinkError::InvalidConnectionString {
                input: raw.clone(),
                reason: e.to_string(),
            })?,
            (None, None) => {
                return Err(LinkError::ConfigurationError("base_url is required".into()))
            },
        };

        let mut client_builder = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .danger_accept_invalid_certs(self.unsafe_ssl);
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| LinkError::ConfigurationError(format!("Could not create client {}", e)))?;

        log::debug!("[CLIENT] Created client for {}", base_url);

        Ok(InfluxLinkClient {
            base_url,
            http_client,
            auth: self.auth,
            precision: self.precision,
        })
    }
}
