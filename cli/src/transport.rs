//! The shell's view of the server connection.
//!
//! [`Transport`] is the set of capabilities the shell consumes; the HTTP
//! client implements it, and tests substitute scripted fakes.

use async_trait::async_trait;
use influx_link::{
    AuthProvider, BatchPoints, CancellationToken, InfluxLinkClient, PingResponse, Query, Response,
};
use std::time::Duration;
use url::Url;

use crate::error::Result;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn ping(&self) -> influx_link::Result<PingResponse>;

    async fn query(&self, query: &Query, cancel: &CancellationToken)
        -> influx_link::Result<Response>;

    async fn query_flux(&self, script: &str, cancel: &CancellationToken)
        -> influx_link::Result<String>;

    async fn write(&self, batch: &BatchPoints, cancel: &CancellationToken)
        -> influx_link::Result<()>;

    fn set_auth(&mut self, username: &str, password: &str);

    fn set_precision(&mut self, precision: &str);

    fn addr(&self) -> String;
}

#[async_trait]
impl Transport for InfluxLinkClient {
    async fn ping(&self) -> influx_link::Result<PingResponse> {
        InfluxLinkClient::ping(self).await
    }

    async fn query(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> influx_link::Result<Response> {
        InfluxLinkClient::query(self, query, cancel).await
    }

    async fn query_flux(
        &self,
        script: &str,
        cancel: &CancellationToken,
    ) -> influx_link::Result<String> {
        InfluxLinkClient::query_flux(self, script, cancel).await
    }

    async fn write(
        &self,
        batch: &BatchPoints,
        cancel: &CancellationToken,
    ) -> influx_link::Result<()> {
        InfluxLinkClient::write(self, batch, cancel).await
    }

    fn set_auth(&mut self, username: &str, password: &str) {
        InfluxLinkClient::set_auth(self, username, password)
    }

    fn set_precision(&mut self, precision: &str) {
        InfluxLinkClient::set_precision(self, precision)
    }

    fn addr(&self) -> String {
        InfluxLinkClient::addr(self)
    }
}

/// Everything needed to open a connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub url: Url,
    pub username: String,
    pub password: String,
    pub unsafe_ssl: bool,
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub precision: String,
}

/// Creates transports. The shell reconnects through this on `connect`.
pub trait Connector: Send + Sync {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn Transport>>;
}

/// Opens HTTP connections with [`InfluxLinkClient`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn Transport>> {
        let client = InfluxLinkClient::builder()
            .base_url(settings.url.as_str())
            .auth(AuthProvider::from_credentials(&settings.username, &settings.password))
            .unsafe_ssl(settings.unsafe_ssl)
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .precision(settings.precision.clone())
            .build()?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_connector_builds_client() {
        let settings = ConnectionSettings {
            url: Url::parse("http://localhost:8086/").unwrap(),
            username: "admin".into(),
            password: "pw".into(),
            unsafe_ssl: false,
            timeout: None,
            user_agent: "InfluxDBShell/test".into(),
            precision: "s".into(),
        };
        let transport = HttpConnector.connect(&settings).unwrap();
        assert_eq!(transport.addr(), "http://localhost:8086");
    }
}
