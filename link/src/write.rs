//! Line-protocol writes over the `/write` endpoint.

use crate::{
    client::{run_cancellable, InfluxLinkClient},
    error::{LinkError, Result},
    models::BatchPoints,
    query::extract_error_message,
};
use log::{debug, warn};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

impl InfluxLinkClient {
    /// Write a batch of points, abandoning the request when `cancel` fires.
    pub async fn write(&self, batch: &BatchPoints, cancel: &CancellationToken) -> Result<()> {
        run_cancellable(cancel, self.send_write(batch)).await
    }

    async fn send_write(&self, batch: &BatchPoints) -> Result<()> {
        let url = self.endpoint("write");
        debug!(
            "[LINK_WRITE] Writing {} point(s) db={:?} rp={:?} precision={:?}",
            batch.len(),
            batch.database,
            batch.retention_policy,
            batch.precision
        );

        let start = Instant::now();
        let request = self
            .http_client
            .post(&url)
            .query(&batch.params())
            .body(batch.body());
        let response = self.auth.apply_to_request(request).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(
                "[LINK_WRITE] Accepted: status={} duration_ms={}",
                status,
                start.elapsed().as_millis()
            );
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = extract_error_message(&text);
        warn!("[LINK_WRITE] Rejected: status={} message=\"{}\"", status, message);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LinkError::AuthenticationError(message));
        }
        Err(LinkError::ServerError {
            status_code: status.as_u16(),
            message,
        })
    }
}
