//! Query execution over the `/query` and `/api/v2/query` endpoints.

use crate::{
    client::{run_cancellable, InfluxLinkClient},
    error::{LinkError, Result},
    models::{Query, Response},
};
use log::{debug, warn};
use serde::Deserialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

impl InfluxLinkClient {
    /// Run a query, abandoning it when `cancel` fires.
    ///
    /// Server-side statement errors come back inside the `Response`; only
    /// transport failures, undecodable bodies and unexpected statuses without
    /// an error body are returned as `Err`. A body with no JSON document at all
    /// yields [`LinkError::EmptyResponse`].
    pub async fn query(&self, query: &Query, cancel: &CancellationToken) -> Result<Response> {
        run_cancellable(cancel, self.send_query(query)).await
    }

    async fn send_query(&self, query: &Query) -> Result<Response> {
        let url = self.endpoint("query");
        let mut params = query.params();
        if !self.precision.is_empty() {
            params.push(("epoch", self.precision.clone()));
        }

        let preview = if query.command.len() > 80 {
            let cut = (0..=80).rev().find(|i| query.command.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &query.command[..cut])
        } else {
            query.command.clone()
        };
        debug!(
            "[LINK_QUERY] Starting query: \"{}\" (len={}, db={:?}, chunked={})",
            preview.replace('\n', " "),
            query.command.len(),
            query.database,
            query.chunked
        );

        let start = Instant::now();
        let request = self.http_client.post(&url).query(&params);
        let response = self.auth.apply_to_request(request).send().await?;
        let status = response.status();
        debug!(
            "[LINK_HTTP] Response received: status={} duration_ms={}",
            status,
            start.elapsed().as_millis()
        );

        let body = response.bytes().await?;
        let decoded = if query.chunked {
            decode_chunked(&body)?
        } else {
            decode_single(&body)?
        };

        match decoded {
            Some(decoded) => {
                if !status.is_success() && decoded.error().is_none() {
                    warn!("[LINK_HTTP] Server error without body: status={}", status);
                    return Err(LinkError::ServerError {
                        status_code: status.as_u16(),
                        message: status.canonical_reason().unwrap_or("unknown").to_string(),
                    });
                }
                debug!(
                    "[LINK_QUERY] Success: results={} total_ms={}",
                    decoded.results.len(),
                    start.elapsed().as_millis()
                );
                Ok(decoded)
            },
            None if status.is_success() => Err(LinkError::EmptyResponse),
            None => Err(LinkError::ServerError {
                status_code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }),
        }
    }

    /// Run a Flux script and return the annotated CSV the server produces.
    pub async fn query_flux(&self, script: &str, cancel: &CancellationToken) -> Result<String> {
        run_cancellable(cancel, self.send_flux(script)).await
    }

    async fn send_flux(&self, script: &str) -> Result<String> {
        let url = self.endpoint("api/v2/query");
        debug!("[LINK_QUERY] Starting flux query (len={})", script.len());

        let body = serde_json::json!({
            "query": script,
            "type": "flux",
            "dialect": {"annotations": ["datatype", "group", "default"]},
        });
        let request = self
            .http_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/csv")
            .json(&body);
        let response = self.auth.apply_to_request(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.is_empty() {
                return Err(LinkError::EmptyResponse);
            }
            return Ok(text);
        }

        warn!("[LINK_HTTP] Flux query failed: status={}", status);
        Err(LinkError::ServerError {
            status_code: status.as_u16(),
            message: extract_error_message(&text),
        })
    }
}

/// Decode a non-chunked body. `Ok(None)` when the body is blank.
fn decode_single(body: &[u8]) -> Result<Option<Response>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(body)?))
}

/// Decode a stream of concatenated JSON documents into one response,
/// stopping at the first chunk that reports a request-level error.
fn decode_chunked(body: &[u8]) -> Result<Option<Response>> {
    let mut merged: Option<Response> = None;
    for chunk in serde_json::Deserializer::from_slice(body).into_iter::<Response>() {
        let chunk = chunk?;
        let target = merged.get_or_insert_with(Response::default);
        if !target.append(chunk) {
            break;
        }
    }
    Ok(merged)
}

/// Pull `error` or `message` out of a JSON error body, falling back to the
/// trimmed text.
pub(crate) fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(msg), ..
        })
        | Ok(ErrorBody {
            message: Some(msg), ..
        }) => msg,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_blank_body() {
        assert!(decode_single(b"").unwrap().is_none());
        assert!(decode_single(b"  \n").unwrap().is_none());
        let response = decode_single(br#"{"results":[{"statement_id":0}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[test]
    fn test_decode_single_garbage() {
        let err = decode_single(b"<html>").unwrap_err();
        assert!(matches!(err, LinkError::SerializationError(_)));
    }

    #[test]
    fn test_decode_chunked_merges_results() {
        let body = concat!(
            r#"{"results":[{"statement_id":0,"series":[{"name":"cpu","columns":["v"],"values":[[1]]}],"partial":true}]}"#,
            "\n",
            r#"{"results":[{"statement_id":0,"series":[{"name":"cpu","columns":["v"],"values":[[2]]}]}]}"#,
            "\n"
        );
        let response = decode_chunked(body.as_bytes()).unwrap().unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.error().is_none());
    }

    #[test]
    fn test_decode_chunked_stops_on_error() {
        let body = concat!(
            r#"{"results":[{"statement_id":0}]}"#,
            r#"{"results":[],"error":"boom"}"#,
            r#"{"results":[{"statement_id":1}]}"#
        );
        let response = decode_chunked(body.as_bytes()).unwrap().unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.error(), Some("boom"));

        assert!(decode_chunked(b"").unwrap().is_none());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"error":"database not found"}"#), "database not found");
        assert_eq!(extract_error_message(r#"{"code":"invalid","message":"bad flux"}"#), "bad flux");
        assert_eq!(extract_error_message("plain failure\n"), "plain failure");
    }
}
