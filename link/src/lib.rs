//! # influx-link
//!
//! HTTP client library for InfluxDB 1.x servers.
//!
//! Covers the endpoints an interactive shell needs: `/ping` for liveness and
//! version discovery, `/query` (optionally chunked) for InfluxQL, `/write`
//! for line protocol and `/api/v2/query` for Flux scripts. Every request that
//! can run for long takes a [`CancellationToken`] so callers can abandon it.
//!
//! ```rust,no_run
//! use influx_link::{BatchPoints, InfluxLinkClient, Point, Query};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> influx_link::Result<()> {
//! let client = InfluxLinkClient::builder().address("localhost:8086").build()?;
//! let cancel = CancellationToken::new();
//!
//! client
//!     .write(
//!         &BatchPoints {
//!             points: vec![Point::raw("cpu,host=a value=0.5")],
//!             database: "telegraf".into(),
//!             ..BatchPoints::default()
//!         },
//!         &cancel,
//!     )
//!     .await?;
//!
//! let response = client
//!     .query(&Query::new("SELECT * FROM cpu").with_database("telegraf"), &cancel)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod connection_string;
pub mod error;
pub mod models;
pub mod query;
pub mod write;

pub use auth::AuthProvider;
pub use client::{InfluxLinkClient, InfluxLinkClientBuilder, VERSION_HEADER};
pub use connection_string::{parse_connection_string, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{LinkError, Result};
pub use models::{
    BatchPoints, Message, PingResponse, Point, Query, QueryResult, Response, Series, Value,
};
pub use tokio_util::sync::CancellationToken;
