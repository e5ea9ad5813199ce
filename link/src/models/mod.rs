//! Data models for influx-link client library.
//!
//! Defines the request structures sent to `/query` and `/write` and the
//! response structures decoded from the server's JSON replies.

pub mod batch_points;
pub mod ping;
pub mod query;
pub mod response;
pub mod value;

#[cfg(test)]
mod tests;

pub use batch_points::{BatchPoints, Point};
pub use ping::PingResponse;
pub use query::Query;
pub use response::{Message, QueryResult, Response, Series};
pub use value::Value;
