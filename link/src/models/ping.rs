use std::time::Duration;

/// Outcome of a `/ping` round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    pub round_trip: Duration,
    /// Value of the `X-Influxdb-Version` header; empty when absent
    pub version: String,
}
