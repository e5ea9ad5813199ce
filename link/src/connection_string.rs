//! Turns `host[:port][/path-prefix]` addresses into server URLs.

use crate::error::{LinkError, Result};
use url::Url;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8086;

/// Parses an address the way users type it at the shell.
///
/// Missing host falls back to `localhost`, missing port to `8086`. IPv6
/// hosts must be bracketed (`[::1]:8086`). Anything after the first `/` is
/// kept as a path prefix for servers mounted behind a reverse proxy.
///
/// ```rust
/// use influx_link::parse_connection_string;
///
/// let url = parse_connection_string("db.example.com:9999/influx", true).unwrap();
/// assert_eq!(url.as_str(), "https://db.example.com:9999/influx");
///
/// let url = parse_connection_string("", false).unwrap();
/// assert_eq!(url.as_str(), "http://localhost:8086/");
/// ```
pub fn parse_connection_string(addr: &str, ssl: bool) -> Result<Url> {
    let addr = addr.trim();
    let (host_port, prefix) = match addr.find('/') {
        Some(idx) => (&addr[..idx], addr[idx + 1..].trim_matches('/')),
        None => (addr, ""),
    };

    let (host, port) = split_host_port(host_port).map_err(|reason| {
        LinkError::InvalidConnectionString {
            input: addr.to_string(),
            reason,
        }
    })?;

    let scheme = if ssl { "https" } else { "http" };
    let host = if host.is_empty() { DEFAULT_HOST } else { host };
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };

    let raw = if prefix.is_empty() {
        format!("{}://{}:{}/", scheme, host, port)
    } else {
        format!("{}://{}:{}/{}", scheme, host, port, prefix)
    };

    Url::parse(&raw).map_err(|e| LinkError::InvalidConnectionString {
        input: addr.to_string(),
        reason: e.to_string(),
    })
}

/// Splits `host:port`. A bare host gets the default port; a bare `:port`
/// gets the default host (resolved by the caller).
fn split_host_port(input: &str) -> std::result::Result<(&str, u16), String> {
    if input.is_empty() {
        return Ok(("", DEFAULT_PORT));
    }

    if let Some(rest) = input.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| "missing ']' in address".to_string())?;
        let host = &input[..end + 2];
        let tail = &rest[end + 1..];
        return match tail.strip_prefix(':') {
            Some(port) => Ok((host, parse_port(port)?)),
            None if tail.is_empty() => Ok((host, DEFAULT_PORT)),
            None => Err(format!("unexpected {:?} after address", tail)),
        };
    }

    match input.matches(':').count() {
        0 => Ok((input, DEFAULT_PORT)),
        1 => match input.split_once(':') {
            Some((host, port)) => Ok((host, parse_port(port)?)),
            None => Ok((input, DEFAULT_PORT)),
        },
        _ => Err("too many colons in address".to_string()),
    }
}

fn parse_port(port: &str) -> std::result::Result<u16, String> {
    if port.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    port.parse::<u16>()
        .map_err(|e| format!("invalid port number {:?}: {}", port, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let url = parse_connection_string("", false).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8086/");

        let url = parse_connection_string(":9000", false).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");

        let url = parse_connection_string("influx.local", false).unwrap();
        assert_eq!(url.as_str(), "http://influx.local:8086/");
    }

    #[test]
    fn test_standard_ports_are_omitted() {
        let url = parse_connection_string("example.com:443", true).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");

        let url = parse_connection_string("example.com:80", false).unwrap();
        assert_eq!(url.as_str(), "http://example.com/");

        let url = parse_connection_string("example.com:443", false).unwrap();
        assert_eq!(url.as_str(), "http://example.com:443/");
    }

    #[test]
    fn test_path_prefix() {
        let url = parse_connection_string("localhost:8086/proxy/influx/", false).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8086/proxy/influx");
    }

    #[test]
    fn test_ipv6() {
        let url = parse_connection_string("[::1]:8087", false).unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8087/");

        let url = parse_connection_string("[::1]", false).unwrap();
        assert_eq!(url.port(), Some(8086));
    }

    #[test]
    fn test_invalid_port() {
        let err = parse_connection_string("localhost:abc", false).unwrap_err();
        assert!(matches!(err, LinkError::InvalidConnectionString { .. }));
        assert!(err.to_string().contains("invalid port number"));

        assert!(parse_connection_string("localhost:99999", false).is_err());
    }
}
