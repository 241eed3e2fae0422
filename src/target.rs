//! Target classification and validation
//!
//! A batch is made of [`Target`]s. Before any socket is opened the whole
//! batch goes through [`resolve_batch`], which turns every address into an
//! [`Endpoint`] and fails on the first entry that cannot be probed.
//!
//! Address strings are read as URLs:
//! - `http://site.com` → host `site.com`, port 80 (scheme default)
//! - `tcp://10.0.0.1:5000` → host `10.0.0.1`, port 5000
//! - `localhost:8080` → the scheme (`localhost`) is the host and the path (`8080`) the port
//! - `72.54.82.99:5000` / `[::1]:22` → not absolute URLs, read as `tcp://` authorities

use crate::error::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::{Host, Url};

/// One unit of work in a probe batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Remote endpoint checked with an outbound connect
    Address(String),
    /// Local port checked with a bind attempt
    Port(u16),
}

impl Target {
    pub fn address(address: impl Into<String>) -> Self {
        Target::Address(address.into())
    }

    pub fn port(port: u16) -> Self {
        Target::Port(port)
    }

    /// Classify a command-line entry: anything that reads as a port number
    /// is a local port, everything else is an address.
    pub fn parse(entry: &str) -> Self {
        match entry.trim().parse::<u16>() {
            Ok(port) => Target::Port(port),
            Err(_) => Target::Address(entry.trim().to_string()),
        }
    }

    /// Classify a dynamically typed entry.
    ///
    /// Strings are addresses and integers in `0..=65535` are ports. Any other
    /// value (booleans, objects, floats, out of range numbers) is rejected
    /// with an error naming the entry.
    pub fn from_value(index: usize, value: &Value) -> ProbeResult<Self> {
        match value {
            Value::String(address) => Ok(Target::Address(address.clone())),
            Value::Number(number) => number
                .as_u64()
                .and_then(|port| u16::try_from(port).ok())
                .map(Target::Port)
                .ok_or_else(|| ProbeError::InvalidTarget {
                    index,
                    value: value.to_string(),
                }),
            other => Err(ProbeError::InvalidTarget {
                index,
                value: other.to_string(),
            }),
        }
    }

    /// Classify a whole batch of dynamically typed entries, failing on the first bad one
    pub fn from_values(values: &[Value]) -> ProbeResult<Vec<Self>> {
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Self::from_value(index, value))
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Address(address) => write!(f, "{}", address),
            Target::Port(port) => write!(f, "{}", port),
        }
    }
}

impl From<u16> for Target {
    fn from(port: u16) -> Self {
        Target::Port(port)
    }
}

impl From<&str> for Target {
    fn from(address: &str) -> Self {
        Target::Address(address.to_string())
    }
}

impl From<String> for Target {
    fn from(address: String) -> Self {
        Target::Address(address)
    }
}

/// Host and port extracted from an address target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse an address string into an endpoint.
    ///
    /// Failures come back as [`ProbeError::ParseError`]; callers attach the batch index.
    pub fn parse(address: &str) -> ProbeResult<Self> {
        let url = match Url::parse(address) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("tcp://{}", address))?,
            Err(e) => return Err(e.into()),
        };

        // An empty host means the address was `name:port`, which parses as scheme:path
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => url.scheme().to_string(),
        };

        let port = match url.port_or_known_default() {
            Some(port) => port,
            None => {
                // `localhost:8080/` carries the port as `8080/`
                let path = url.path().trim_matches('/');
                if path.is_empty() {
                    return Err(ProbeError::ParseError("no port given".to_string()));
                }
                path.parse::<u16>()?
            }
        };

        Ok(Self { host, port })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A validated target ready to be probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeJob {
    Connect(Endpoint),
    Bind(u16),
}

/// Validate a batch before launching any probe.
///
/// Every address must yield an endpoint; the first one that does not fails
/// the whole batch with its index.
pub fn resolve_batch(targets: &[Target]) -> ProbeResult<Vec<ProbeJob>> {
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| resolve_target(index, target))
        .collect()
}

/// Validate a single target sitting at `index` of its batch
pub fn resolve_target(index: usize, target: &Target) -> ProbeResult<ProbeJob> {
    match target {
        Target::Port(port) => Ok(ProbeJob::Bind(*port)),
        Target::Address(address) => Endpoint::parse(address)
            .map(ProbeJob::Connect)
            .map_err(|e| e.at_entry(index, address)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_scheme_default_port() {
        assert_eq!(
            Endpoint::parse("http://site.com").unwrap(),
            Endpoint::new("site.com", 80)
        );
        assert_eq!(
            Endpoint::parse("https://site.com").unwrap(),
            Endpoint::new("site.com", 443)
        );
    }

    #[test]
    fn test_endpoint_explicit_port() {
        assert_eq!(
            Endpoint::parse("http://site.com:8080").unwrap(),
            Endpoint::new("site.com", 8080)
        );
        assert_eq!(
            Endpoint::parse("tcp://10.1.2.3:5000").unwrap(),
            Endpoint::new("10.1.2.3", 5000)
        );
    }

    #[test]
    fn test_endpoint_scheme_as_host() {
        assert_eq!(
            Endpoint::parse("localhost:5000").unwrap(),
            Endpoint::new("localhost", 5000)
        );
        assert_eq!(
            Endpoint::parse("domain.ext:6379").unwrap(),
            Endpoint::new("domain.ext", 6379)
        );
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        assert_eq!(
            Endpoint::parse("localhost:8080/").unwrap(),
            Endpoint::new("localhost", 8080)
        );
        assert_eq!(
            Endpoint::parse("tcp://10.1.2.3:5000/").unwrap(),
            Endpoint::new("10.1.2.3", 5000)
        );
    }

    #[test]
    fn test_endpoint_bare_ip() {
        assert_eq!(
            Endpoint::parse("72.54.82.99:5000").unwrap(),
            Endpoint::new("72.54.82.99", 5000)
        );
        let v6 = Endpoint::parse("[::1]:22").unwrap();
        assert_eq!(v6, Endpoint::new("::1", 22));
        assert_eq!(v6.to_string(), "[::1]:22");
    }

    #[test]
    fn test_endpoint_without_port() {
        assert!(Endpoint::parse("example.com").is_err());
        assert!(Endpoint::parse("localhost:").is_err());
        assert!(Endpoint::parse("localhost:99999").is_err());
        assert!(matches!(
            Endpoint::parse("localhost:http"),
            Err(ProbeError::ParseError(_))
        ));
        assert!(Endpoint::parse("").is_err());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(Target::parse("5000"), Target::Port(5000));
        assert_eq!(Target::parse("localhost:5000"), Target::address("localhost:5000"));
        assert_eq!(Target::parse("70000"), Target::address("70000"));
    }

    #[test]
    fn test_from_values() {
        let targets = Target::from_values(&[json!("localhost:80"), json!(5000)]).unwrap();
        assert_eq!(targets, vec![Target::address("localhost:80"), Target::port(5000)]);
    }

    #[test]
    fn test_from_values_rejects_unsupported_types() {
        for (value, rendered) in [
            (json!(true), "true"),
            (json!({"port": 80}), "{\"port\":80}"),
            (json!(80.5), "80.5"),
            (json!(-1), "-1"),
            (json!(65536), "65536"),
            (json!(null), "null"),
        ] {
            let err = Target::from_values(&[json!(5000), value]).unwrap_err();
            match err {
                ProbeError::InvalidTarget { index, value } => {
                    assert_eq!(index, 1);
                    assert_eq!(value, rendered);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_resolve_batch_reports_index() {
        let targets = vec![
            Target::port(5000),
            Target::address("localhost:80"),
            Target::address("nowhere"),
        ];

        match resolve_batch(&targets).unwrap_err() {
            ProbeError::InvalidAddress { index, address, .. } => {
                assert_eq!(index, 2);
                assert_eq!(address, "nowhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_batch_keeps_order() {
        let jobs = resolve_batch(&[Target::address("localhost:80"), Target::port(22)]).unwrap();
        assert_eq!(
            jobs,
            vec![
                ProbeJob::Connect(Endpoint::new("localhost", 80)),
                ProbeJob::Bind(22)
            ]
        );
    }
}
