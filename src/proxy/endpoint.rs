//! Proxy endpoint and routing-mapping value types.

use std::fmt;

use serde::Serialize;

/// An HTTP proxy endpoint. Equality and hashing use `(host, port)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
}

impl ProxyEndpoint {
    /// Returns `None` for an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> Option<Self> {
        let host = host.into();
        let host = host.trim();
        if host.is_empty() || port == 0 {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port,
        })
    }

    /// Parses a single `host:port` line.
    ///
    /// Returns `None` for blank lines, missing colon, empty host, or a port
    /// that is not a positive integer in `1..=65535`.
    ///
    /// ```
    /// use flight_ingest::proxy::ProxyEndpoint;
    ///
    /// let endpoint = ProxyEndpoint::parse_line(" 10.0.0.1:8080 ").unwrap();
    /// assert_eq!(endpoint.host(), "10.0.0.1");
    /// assert_eq!(endpoint.port(), 8080);
    /// assert!(ProxyEndpoint::parse_line("10.0.0.1").is_none());
    /// ```
    pub fn parse_line(line: &str) -> Option<Self> {
        let (host, port_text) = line.trim().split_once(':')?;
        let port = port_text.trim().parse::<u16>().ok()?;
        Self::new(host, port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Proxy URL form, `http://host:port`.
    pub fn as_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Routing mapping sending both schemes through this endpoint.
    pub fn mapping(&self) -> ProxyMapping {
        let url = self.as_url();
        ProxyMapping {
            http: Some(url.clone()),
            https: Some(url),
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Per-scheme proxy routing, `{"http": "http://host:port", "https": ...}`.
///
/// Handed out by the pool for one request and handed back on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyMapping {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyMapping {
    /// The proxy URL to route through: `http` entry first, then `https`.
    pub fn url(&self) -> Option<&str> {
        self.http.as_deref().or(self.https.as_deref())
    }

    /// Parses the routed URL back into an endpoint.
    ///
    /// Only `http://host:port` forms are recognised; anything else yields `None`.
    pub fn endpoint(&self) -> Option<ProxyEndpoint> {
        let url = self.url()?;
        let host_port = url.strip_prefix("http://")?;
        let host_port = host_port.trim_end_matches('/');
        ProxyEndpoint::parse_line(host_port)
    }

    /// Host with all but the first IPv4 octet hidden, for logs.
    pub fn masked_host(&self) -> String {
        match self.endpoint() {
            Some(endpoint) => mask_host(endpoint.host()),
            None => "unknown".to_string(),
        }
    }
}

fn mask_host(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() == 4 {
        format!("{}.x.x.x", parts[0])
    } else {
        host.to_string()
    }
}
