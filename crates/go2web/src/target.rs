//! URL normalization
//!
//! Turns whatever the user typed into a [`RequestTarget`]. Parsing is
//! structural only: a string that cannot be parsed surfaces as a
//! [`FetchError::ConnectError`] for that input, the same way an unreachable
//! host would.

use crate::error::FetchError;
use std::fmt;
use std::io;
use url::{Host, Url};

/// Transport security of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `http://`
    Plain,
    /// `https://`
    Secure,
}

impl Scheme {
    /// Port used when the URL does not name one
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Plain => 80,
            Scheme::Secure => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Plain => write!(f, "http"),
            Scheme::Secure => write!(f, "https"),
        }
    }
}

/// Where a single request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub scheme: Scheme,
    /// Domain or IP address, IPv6 without brackets
    pub host: String,
    pub port: u16,
    /// Always starts with `/`
    pub path: String,
    /// Never empty when present
    pub query: Option<String>,
}

/// Prepend `http://` unless the input already carries an http(s) scheme
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

impl RequestTarget {
    /// Parse user input into a request target
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let normalized = normalize_url(input);
        let invalid = |msg: String| {
            FetchError::connect(input, io::Error::new(io::ErrorKind::InvalidInput, msg))
        };

        let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
        Self::from_url(&url).ok_or_else(|| invalid("URL has no host".to_string()))
    }

    /// Build a target from an already parsed http(s) URL
    pub fn from_url(url: &Url) -> Option<Self> {
        let scheme = match url.scheme() {
            "http" => Scheme::Plain,
            "https" => Scheme::Secure,
            _ => return None,
        };
        let host = match url.host()? {
            Host::Domain(domain) if domain.is_empty() => return None,
            Host::Domain(domain) => domain.to_string(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        };
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        let path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        let query = url.query().filter(|q| !q.is_empty()).map(str::to_string);

        Some(Self {
            scheme,
            host,
            port,
            path,
            query,
        })
    }

    /// Path plus query, as sent on the request line
    pub fn request_path(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// Host as written in a URL authority, IPv6 in brackets
    fn authority_host(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// Value for the `Host` header; the port is only named when non-default
    pub fn host_header(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.authority_host()
        } else {
            format!("{}:{}", self.authority_host(), self.port)
        }
    }

    /// `host:port` for error messages
    pub fn addr(&self) -> String {
        format!("{}:{}", self.authority_host(), self.port)
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Secure
    }
}
