//! Error types for go2web

use std::io;
use thiserror::Error;

/// Errors that can occur during fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, TCP, TLS or socket I/O failure for the current hop
    #[error("Failed to connect to {addr}: {source}")]
    ConnectError {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Response had no blank line between headers and body
    #[error("Invalid response: no header/body boundary")]
    MalformedResponse,

    /// Redirect chain longer than the configured limit
    #[error("Too many redirects: limit of {0} exceeded")]
    TooManyRedirects(usize),

    /// Cache directory could not be prepared
    #[error("Cache unavailable")]
    CacheError(#[source] io::Error),

    /// Extractor found nothing to return
    #[error("Could not extract content from the page")]
    NoContent,
}

impl FetchError {
    /// Wrap an I/O error raised while talking to `addr`
    pub fn connect(addr: impl Into<String>, source: io::Error) -> Self {
        FetchError::ConnectError {
            addr: addr.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::MalformedResponse.to_string(),
            "Invalid response: no header/body boundary"
        );
        assert_eq!(
            FetchError::TooManyRedirects(10).to_string(),
            "Too many redirects: limit of 10 exceeded"
        );
        assert_eq!(
            FetchError::NoContent.to_string(),
            "Could not extract content from the page"
        );
    }

    #[test]
    fn test_connect_error_message() {
        let err = FetchError::connect(
            "example.com:80",
            io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to connect to example.com:80: connection refused"
        );
    }
}
