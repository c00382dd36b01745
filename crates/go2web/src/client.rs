//! Fetch orchestration
//!
//! [`Client::fetch`] is the whole pipeline: cache lookup, then per hop
//! normalize → connect → send → read until close → decode, following
//! redirects up to a fixed limit, then extraction and cache store.
//!
//! The cache is two-tier across redirects. Every hop checks the cache for
//! its own URL, and the final text is stored under both the URL the caller
//! asked for and the URL that finally answered.

use crate::cache::ResponseCache;
use crate::error::FetchError;
use crate::extract::{Extractor, HeuristicExtractor};
use crate::redirect::redirect_target;
use crate::request::frame_request;
use crate::response::{read_to_close, DecodedResponse, RawResponse};
use crate::target::RequestTarget;
use crate::transport::Transport;
use crate::DEFAULT_USER_AGENT;
use std::io::Write;
use tracing::{debug, info, warn};

/// Redirects followed before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Request options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Sent as `User-Agent`
    pub user_agent: String,
    /// Redirects followed before [`FetchError::TooManyRedirects`]
    pub max_redirects: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Builder for [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    options: FetchOptions,
    cache: Option<ResponseCache>,
    extractor: Option<Box<dyn Extractor>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.options.user_agent = ua.into();
        self
    }

    /// Set the redirect limit
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.options.max_redirects = max;
        self
    }

    /// Use this cache instead of the default directory
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the default [`HeuristicExtractor`]
    pub fn extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Build the client, opening the default cache if none was given
    pub fn build(self) -> Result<Client, FetchError> {
        let cache = match self.cache {
            Some(cache) => cache,
            None => ResponseCache::open_default()?,
        };
        Ok(Client {
            options: self.options,
            cache,
            extractor: self
                .extractor
                .unwrap_or_else(|| Box::new(HeuristicExtractor)),
        })
    }
}

/// Blocking, cache-backed web client
pub struct Client {
    options: FetchOptions,
    cache: ResponseCache,
    extractor: Box<dyn Extractor>,
}

impl Client {
    /// Create a client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client with default options and extractor over `cache`
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            options: FetchOptions::default(),
            cache,
            extractor: Box::new(HeuristicExtractor),
        }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetch `url` and return its extracted text
    pub fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(cached) = self.cache.lookup(url) {
            return Ok(cached);
        }

        let mut current = url.to_string();
        let mut redirects = 0;

        loop {
            let response = self.fetch_once(&current)?;

            if let Some(next) = redirect_target(&response, &current) {
                if redirects >= self.options.max_redirects {
                    warn!(url, limit = self.options.max_redirects, "Redirect limit reached");
                    return Err(FetchError::TooManyRedirects(self.options.max_redirects));
                }
                redirects += 1;
                debug!(from = %current, to = %next, status = ?response.status, "Following redirect");

                if let Some(cached) = self.cache.lookup(&next) {
                    self.remember(url, &cached);
                    return Ok(cached);
                }
                current = next;
                continue;
            }

            let text = self.extractor.extract(&response.text)?;
            debug!(extractor = self.extractor.name(), chars = text.len(), "Extracted text");

            self.remember(url, &text);
            if current != url {
                self.remember(&current, &text);
            }
            return Ok(text);
        }
    }

    /// One request/response exchange on a fresh connection
    fn fetch_once(&self, url: &str) -> Result<DecodedResponse, FetchError> {
        let target = RequestTarget::parse(url)?;
        let mut transport = Transport::connect(&target)?;
        let addr = target.addr();

        let request = frame_request(&target, &self.options.user_agent);
        transport
            .write_all(&request)
            .and_then(|_| transport.flush())
            .map_err(|e| FetchError::connect(&addr, e))?;

        let bytes = read_to_close(&mut transport).map_err(|e| FetchError::connect(&addr, e))?;
        let response = DecodedResponse::decode(RawResponse::split(&bytes)?);

        info!(url, status = ?response.status, bytes = bytes.len(), "Fetched");
        Ok(response)
    }

    /// Store without failing the fetch
    fn remember(&self, url: &str, text: &str) {
        if let Err(e) = self.cache.store(url, text) {
            warn!(url, error = %e, "Failed to write cache record");
        }
    }
}

/// Fetch `url` with default options, extractor and cache directory
pub fn fetch(url: &str) -> Result<String, FetchError> {
    Client::builder().build()?.fetch(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PassthroughExtractor;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_options_default() {
        let options = FetchOptions::default();
        assert_eq!(options.user_agent, "go2web/1.0");
        assert_eq!(options.max_redirects, 10);
    }

    #[test]
    fn test_builder() {
        let dir = TempDir::new().unwrap();
        let client = Client::builder()
            .user_agent("TestAgent/1.0")
            .max_redirects(3)
            .cache(ResponseCache::new(dir.path()).unwrap())
            .extractor(PassthroughExtractor)
            .build()
            .unwrap();

        assert_eq!(client.options().user_agent, "TestAgent/1.0");
        assert_eq!(client.options().max_redirects, 3);
        assert_eq!(client.cache().root(), dir.path());
        assert_eq!(client.extractor.name(), "passthrough");
    }

    #[test]
    fn test_cache_hit_skips_network() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::new(dir.path()).unwrap();
        // Port 9 on a reserved TEST-NET address: any connection attempt would fail
        let url = "http://192.0.2.1:9/";
        cache.store(url, "cached text").unwrap();

        let client = Client::new(cache);
        assert_eq!(client.fetch(url).unwrap(), "cached text");
    }

    #[test]
    fn test_unparseable_url_is_connect_error() {
        let dir = TempDir::new().unwrap();
        let client = Client::new(ResponseCache::new(dir.path()).unwrap());
        let err = client.fetch("http://").unwrap_err();
        assert!(matches!(err, FetchError::ConnectError { .. }));
    }
}
