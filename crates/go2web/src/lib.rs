//! go2web - raw-socket web client
//!
//! Fetches pages by speaking HTTP/1.1 directly over TCP or TLS sockets,
//! caches the processed result on disk for an hour, and reduces HTML to
//! readable text.
//!
//! ## Pipeline
//!
//! [`Client::fetch`] runs, per hop:
//! 1. [`RequestTarget::parse`] - normalize the URL (`http://` by default)
//! 2. [`Transport::connect`] - TCP, plus rustls for `https`
//! 3. [`frame_request`] - fixed `GET` request with `Connection: close`
//! 4. [`read_to_close`] - read until the server hangs up
//! 5. [`DecodedResponse::decode`] - split headers, undo chunked/gzip, decode text
//! 6. redirects are followed up to [`DEFAULT_MAX_REDIRECTS`] hops
//!
//! The final page goes through an [`Extractor`] and lands in the
//! [`ResponseCache`].
//!
//! ## Example
//!
//! ```no_run
//! use go2web::{Client, ResponseCache};
//!
//! let cache = ResponseCache::new("/tmp/go2web-cache")?;
//! let client = Client::new(cache);
//! println!("{}", client.fetch("example.com")?);
//! # Ok::<(), go2web::FetchError>(())
//! ```

pub mod cache;
pub mod client;
mod error;
pub mod extract;
pub mod redirect;
pub mod request;
pub mod response;
pub mod search;
pub mod target;
pub mod transport;

pub use cache::{CacheEntry, ResponseCache, DEFAULT_TTL};
pub use client::{fetch, Client, ClientBuilder, FetchOptions, DEFAULT_MAX_REDIRECTS};
pub use error::FetchError;
pub use extract::{Extractor, HeuristicExtractor, PassthroughExtractor};
pub use request::frame_request;
pub use response::{read_to_close, Charset, DecodedResponse, RawResponse};
pub use search::{format_results, search, SearchResult};
pub use target::{RequestTarget, Scheme};
pub use transport::Transport;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "go2web/1.0";
