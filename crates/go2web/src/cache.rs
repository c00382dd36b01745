//! Disk-backed response cache
//!
//! One JSON file per URL under the cache root, holding the fully processed
//! text and the time it was written. Entries older than the TTL are
//! ignored, never deleted; the next successful fetch overwrites them.
//!
//! File names come from [`ResponseCache::key_for`], which replaces every
//! non-word character with `_`. That is a coarse mapping: `a.com/x-y` and
//! `a.com/x_y` share a record. There is no locking; two processes writing
//! the same key race and the last writer wins.

use crate::error::FetchError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Default time-to-live for cached entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Directory name under the user's home directory
pub const DEFAULT_DIR_NAME: &str = ".go2web_cache";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w]").expect("invalid cache key pattern"));

/// A persisted cache record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the record was written
    pub timestamp: DateTime<Utc>,
    /// Processed text returned by the fetch
    pub content: String,
}

impl CacheEntry {
    /// Valid while `now - timestamp < ttl`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.timestamp) < ttl,
            // A TTL too large for chrono never expires
            Err(_) => true,
        }
    }
}

/// URL-keyed TTL store rooted at a directory
#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Open (creating if needed) a cache rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(FetchError::CacheError)?;
        Ok(Self {
            root,
            ttl: DEFAULT_TTL,
        })
    }

    /// Open the cache at [`ResponseCache::default_dir`]
    pub fn open_default() -> Result<Self, FetchError> {
        Self::new(Self::default_dir())
    }

    /// `~/.go2web_cache`, or `./.go2web_cache` when there is no home directory
    pub fn default_dir() -> PathBuf {
        home::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    /// Set the time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// A separate cache in a subdirectory, sharing this cache's TTL
    ///
    /// Used by consumers that store something other than extracted text
    /// for the same URLs.
    pub fn namespaced(&self, name: &str) -> Result<Self, FetchError> {
        Ok(Self::new(self.root.join(Self::key_for(name)))?.with_ttl(self.ttl))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// File name for a URL: every non-word character becomes `_`
    pub fn key_for(url: &str) -> String {
        NON_WORD.replace_all(url, "_").into_owned()
    }

    /// Full path of the record for `url`
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(Self::key_for(url))
    }

    /// Cached content for `url`, if present and fresh
    pub fn lookup(&self, url: &str) -> Option<String> {
        self.lookup_at(url, Utc::now())
    }

    /// [`ResponseCache::lookup`] against an explicit clock
    pub fn lookup_at(&self, url: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.path_for(url);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Unreadable cache record");
                }
                debug!(url, "Cache miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache record, ignoring");
                return None;
            }
        };

        if entry.is_fresh_at(now, self.ttl) {
            debug!(url, "Cache hit");
            Some(entry.content)
        } else {
            debug!(url, timestamp = %entry.timestamp, "Cache entry expired");
            None
        }
    }

    /// Write `content` for `url`, replacing any existing record
    pub fn store(&self, url: &str, content: &str) -> io::Result<()> {
        self.store_at(url, content, Utc::now())
    }

    /// [`ResponseCache::store`] with an explicit timestamp
    pub fn store_at(&self, url: &str, content: &str, now: DateTime<Utc>) -> io::Result<()> {
        let entry = CacheEntry {
            timestamp: now,
            content: content.to_string(),
        };
        let json = serde_json::to_string(&entry)?;

        // Write beside the record and rename so readers never see half a file
        let path = self.path_for(url);
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(url, path = %path.display(), "Cached response");
        Ok(())
    }
}
