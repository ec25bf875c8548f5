//! # Nonce Cache & Loader (spec §4.C)
//!
//! A single-owner, versioned cache of nonce material used as the HMAC key
//! for redaction branding. Per the re-architecture guidance this system
//! was distilled from: this is a struct constructed and owned by whoever
//! needs it (the Oracle orchestrator owns one for its lifetime; tests
//! construct their own), not module-global state — generalizing the
//! single-purpose replay cache this pattern is grounded on into the fuller
//! versioned/gettable/evictable contract spec §4.C describes.

use mirror_types::hexbytes::Hex64;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

/// Default TTL: one hour, per spec §4.C.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Minimum accepted length (hex characters) for a fetched nonce value.
/// Below this the value is treated as too short to carry real key
/// material, regardless of whether it is valid hex.
pub const MIN_NONCE_HEX_LEN: usize = 32;

/// One versioned nonce entry in the cache.
#[derive(Debug, Clone)]
pub struct NonceRecord {
    pub version: u32,
    pub value: String,
    pub loaded_at: Instant,
    pub loaded_at_wall: SystemTime,
    pub source: String,
}

impl NonceRecord {
    fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Errors from nonce cache / loader operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NonceError {
    /// `paramName` did not contain a `v<digits>` version suffix.
    #[error("parameter name '{0}' has no version suffix (expected .../v<N>)")]
    MissingVersionSuffix(String),

    /// The fetched value was not valid hex, or shorter than the minimum.
    #[error("fetched nonce value is not valid hex of at least {0} characters")]
    InvalidNonceFormat(usize),

    /// The fetcher failed and no unexpired cache entry exists to fall
    /// back on (fail-closed).
    #[error("secret store fetch failed and cache is empty/expired: {0}")]
    FetchFailed(String),

    /// No cached entry is both present and unexpired.
    #[error("no valid (unexpired) nonce in cache")]
    NoValidNonce,
}

/// Snapshot of one cache entry's status, as reported by [`NonceCache::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct NonceStatus {
    pub version: u32,
    pub age_ms: u128,
    pub valid: bool,
}

/// Thread-safe, versioned, TTL'd cache of nonce material.
///
/// Reads take a shared lock; writes (`load_nonce`, `evict`, `clear`) take
/// an exclusive lock — a single-writer/many-reader discipline, matching
/// spec §5's "single process-wide map; writes via a single-writer lock,
/// reads... under a shared lock."
pub struct NonceCache {
    entries: RwLock<BTreeMap<u32, NonceRecord>>,
    ttl: Duration,
}

impl NonceCache {
    /// Builds an empty cache using the default one-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Builds an empty cache with a custom TTL (tests use this to avoid
    /// sleeping a full hour to exercise expiry).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            ttl,
        }
    }

    fn extract_version(param_name: &str) -> Result<u32, NonceError> {
        let re = Regex::new(r"v(\d+)").unwrap();
        re.captures(param_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| NonceError::MissingVersionSuffix(param_name.to_string()))
    }

    /// Loads a nonce by calling `fetcher(param_name)`.
    ///
    /// On fetch success, the format is validated and the entry is
    /// inserted/overwritten for the version parsed from `param_name`.
    ///
    /// On fetch failure: if at least one unexpired entry already exists,
    /// this logs a degraded-mode warning and returns `Ok(())` (the cache
    /// is left untouched); otherwise the fetcher's error is surfaced
    /// (fail-closed).
    pub fn load_nonce<F>(&self, fetcher: F, param_name: &str) -> Result<(), NonceError>
    where
        F: FnOnce(&str) -> Result<String, String>,
    {
        let version = Self::extract_version(param_name)?;

        match fetcher(param_name) {
            Ok(value) => {
                if !Self::is_acceptable_format(&value) {
                    return Err(NonceError::InvalidNonceFormat(MIN_NONCE_HEX_LEN));
                }
                let record = NonceRecord {
                    version,
                    value,
                    loaded_at: Instant::now(),
                    loaded_at_wall: SystemTime::now(),
                    source: param_name.to_string(),
                };
                self.entries.write().insert(version, record);
                tracing::info!(target: "mirror_redaction", version, "loaded nonce");
                Ok(())
            }
            Err(fetch_err) => {
                if self.has_any_valid() {
                    tracing::warn!(
                        target: "mirror_redaction",
                        %fetch_err,
                        "secret store fetch failed; continuing in degraded mode on cached nonce"
                    );
                    Ok(())
                } else {
                    Err(NonceError::FetchFailed(fetch_err))
                }
            }
        }
    }

    fn is_acceptable_format(value: &str) -> bool {
        value.len() >= MIN_NONCE_HEX_LEN
            && value.len() % 2 == 0
            && value.bytes().all(|b| b.is_ascii_hexdigit())
    }

    fn has_any_valid(&self) -> bool {
        let entries = self.entries.read();
        entries.values().any(|r| !r.is_expired(self.ttl))
    }

    /// Returns the highest-version unexpired entry.
    pub fn get_latest(&self) -> Result<NonceRecord, NonceError> {
        let entries = self.entries.read();
        entries
            .values()
            .rev()
            .find(|r| !r.is_expired(self.ttl))
            .cloned()
            .ok_or(NonceError::NoValidNonce)
    }

    /// Returns all unexpired entries, descending by version.
    pub fn get_valid(&self) -> Vec<NonceRecord> {
        let entries = self.entries.read();
        entries
            .values()
            .rev()
            .filter(|r| !r.is_expired(self.ttl))
            .cloned()
            .collect()
    }

    /// Returns a specific version's record if present and unexpired.
    pub fn get(&self, version: u32) -> Result<NonceRecord, NonceError> {
        let entries = self.entries.read();
        entries
            .get(&version)
            .filter(|r| !r.is_expired(self.ttl))
            .cloned()
            .ok_or(NonceError::NoValidNonce)
    }

    /// Evicts a specific version regardless of expiry state.
    pub fn evict(&self, version: u32) {
        self.entries.write().remove(&version);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Reports every entry's version, age, and validity — including
    /// expired ones, unlike `get_valid`.
    pub fn status(&self) -> Vec<NonceStatus> {
        let entries = self.entries.read();
        entries
            .values()
            .map(|r| NonceStatus {
                version: r.version,
                age_ms: r.age().as_millis(),
                valid: !r.is_expired(self.ttl),
            })
            .collect()
    }

    /// True iff a given hex string would pass the loader's format check
    /// (exposed for tests and for callers pre-validating fetched secrets).
    pub fn looks_like_nonce(value: &str) -> bool {
        Self::is_acceptable_format(value) || Hex64::is_valid(value)
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_fetcher(value: &'static str) -> impl FnOnce(&str) -> Result<String, String> {
        move |_| Ok(value.to_string())
    }

    fn err_fetcher(msg: &'static str) -> impl FnOnce(&str) -> Result<String, String> {
        move |_| Err(msg.to_string())
    }

    #[test]
    fn loads_and_gets_latest() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        let latest = cache.get_latest().unwrap();
        assert_eq!(latest.version, 1);
    }

    #[test]
    fn missing_version_suffix_fails() {
        let cache = NonceCache::new();
        let err = cache
            .load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce")
            .unwrap_err();
        assert!(matches!(err, NonceError::MissingVersionSuffix(_)));
    }

    #[test]
    fn rejects_malformed_fetched_value() {
        let cache = NonceCache::new();
        let err = cache.load_nonce(ok_fetcher("not-hex"), "oracle/nonce/v1").unwrap_err();
        assert!(matches!(err, NonceError::InvalidNonceFormat(_)));
    }

    #[test]
    fn get_latest_picks_highest_version() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        cache.load_nonce(ok_fetcher(&"b".repeat(64)), "oracle/nonce/v2").unwrap();
        let latest = cache.get_latest().unwrap();
        assert_eq!(latest.version, 2);
    }

    #[test]
    fn get_valid_descends_by_version() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        cache.load_nonce(ok_fetcher(&"b".repeat(64)), "oracle/nonce/v2").unwrap();
        let versions: Vec<u32> = cache.get_valid().into_iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![2, 1]);
    }

    #[test]
    fn degraded_mode_when_fetch_fails_but_cache_valid() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        let result = cache.load_nonce(err_fetcher("network down"), "oracle/nonce/v2");
        assert!(result.is_ok());
        // v2 was never actually inserted.
        assert!(cache.get_valid().iter().all(|r| r.version != 2));
    }

    #[test]
    fn fail_closed_when_cache_empty_and_fetch_fails() {
        let cache = NonceCache::new();
        let err = cache.load_nonce(err_fetcher("network down"), "oracle/nonce/v1").unwrap_err();
        assert!(matches!(err, NonceError::FetchFailed(_)));
    }

    #[test]
    fn evict_removes_specific_version() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        cache.evict(1);
        assert!(matches!(cache.get_latest(), Err(NonceError::NoValidNonce)));
    }

    #[test]
    fn clear_removes_everything() {
        let cache = NonceCache::new();
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        cache.load_nonce(ok_fetcher(&"b".repeat(64)), "oracle/nonce/v2").unwrap();
        cache.clear();
        assert!(cache.get_valid().is_empty());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = NonceCache::with_ttl(Duration::from_millis(10));
        cache.load_nonce(ok_fetcher(&"a".repeat(64)), "oracle/nonce/v1").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(matches!(cache.get_latest(), Err(NonceError::NoValidNonce)));
        let status = cache.status();
        assert_eq!(status.len(), 1);
        assert!(!status[0].valid);
    }
}
