//! # Redaction Core (spec §4.B)
//!
//! HMAC-branded redacted text. Every [`RedactedText`] carries a `brand`
//! tying it to the nonce version that produced it and a `mac` binding it
//! to the original (pre-redaction) text, so a verifier holding the
//! original can confirm the redaction actually derives from it without
//! ever seeing the secret nonce material.
//!
//! Generalizes the centralized HMAC signing/validation this module is
//! grounded on (`sign_message` / `validate_hmac_signature`) from a fixed
//! pre-shared key to a rotating, multi-version nonce, with every
//! comparison done in constant time via [`subtle`].

use crate::nonce::{NonceCache, NonceError};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Domain-separation string branded into every [`RedactedText`].
pub const BRAND_CONTEXT: &[u8] = b"PHASE_MIRROR_REDACTED";

/// A single find-and-replace rule applied by [`redact`].
pub struct RedactionPattern {
    pub pattern: regex::Regex,
    pub replacement: String,
}

impl RedactionPattern {
    pub fn new(pattern: regex::Regex, replacement: impl Into<String>) -> Self {
        Self {
            pattern,
            replacement: replacement.into(),
        }
    }
}

/// HMAC-branded redacted text. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedactedText {
    pub brand: String,
    pub mac: String,
    pub nonce_version: u32,
    pub value: String,
    pub redaction_hits: usize,
}

/// Errors from redact/validate/verify operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RedactionError {
    #[error("no unexpired nonce available in cache")]
    NoValidNonce,
}

impl From<NonceError> for RedactionError {
    fn from(_: NonceError) -> Self {
        RedactionError::NoValidNonce
    }
}

fn hmac_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts a key of any length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Applies `patterns` to `input` in order, replacing every match and
/// counting total hits. Picks the latest unexpired nonce from `cache`
/// and brands the result with it.
pub fn redact(
    cache: &NonceCache,
    input: &str,
    patterns: &[RedactionPattern],
) -> Result<RedactedText, RedactionError> {
    let nonce = cache.get_latest()?;

    let mut value = input.to_string();
    let mut hits = 0usize;
    for p in patterns {
        hits += p.pattern.find_iter(&value).count();
        value = p.pattern.replace_all(&value, p.replacement.as_str()).into_owned();
    }

    let key = nonce.value.as_bytes();
    let brand = hmac_hex(key, BRAND_CONTEXT);
    let mac = hmac_hex(key, input.as_bytes());

    Ok(RedactedText {
        brand,
        mac,
        nonce_version: nonce.version,
        value,
        redaction_hits: hits,
    })
}

fn structurally_sound(candidate: &RedactedText) -> bool {
    candidate.brand.len() == 64
        && candidate.mac.len() == 64
        && candidate.brand.bytes().all(|b| b.is_ascii_hexdigit())
        && candidate.mac.bytes().all(|b| b.is_ascii_hexdigit())
}

fn ct_hex_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks that `candidate`'s brand was produced by the nonce version it
/// claims, as long as that version is still cached (grace period).
///
/// Does not require the original text — only the structural fields.
pub fn validate(cache: &NonceCache, candidate: &RedactedText) -> bool {
    if !structurally_sound(candidate) {
        return false;
    }
    let nonce = match cache.get(candidate.nonce_version) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let expected_brand = hmac_hex(nonce.value.as_bytes(), BRAND_CONTEXT);
    ct_hex_eq(&expected_brand, &candidate.brand)
}

/// Like [`validate`], but additionally recomputes the MAC over
/// `original_text` using the claimed nonce version and requires it to
/// match `candidate.mac` too — confirming the redaction genuinely
/// derives from that original text.
pub fn verify(cache: &NonceCache, candidate: &RedactedText, original_text: &str) -> bool {
    if !validate(cache, candidate) {
        return false;
    }
    let nonce = match cache.get(candidate.nonce_version) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let expected_mac = hmac_hex(nonce.value.as_bytes(), original_text.as_bytes());
    ct_hex_eq(&expected_mac, &candidate.mac)
}
