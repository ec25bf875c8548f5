//! # Cryptographic Redaction Subsystem
//!
//! HMAC-branded redacted text ([`redact`]/[`validate`]/[`verify`]) backed
//! by a multi-version, TTL'd [`NonceCache`] that degrades gracefully when
//! the secret store backing it is unreachable, but fails closed the
//! moment no unexpired nonce remains.
//!
//! `validate` answers "was this produced under a nonce version still in
//! the grace window" using only the fields on [`RedactedText`] itself.
//! `verify` additionally takes the pre-redaction text and confirms the
//! branded MAC actually derives from it. Both comparisons run in
//! constant time; neither ever touches the nonce's raw bytes in a log
//! line.

pub mod nonce;
pub mod redact;

pub use nonce::{NonceCache, NonceError, NonceRecord, NonceStatus, DEFAULT_TTL, MIN_NONCE_HEX_LEN};
pub use redact::{redact, validate, verify, RedactedText, RedactionError, RedactionPattern, BRAND_CONTEXT};
