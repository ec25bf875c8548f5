//! The `State` value object L0 gates every transition on.

use serde::{Deserialize, Serialize};

/// The nonce embedded in a [`State`]: the value itself plus when it was
/// issued, used by L0's age check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateNonce {
    /// 64 lowercase hex characters (32 bytes).
    pub value: String,
    /// Milliseconds since epoch at which this nonce was issued.
    pub issued_at: i64,
}

/// Immutable per-evaluation input state that L0 validates before any
/// component is allowed to act on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub schema_version: u32,
    /// 32-byte schema hash, compared against the caller-supplied expected
    /// hash (L0 is a pure function of its inputs, so it does not hardcode
    /// an expected hash itself).
    pub schema_hash: [u8; 32],
    /// Upper 4 bits (0xF000) MUST be zero.
    pub permission_bits: u16,
    /// MUST be within `[0.0, 0.3]`.
    pub drift_magnitude: f64,
    pub nonce: StateNonce,
    /// MUST be exactly `1.0` if present.
    pub contraction_witness_score: Option<f64>,
}

/// Mask over the reserved (upper 4) permission bits.
pub const RESERVED_PERMISSION_MASK: u16 = 0xF000;

/// Maximum allowed drift magnitude (inclusive).
pub const MAX_DRIFT_MAGNITUDE: f64 = 0.3;

/// Nonce age window, exclusive upper bound, in milliseconds (1 hour).
pub const NONCE_AGE_WINDOW_MS: i64 = 3_600_000;

/// Exact value the witness score must take when present.
pub const WITNESS_SCORE_EXACT: f64 = 1.0;
