//! # L0 Foundation-Tier Invariants
//!
//! `check` is the always-on, allocation-free gate every state transition in
//! the Oracle passes through before any other subsystem is allowed to act
//! on a [`State`]. It runs five checks in a fixed order and stops recording
//! detail — but never stops *checking* — past the first failure, so a
//! caller always learns every failing check in one pass, not just the
//! first one.
//!
//! Performance target (spec §4.A): single-digit-microsecond p99 on a
//! managed runtime. The happy path performs zero heap allocations: the
//! `failed_checks` vector and `violations` map are only ever populated once
//! a check has actually failed.

mod state;

pub use state::{
    State, StateNonce, MAX_DRIFT_MAGNITUDE, NONCE_AGE_WINDOW_MS, RESERVED_PERMISSION_MASK,
    WITNESS_SCORE_EXACT,
};

use mirror_types::hexbytes::Hex64;
use std::collections::BTreeMap;

/// Names of the five checks, in the fixed evaluation order.
pub const CHECK_SCHEMA_HASH: &str = "schema_hash";
pub const CHECK_PERMISSION_BITS: &str = "permission_bits";
pub const CHECK_DRIFT_BOUNDS: &str = "drift_bounds";
pub const CHECK_NONCE_AGE: &str = "nonce_age";
pub const CHECK_WITNESS_SCORE: &str = "witness_score";

/// Outcome of running L0 against one [`State`].
#[derive(Debug, Clone, Default)]
pub struct L0Result {
    pub passed: bool,
    pub failed_checks: Vec<&'static str>,
    pub violations: BTreeMap<&'static str, String>,
}

impl L0Result {
    fn fail(&mut self, check: &'static str, detail: impl Into<String>) {
        self.passed = false;
        self.failed_checks.push(check);
        self.violations.insert(check, detail.into());
    }
}

/// Runs the five L0 checks against `state` in fixed order.
///
/// `now_ms` is injected (not read from the system clock) so the check
/// remains a pure function of its inputs, and `expected_schema_hash` is
/// the hash the caller expects this state to carry — L0 has no notion of
/// "the" correct schema, only whether the given state matches what its
/// caller asserts it should be.
#[inline]
pub fn check(state: &State, now_ms: i64, expected_schema_hash: &[u8; 32]) -> L0Result {
    let mut result = L0Result {
        passed: true,
        failed_checks: Vec::new(),
        violations: BTreeMap::new(),
    };

    // 1. Schema-hash equality.
    if &state.schema_hash != expected_schema_hash {
        result.fail(
            CHECK_SCHEMA_HASH,
            format!(
                "schema hash mismatch: expected {}, got {}",
                hex::encode(expected_schema_hash),
                hex::encode(state.schema_hash)
            ),
        );
    }

    // 2. Reserved permission bits must be zero.
    let reserved = state.permission_bits & RESERVED_PERMISSION_MASK;
    if reserved != 0 {
        result.fail(
            CHECK_PERMISSION_BITS,
            format!(
                "reserved permission bits set: 0x{:04x} (mask 0x{:04x})",
                reserved, RESERVED_PERMISSION_MASK
            ),
        );
    }

    // 3. Drift bounds.
    if !(0.0..=MAX_DRIFT_MAGNITUDE).contains(&state.drift_magnitude) {
        result.fail(
            CHECK_DRIFT_BOUNDS,
            format!(
                "drift magnitude {} outside [0, {}]",
                state.drift_magnitude, MAX_DRIFT_MAGNITUDE
            ),
        );
    }

    // 4. Nonce age and format.
    let age_ms = now_ms - state.nonce.issued_at;
    let age_ok = (0..NONCE_AGE_WINDOW_MS).contains(&age_ms);
    let format_ok = Hex64::is_valid(&state.nonce.value);
    if !age_ok || !format_ok {
        let mut reasons = Vec::new();
        if !age_ok {
            reasons.push(format!("age {age_ms}ms outside [0, {NONCE_AGE_WINDOW_MS})"));
        }
        if !format_ok {
            reasons.push("value is not 64 hex characters".to_string());
        }
        result.fail(CHECK_NONCE_AGE, reasons.join("; "));
    }

    // 5. Witness score, if present, must be exactly 1.0.
    if let Some(score) = state.contraction_witness_score {
        if score != WITNESS_SCORE_EXACT {
            result.fail(
                CHECK_WITNESS_SCORE,
                format!("witness score {score} != {WITNESS_SCORE_EXACT}"),
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_state(now_ms: i64, schema_hash: [u8; 32]) -> State {
        State {
            schema_version: 1,
            schema_hash,
            permission_bits: 0x00FF,
            drift_magnitude: 0.1,
            nonce: StateNonce {
                value: "a".repeat(64),
                issued_at: now_ms - 1000,
            },
            contraction_witness_score: Some(1.0),
        }
    }

    #[test]
    fn passes_valid_state() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let state = valid_state(now, hash);
        let result = check(&state, now, &hash);
        assert!(result.passed);
        assert!(result.failed_checks.is_empty());
    }

    #[test]
    fn rejects_schema_hash_mismatch() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.schema_hash = [8u8; 32];
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert_eq!(result.failed_checks, vec![CHECK_SCHEMA_HASH]);
    }

    #[test]
    fn rejects_reserved_permission_bits() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.permission_bits = 0x1000;
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&CHECK_PERMISSION_BITS));
    }

    #[test]
    fn rejects_excess_drift() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.drift_magnitude = 0.31;
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&CHECK_DRIFT_BOUNDS));
    }

    #[test]
    fn rejects_stale_nonce() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.nonce.issued_at = now - NONCE_AGE_WINDOW_MS;
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&CHECK_NONCE_AGE));
    }

    #[test]
    fn rejects_malformed_nonce_value() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.nonce.value = "not-hex".to_string();
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&CHECK_NONCE_AGE));
    }

    #[test]
    fn rejects_wrong_witness_score() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.contraction_witness_score = Some(0.5);
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert!(result.failed_checks.contains(&CHECK_WITNESS_SCORE));
    }

    #[test]
    fn missing_witness_score_is_fine() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.contraction_witness_score = None;
        let result = check(&state, now, &hash);
        assert!(result.passed);
    }

    #[test]
    fn accumulates_all_failures_in_one_pass() {
        let hash = [7u8; 32];
        let now = 10_000_000;
        let mut state = valid_state(now, hash);
        state.permission_bits = 0xF000;
        state.drift_magnitude = 0.9;
        let result = check(&state, now, &hash);
        assert!(!result.passed);
        assert_eq!(result.failed_checks.len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn drift_above_threshold_always_rejected(drift in 0.30001f64..10.0) {
            let hash = [1u8; 32];
            let now = 10_000_000;
            let mut state = valid_state(now, hash);
            state.drift_magnitude = drift;
            let result = check(&state, now, &hash);
            prop_assert!(!result.passed);
            prop_assert!(result.failed_checks.contains(&CHECK_DRIFT_BOUNDS));
        }

        #[test]
        fn permission_upper_nibble_always_rejected(bits in 1u16..=15u16) {
            let hash = [1u8; 32];
            let now = 10_000_000;
            let mut state = valid_state(now, hash);
            state.permission_bits = bits << 12;
            let result = check(&state, now, &hash);
            prop_assert!(!result.passed);
            prop_assert!(result.failed_checks.contains(&CHECK_PERMISSION_BITS));
        }
    }
}
