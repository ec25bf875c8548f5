//! # Semantic Store Operations (spec §4.F / §4.G step 3-4, 6)
//!
//! Thin wrapper over the raw adapter ports: the ports already expose
//! semantically-named operations (`isFalsePositive`, `recordEvent`,
//! `increment`), so this crate's job is narrow — compose them into the
//! exact fail-closed call sequence the orchestrator needs, rather than
//! re-teach each adapter its own vocabulary.

use mirror_adapters::model::FpEvent;
use mirror_adapters::ports::{BlockCounterAdapter, FpStoreAdapter};
use mirror_types::error::AdapterFault;

/// Per-(rule, org) circuit-breaker threshold used throughout the Oracle
/// (spec §4.G step 4: `isCircuitBroken(ruleId, orgId, 100)`).
pub const CIRCUIT_BREAKER_THRESHOLD: u64 = 100;

/// Result of asking whether a finding is a known false positive,
/// distinguishing "confirmed FP", "confirmed real", and "store
/// unreachable" so callers can apply the fail-closed policy themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpLookup {
    KnownFalsePositive,
    NotFalsePositive,
    /// Adapter fault occurred; per spec §7 the caller MUST keep the
    /// violation (fail-closed) rather than treat this as `false`.
    Degraded,
}

/// Looks up `(ruleId, findingId)` in the FP store. Never surfaces the
/// adapter error to the caller directly — degrades to [`FpLookup::Degraded`]
/// instead, so the orchestrator's fail-closed policy is enforced here,
/// once, rather than at every call site.
pub async fn is_false_positive(
    store: &(dyn FpStoreAdapter),
    rule_id: &str,
    finding_id: &str,
) -> FpLookup {
    match store.is_false_positive_for_rule(rule_id, finding_id).await {
        Ok(true) => FpLookup::KnownFalsePositive,
        Ok(false) => FpLookup::NotFalsePositive,
        Err(fault) => {
            tracing::warn!(
                target: "mirror_store",
                rule_id,
                finding_id,
                %fault,
                "fp-store lookup failed; keeping violation (fail-closed)"
            );
            FpLookup::Degraded
        }
    }
}

/// Records a new FP-tracking event, surfacing the adapter error verbatim
/// (per spec §7, `Duplicate` is not coerced to success).
pub async fn record_event(store: &(dyn FpStoreAdapter), event: FpEvent) -> Result<(), AdapterFault> {
    store.record_event(event).await
}

/// Increments the circuit-breaker bucket for `(ruleId, orgId)` and
/// reports whether it is now tripped at [`CIRCUIT_BREAKER_THRESHOLD`].
///
/// Used by spec §4.G step 6: "if outcome is block, for each remaining
/// violation call `blockCounter.increment`".
pub async fn bump_and_check(
    counter: &(dyn BlockCounterAdapter),
    rule_id: &str,
    org_id: &str,
) -> Result<bool, AdapterFault> {
    let count = counter.increment(rule_id, org_id).await?;
    Ok(count >= CIRCUIT_BREAKER_THRESHOLD)
}

/// Checks circuit-breaker status without incrementing (spec §4.G step 4).
pub async fn is_circuit_broken(
    counter: &(dyn BlockCounterAdapter),
    rule_id: &str,
    org_id: &str,
) -> Result<bool, AdapterFault> {
    counter
        .is_circuit_broken(rule_id, org_id, CIRCUIT_BREAKER_THRESHOLD)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_adapters::local::LocalFpStore;
    use mirror_adapters::model::FpEventContext;

    fn event(id: &str, rule: &str) -> FpEvent {
        FpEvent {
            event_id: id.to_string(),
            rule_id: rule.to_string(),
            rule_version: "1".to_string(),
            finding_id: format!("finding-{id}"),
            outcome: "block".to_string(),
            timestamp_ms: 100,
            is_false_positive: true,
            reviewed_by: Some("alice".to_string()),
            suppression_ticket: None,
            reviewed_at: Some(100),
            context: FpEventContext {
                org_id_hash: "org-1".to_string(),
                repo_id: None,
                branch: None,
                event_type: "pull_request".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn known_fp_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFpStore::open(dir.path()).unwrap();
        record_event(&store, event("e1", "R1")).await.unwrap();
        let result = is_false_positive(&store, "R1", "finding-e1").await;
        assert_eq!(result, FpLookup::KnownFalsePositive);
    }

    #[tokio::test]
    async fn unknown_finding_is_not_fp() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFpStore::open(dir.path()).unwrap();
        let result = is_false_positive(&store, "R1", "nonexistent").await;
        assert_eq!(result, FpLookup::NotFalsePositive);
    }
}
