//! # Adapter Interfaces (spec §4.D)
//!
//! The six outbound ports every provider (local, aws, gcp, oracle) must
//! implement identically. Every method is fail-closed: a store error is
//! always surfaced as an [`AdapterFault`], never swallowed, so a caller
//! can keep the safer outcome (e.g. keep a violation rather than treat
//! it as a filtered false positive).

use crate::model::{
    BaselineMeta, BlockCounterEntry, CalibrationResult, ConsentRecord, ConsentSummary, FpEvent,
    FpWindow,
};
use async_trait::async_trait;
use mirror_types::error::AdapterFault;

pub type AdapterResult<T> = Result<T, AdapterFault>;

/// Tracks false-positive review state for rule findings.
#[async_trait]
pub trait FpStoreAdapter: Send + Sync {
    /// Insert-if-absent. Fails with `Duplicate` on `eventId` collision.
    async fn record_event(&self, event: FpEvent) -> AdapterResult<()>;

    /// Marks the unique event matching `finding_id` as reviewed.
    /// Fails with `NotFound` if no such event exists.
    async fn mark_false_positive(
        &self,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<&str>,
    ) -> AdapterResult<()>;

    /// Most recent `n` events for `rule_id`, descending by timestamp.
    async fn get_window_by_count(&self, rule_id: &str, n: usize) -> AdapterResult<FpWindow>;

    /// Events for `rule_id` since `since_ms`, descending by timestamp.
    async fn get_window_by_since(&self, rule_id: &str, since_ms: i64) -> AdapterResult<FpWindow>;

    /// True iff the event for `finding_id` exists and is marked FP.
    async fn is_false_positive(&self, finding_id: &str) -> AdapterResult<bool>;

    /// Scoped lookup: true iff the event for `(rule_id, finding_id)`
    /// exists and is marked FP.
    async fn is_false_positive_for_rule(
        &self,
        rule_id: &str,
        finding_id: &str,
    ) -> AdapterResult<bool>;
}

/// Per-`(ruleId, orgId)` hourly circuit-breaker counter.
#[async_trait]
pub trait BlockCounterAdapter: Send + Sync {
    /// Atomically increments the bucket for `(rule_id, org_id,
    /// floor(now/3600s))`, returning the new count. Sets `expiresAt =
    /// now + 7200s` on first touch of a bucket.
    async fn increment(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64>;

    /// Returns 0 for a missing or expired bucket.
    async fn get_count(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64>;

    /// `get_count(...) >= threshold`.
    async fn is_circuit_broken(&self, rule_id: &str, org_id: &str, threshold: u64) -> AdapterResult<bool>;
}

/// Per-org, per-feature consent grants and revocations.
#[async_trait]
pub trait ConsentStoreAdapter: Send + Sync {
    async fn check_resource_consent(&self, org_id: &str, feature: &str) -> AdapterResult<bool>;

    async fn grant_consent(
        &self,
        org_id: &str,
        feature: &str,
        grantor: &str,
        expires_at: Option<i64>,
    ) -> AdapterResult<()>;

    async fn revoke_consent(&self, org_id: &str, feature: &str) -> AdapterResult<()>;

    async fn get_consent_summary(&self, org_id: &str) -> AdapterResult<ConsentSummary>;

    async fn check_multiple_resources(
        &self,
        org_id: &str,
        features: &[String],
    ) -> AdapterResult<Vec<(String, bool)>>;
}

/// Secret-material source for the redaction nonce.
#[async_trait]
pub trait SecretStoreAdapter: Send + Sync {
    /// MUST never return a structurally invalid nonce.
    async fn get_nonce(&self, param_name: &str) -> AdapterResult<String>;

    async fn rotate_nonce(&self, new_value: &str) -> AdapterResult<()>;

    async fn is_reachable(&self) -> bool;
}

/// Versioned snapshot storage for rule baselines.
#[async_trait]
pub trait BaselineStoreAdapter: Send + Sync {
    async fn get_baseline(&self, key: &str) -> AdapterResult<Option<Vec<u8>>>;

    async fn put_baseline(&self, key: &str, bytes: Vec<u8>) -> AdapterResult<()>;

    /// Most-recent first.
    async fn list_baselines(&self) -> AdapterResult<Vec<BaselineMeta>>;

    async fn delete_baseline(&self, key: &str) -> AdapterResult<()>;
}

/// Per-rule calibration (Byzantine-filtered FPR consensus) results.
#[async_trait]
pub trait CalibrationStoreAdapter: Send + Sync {
    async fn store_calibration_result(&self, result: CalibrationResult) -> AdapterResult<()>;

    async fn get_calibration_result(&self, rule_id: &str) -> AdapterResult<Option<CalibrationResult>>;

    async fn get_all_calibration_results(&self) -> AdapterResult<Vec<CalibrationResult>>;
}
