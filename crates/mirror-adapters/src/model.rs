//! Wire/persistence shapes shared by every adapter implementation,
//! independent of which provider backs them.

use serde::{Deserialize, Serialize};

/// Provenance context carried by an [`FpEvent`], kept separate from the
/// review fields so calibration can group by `org_id_hash` without
/// touching the reviewable part of the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FpEventContext {
    pub org_id_hash: String,
    #[serde(default)]
    pub repo_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    pub event_type: String,
}

/// One false-positive-tracking event recorded against a rule finding.
/// Primary key is `(rule_id, event_id, timestamp_ms)`; `finding_id` is a
/// unique secondary index used by `markFalsePositive`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FpEvent {
    pub event_id: String,
    pub rule_id: String,
    pub rule_version: String,
    pub finding_id: String,
    pub outcome: String,
    pub timestamp_ms: i64,
    pub is_false_positive: bool,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub suppression_ticket: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<i64>,
    pub context: FpEventContext,
}

/// Summary statistics derived from an [`FpWindow`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FpWindowStatistics {
    pub total: usize,
    pub false_positives: usize,
    pub true_positives: usize,
    pub pending: usize,
    pub observed_fpr: f64,
}

/// A computed, non-persistent window of recent events for one rule,
/// descending by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FpWindow {
    pub rule_id: String,
    pub events: Vec<FpEvent>,
    pub statistics: FpWindowStatistics,
}

impl FpWindow {
    /// Builds the window and its derived statistics from already-sorted
    /// (descending by timestamp) events for one rule.
    pub fn from_events(rule_id: impl Into<String>, events: Vec<FpEvent>) -> Self {
        let total = events.len();
        let false_positives = events.iter().filter(|e| e.is_false_positive).count();
        // A "pending" event is one that has not yet been reviewed either
        // way (no `reviewedAt`), so it counts toward neither FP nor TP.
        let pending = events.iter().filter(|e| e.reviewed_at.is_none()).count();
        let true_positives = total.saturating_sub(false_positives).saturating_sub(pending);
        let denom = (total.saturating_sub(pending)).max(1) as f64;
        Self {
            rule_id: rule_id.into(),
            events,
            statistics: FpWindowStatistics {
                total,
                false_positives,
                true_positives,
                pending,
                observed_fpr: false_positives as f64 / denom,
            },
        }
    }
}

/// One hourly circuit-breaker bucket for a `(ruleId, orgId)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockCounterEntry {
    pub bucket_key: String,
    pub count: u64,
    pub expires_at: i64,
}

impl BlockCounterEntry {
    pub fn bucket_key_for(rule_id: &str, org_id: &str, hour_epoch: i64) -> String {
        format!("{rule_id}:{org_id}:{hour_epoch}")
    }
}

/// One resource-consent grant/revocation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub org_id: String,
    pub feature: String,
    pub granted: bool,
    #[serde(default)]
    pub grantor: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub updated_at: i64,
}

/// Summary of every feature consent held by an org.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSummary {
    pub org_id: String,
    pub features: Vec<ConsentRecord>,
}

/// Metadata about one stored baseline, without its payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMeta {
    pub key: String,
    pub version: u64,
    pub modified_at: i64,
}

/// A per-rule calibration (reputation-weighted FPR consensus) result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub rule_id: String,
    pub false_positive_rate: f64,
    pub sample_size: usize,
    pub computed_at: i64,
    #[serde(default)]
    pub excluded_reporters: Vec<String>,
}
