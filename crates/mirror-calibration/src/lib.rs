//! # Calibration / Byzantine Filter (spec §4.H)
//!
//! `aggregate_fps_by_rule` turns a rule's recorded FP events into a
//! reputation-weighted consensus false-positive rate that stays robust
//! against a minority of low-reputation or statistically outlying
//! contributors, per the seven-step pipeline below.

mod byzantine;
mod confidence;
mod queue;
mod reputation;

pub use byzantine::Contributor;
pub use confidence::{Confidence, ConfidenceCategory, MIN_TRUSTED_CONTRIBUTORS};
pub use queue::{ConsistencyUpdateQueue, DEFAULT_QUEUE_CAPACITY};
pub use reputation::{ReputationEngine, ReputationWeight};

use mirror_adapters::model::CalibrationResult;
use mirror_adapters::ports::{CalibrationStoreAdapter, FpStoreAdapter};
use mirror_types::error::AdapterFault;
use mirror_types::time::now_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default fraction of contributors dropped by reputation percentile.
pub const DEFAULT_BYZANTINE_FILTER_PERCENTILE: f64 = 0.2;
/// Default weighted-z-score cutoff for the outlier filter.
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = 3.0;
/// Default minimum number of distinct contributing orgs before results
/// are released at all (spec §4.H "K-anonymity variant").
pub const DEFAULT_K_ANONYMITY_THRESHOLD: usize = 10;

#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub byzantine_filter_percentile: f64,
    pub z_score_threshold: f64,
    pub k_anonymity_threshold: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            byzantine_filter_percentile: DEFAULT_BYZANTINE_FILTER_PERCENTILE,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
            k_anonymity_threshold: DEFAULT_K_ANONYMITY_THRESHOLD,
        }
    }
}

/// Accounting for what the Byzantine filter dropped and why (spec §4.H
/// step 7: "filter summary").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    pub contributors_considered: usize,
    pub trusted_contributors: usize,
    pub low_reputation_filtered: usize,
    pub outliers_filtered: usize,
    pub filter_rate: f64,
    pub byzantine_filter_percentile: f64,
    pub z_score_threshold: f64,
}

/// The full calibration result, including the diagnostics the base
/// [`CalibrationResult`] (what's actually persisted) doesn't carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResultExtended {
    pub rule_id: String,
    pub false_positive_rate: f64,
    pub sample_size: usize,
    pub computed_at: i64,
    pub excluded_reporters: Vec<String>,
    pub confidence: Confidence,
    pub filter_summary: FilterSummary,
}

/// Either a computed result, or a typed refusal when too few distinct
/// orgs have contributed to release an aggregate safely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CalibrationOutcome {
    Result(CalibrationResultExtended),
    InsufficientKAnonymity { distinct_orgs: usize, required: usize },
}

/// Maps an absolute deviation from consensus to the consistency-score
/// delta of spec §4.H step 6.
fn consistency_delta(dev: f64) -> f64 {
    let dev = dev.abs();
    if dev < 0.02 {
        0.05
    } else if dev < 0.05 {
        0.02
    } else if dev < 0.10 {
        0.01
    } else if dev <= 0.20 {
        0.0
    } else if dev <= 0.30 {
        -0.05
    } else {
        -0.10
    }
}

/// Implements spec §4.H's seven-step pipeline for one rule.
pub async fn aggregate_fps_by_rule(
    rule_id: &str,
    fp_store: &(dyn FpStoreAdapter),
    calibration_store: &(dyn CalibrationStoreAdapter),
    reputation: &(dyn ReputationEngine),
    consistency_queue: &ConsistencyUpdateQueue,
    config: &CalibrationConfig,
) -> Result<CalibrationOutcome, AdapterFault> {
    // Step 1: fetch every FP event for this rule, group by orgIdHash.
    let window = fp_store.get_window_by_since(rule_id, 0).await?;
    let mut by_org: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for event in &window.events {
        let entry = by_org.entry(event.context.org_id_hash.clone()).or_insert((0, 0));
        entry.1 += 1;
        if event.is_false_positive {
            entry.0 += 1;
        }
    }

    let distinct_orgs = by_org.len();
    if distinct_orgs < config.k_anonymity_threshold {
        return Ok(CalibrationOutcome::InsufficientKAnonymity {
            distinct_orgs,
            required: config.k_anonymity_threshold,
        });
    }

    // Step 2: reputation weights per org.
    let org_ids: Vec<String> = by_org.keys().cloned().collect();
    let mut contributors = Vec::with_capacity(org_ids.len());
    for org_id in &org_ids {
        let (fp_count, total) = by_org[org_id];
        let fp_rate = fp_count as f64 / (total.max(1) as f64);
        let weight = reputation.calculate_contribution_weight(org_id).await;
        contributors.push(Contributor {
            fp_rate,
            reputation_score: weight.reputation_score,
            weight: weight.weight,
        });
    }

    // Step 3: Byzantine filter.
    let filter_outcome = byzantine::apply_filter(&contributors, config.byzantine_filter_percentile, config.z_score_threshold);
    let trusted: Vec<Contributor> = filter_outcome.trusted_indices.iter().map(|&i| contributors[i]).collect();
    let trusted_org_ids: Vec<&String> = filter_outcome.trusted_indices.iter().map(|&i| &org_ids[i]).collect();
    let excluded_reporters: Vec<String> = org_ids
        .iter()
        .enumerate()
        .filter(|(i, _)| !filter_outcome.trusted_indices.contains(i))
        .map(|(_, id)| id.clone())
        .collect();

    // Step 4: weighted consensus FPR over the trusted set.
    let consensus = byzantine::consensus_fp_rate(&trusted);

    // Step 5: confidence.
    let confidence = confidence::score(&trusted, window.events.len());

    // Step 6: fire off (bounded, backpressured) consistency-score updates.
    for (org_id, contributor) in trusted_org_ids.iter().zip(trusted.iter()) {
        let dev = (contributor.fp_rate - consensus).abs();
        consistency_queue.submit((*org_id).clone(), consistency_delta(dev));
    }

    let considered = contributors.len();
    let filtered_count = filter_outcome.low_reputation_filtered + filter_outcome.outliers_filtered;
    let filter_summary = FilterSummary {
        contributors_considered: considered,
        trusted_contributors: trusted.len(),
        low_reputation_filtered: filter_outcome.low_reputation_filtered,
        outliers_filtered: filter_outcome.outliers_filtered,
        filter_rate: filtered_count as f64 / (considered.max(1) as f64),
        byzantine_filter_percentile: config.byzantine_filter_percentile,
        z_score_threshold: config.z_score_threshold,
    };

    let result = CalibrationResultExtended {
        rule_id: rule_id.to_string(),
        false_positive_rate: consensus,
        sample_size: window.events.len(),
        computed_at: now_ms(),
        excluded_reporters,
        confidence,
        filter_summary,
    };

    // Step 7: persist (the base shape every adapter provider understands).
    calibration_store
        .store_calibration_result(CalibrationResult {
            rule_id: result.rule_id.clone(),
            false_positive_rate: result.false_positive_rate,
            sample_size: result.sample_size,
            computed_at: result.computed_at,
            excluded_reporters: result.excluded_reporters.clone(),
        })
        .await?;

    Ok(CalibrationOutcome::Result(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mirror_adapters::local::{LocalCalibrationStore, LocalFpStore};
    use mirror_adapters::model::{FpEvent, FpEventContext};
    use std::sync::Arc;

    struct UniformReputation;

    #[async_trait]
    impl ReputationEngine for UniformReputation {
        async fn calculate_contribution_weight(&self, _org_id: &str) -> ReputationWeight {
            ReputationWeight {
                weight: 1.0,
                reputation_score: 0.9,
                stake: 1.0,
            }
        }

        async fn update_consistency_score(&self, _org_id: &str, _delta: f64) {}
    }

    fn event(org: &str, idx: usize, fp_rate_hits: bool) -> FpEvent {
        FpEvent {
            event_id: format!("{org}-{idx}"),
            rule_id: "MD-777".to_string(),
            rule_version: "1".to_string(),
            finding_id: format!("finding-{org}-{idx}"),
            outcome: "warn".to_string(),
            timestamp_ms: idx as i64,
            is_false_positive: fp_rate_hits,
            reviewed_by: Some("reviewer".to_string()),
            suppression_ticket: None,
            reviewed_at: Some(idx as i64),
            context: FpEventContext {
                org_id_hash: org.to_string(),
                repo_id: None,
                branch: None,
                event_type: "pull_request".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn below_k_anonymity_threshold_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let fp_store = LocalFpStore::open(dir.path()).unwrap();
        let calibration_store = LocalCalibrationStore::open(dir.path()).unwrap();
        fp_store.record_event(event("org-1", 0, false)).await.unwrap();

        let reputation = UniformReputation;
        let queue = ConsistencyUpdateQueue::spawn(Arc::new(UniformReputation), DEFAULT_QUEUE_CAPACITY);
        let outcome = aggregate_fps_by_rule(
            "MD-777",
            &fp_store,
            &calibration_store,
            &reputation,
            &queue,
            &CalibrationConfig::default(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, CalibrationOutcome::InsufficientKAnonymity { .. }));
    }

    #[tokio::test]
    async fn consensus_filters_the_outlier_org() {
        let dir = tempfile::tempdir().unwrap();
        let fp_store = LocalFpStore::open(dir.path()).unwrap();
        let calibration_store = LocalCalibrationStore::open(dir.path()).unwrap();

        // 9 orgs near an 11% FP rate, one org at 90%.
        let rates = [0.10, 0.12, 0.11, 0.10, 0.13, 0.11, 0.10, 0.12, 0.90, 0.11];
        for (org_idx, rate) in rates.iter().enumerate() {
            let org = format!("org-{org_idx}");
            let fp_count = (*rate * 100.0).round() as usize;
            for i in 0..100 {
                fp_store
                    .record_event(event(&org, i, i < fp_count))
                    .await
                    .unwrap();
            }
        }

        let reputation = UniformReputation;
        let queue = ConsistencyUpdateQueue::spawn(Arc::new(UniformReputation), DEFAULT_QUEUE_CAPACITY);
        let outcome = aggregate_fps_by_rule(
            "MD-777",
            &fp_store,
            &calibration_store,
            &reputation,
            &queue,
            &CalibrationConfig::default(),
        )
        .await
        .unwrap();

        match outcome {
            CalibrationOutcome::Result(result) => {
                assert!((0.09..0.14).contains(&result.false_positive_rate));
                assert!(result.filter_summary.outliers_filtered >= 1 || result.filter_summary.low_reputation_filtered >= 1);
            }
            CalibrationOutcome::InsufficientKAnonymity { .. } => panic!("expected a computed result"),
        }
    }
}
