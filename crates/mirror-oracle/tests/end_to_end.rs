//! Integration coverage for the six concrete scenarios of spec §8,
//! each driven through the public `Oracle::analyze`/`Oracle::load_nonce`/
//! `Oracle::run_calibration` surface rather than any crate-internal type.

use async_trait::async_trait;
use mirror_adapters::local::{LocalBlockCounter, LocalFpStore, LocalSecretStore};
use mirror_adapters::model::{FpEvent, FpEventContext};
use mirror_adapters::ports::{BlockCounterAdapter, FpStoreAdapter, SecretStoreAdapter};
use mirror_calibration::{CalibrationOutcome, ReputationEngine, ReputationWeight};
use mirror_oracle::{Oracle, OracleEventContext, OracleInput, OracleMode, Rule, RuleError, RuleInput, RuleRegistry};
use mirror_policy::Outcome;
use mirror_types::violation::{RulePhase, Severity, Violation};
use std::sync::Arc;

struct FindingRule {
    id: &'static str,
    severity: Severity,
    finding_id: &'static str,
    evidence: Option<&'static str>,
}

impl Rule for FindingRule {
    fn id(&self) -> &str {
        self.id
    }

    fn version(&self) -> &str {
        "1"
    }

    fn evaluate(&self, _input: &RuleInput) -> Result<Vec<Violation>, RuleError> {
        let mut violation = Violation::finding(self.id, self.severity, "finding raised", self.finding_id);
        if let Some(evidence) = self.evidence {
            violation = violation.with_context("evidence", evidence);
        }
        Ok(vec![violation])
    }
}

struct ThrowingRule {
    id: &'static str,
    message: &'static str,
}

impl Rule for ThrowingRule {
    fn id(&self) -> &str {
        self.id
    }

    fn version(&self) -> &str {
        "1"
    }

    fn evaluate(&self, _input: &RuleInput) -> Result<Vec<Violation>, RuleError> {
        Err(RuleError::new(self.id, "1", RulePhase::Evaluate, self.message))
    }
}

fn registry_with(rules: Vec<Box<dyn Rule>>) -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule);
    }
    registry
}

fn fp_event(rule_id: &str, finding_id: &str, org: &str, is_fp: bool) -> FpEvent {
    FpEvent {
        event_id: format!("{rule_id}-{finding_id}"),
        rule_id: rule_id.to_string(),
        rule_version: "1".to_string(),
        finding_id: finding_id.to_string(),
        outcome: "block".to_string(),
        timestamp_ms: 0,
        is_false_positive: is_fp,
        reviewed_by: Some("reviewer".to_string()),
        suppression_ticket: None,
        reviewed_at: Some(0),
        context: FpEventContext {
            org_id_hash: org.to_string(),
            repo_id: None,
            branch: None,
            event_type: "pull_request".to_string(),
        },
    }
}

/// Scenario 1 (spec §8): a known false positive is dropped from the
/// report while the other violation survives.
#[tokio::test]
async fn scenario_1_fp_filtering() {
    let dir = tempfile::tempdir().unwrap();

    let fp_store = LocalFpStore::open(dir.path()).unwrap();
    fp_store.record_event(fp_event("MD-001", "F1", "acme", true)).await.unwrap();

    let registry = registry_with(vec![
        Box::new(FindingRule {
            id: "MD-001",
            severity: Severity::High,
            finding_id: "F1",
            evidence: None,
        }),
        Box::new(FindingRule {
            id: "MD-002",
            severity: Severity::Critical,
            finding_id: "F2",
            evidence: None,
        }),
    ]);
    let oracle = Oracle::local(dir.path().to_str().unwrap(), registry).unwrap();

    let input = OracleInput::new(OracleMode::PullRequest).with_context(OracleEventContext {
        org_id: Some("acme".to_string()),
        ..Default::default()
    });
    let output = oracle.analyze(input).await.unwrap();

    assert_eq!(output.violations.len(), 1);
    assert_eq!(output.violations[0].rule_id, "MD-002");
    assert_eq!(output.machine_decision.outcome, Outcome::Block);
}

/// Scenario 2 (spec §8): 101 prior increments for `(MD-003, org1)` trip
/// the circuit breaker, degrading what would otherwise be a `block` into
/// a `warn`.
#[tokio::test]
async fn scenario_2_circuit_breaker_degradation() {
    let dir = tempfile::tempdir().unwrap();

    let seed_counter = LocalBlockCounter::open(dir.path()).unwrap();
    for _ in 0..101 {
        seed_counter.increment("MD-003", "org1").await.unwrap();
    }

    let registry = registry_with(vec![Box::new(FindingRule {
        id: "MD-003",
        severity: Severity::Critical,
        finding_id: "F1",
        evidence: None,
    })]);
    let oracle = Oracle::local(dir.path().to_str().unwrap(), registry).unwrap();

    let input = OracleInput::new(OracleMode::PullRequest).with_context(OracleEventContext {
        org_id: Some("org1".to_string()),
        ..Default::default()
    });
    let output = oracle.analyze(input).await.unwrap();

    assert_eq!(output.machine_decision.outcome, Outcome::Warn);
    assert!(output
        .machine_decision
        .reasons
        .iter()
        .any(|r| r.contains("circuit breaker tripped (degraded)")));
}

/// Scenario 3 (spec §8): a throwing rule yields a synthetic critical
/// evaluation-error violation, every other rule still runs, and the
/// outcome blocks non-overridably.
#[tokio::test]
async fn scenario_3_rule_error_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let registry = registry_with(vec![
        Box::new(FindingRule {
            id: "MD-001",
            severity: Severity::Low,
            finding_id: "F1",
            evidence: None,
        }),
        Box::new(ThrowingRule {
            id: "MD-004",
            message: "regex timeout",
        }),
    ]);
    let oracle = Oracle::local(dir.path().to_str().unwrap(), registry).unwrap();

    let output = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();

    assert_eq!(output.report.rules_checked, 2);
    let error_violation = output
        .violations
        .iter()
        .find(|v| v.rule_id == "MD-004")
        .expect("MD-004's evaluation error survives as a violation");
    assert!(error_violation.is_evaluation_error());
    assert_eq!(error_violation.severity, Severity::Critical);
    assert!(output.violations.iter().any(|v| v.rule_id == "MD-001"));
    assert_eq!(output.machine_decision.outcome, Outcome::Block);
}

/// Scenario 4 (spec §8): evidence redaction through `Oracle::analyze`
/// keeps working across a nonce rotation — new violations are branded
/// with whichever version is newest, the grace period for the prior
/// version is the nonce cache's own contract (exercised directly
/// against `mirror_redaction` in that crate's tests).
#[tokio::test]
async fn scenario_4_nonce_rotation_grace() {
    let dir = tempfile::tempdir().unwrap();

    let secret_store = LocalSecretStore::open(dir.path()).unwrap();
    secret_store.rotate_nonce(&"a".repeat(64)).await.unwrap();

    let registry = registry_with(vec![Box::new(FindingRule {
        id: "MD-001",
        severity: Severity::Low,
        finding_id: "F1",
        evidence: Some("secret-token here"),
    })]);
    let oracle = Oracle::local(dir.path().to_str().unwrap(), registry).unwrap();
    oracle.load_nonce("oracle/nonce/v1").await.unwrap();

    let first = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();
    assert!(!first.degraded);
    let evidence = first.violations[0].context.get("evidence").expect("evidence was redacted");
    assert_eq!(evidence["nonceVersion"], 1);

    secret_store.rotate_nonce(&"b".repeat(64)).await.unwrap();
    oracle.load_nonce("oracle/nonce/v2").await.unwrap();

    let second = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();
    assert!(!second.degraded);
    let evidence = second.violations[0].context.get("evidence").expect("evidence was redacted");
    assert_eq!(evidence["nonceVersion"], 2);
}

/// Scenario 5 (spec §8): with no valid nonce ever cached and the secret
/// store holding nothing for the configured parameter, `load_nonce`
/// surfaces the fetch failure and `analyze` fails closed — it keeps the
/// violation, strips the evidence it could not redact, and marks the
/// report degraded rather than silently dropping anything.
#[tokio::test]
async fn scenario_5_fail_closed_when_no_nonce_is_available() {
    let dir = tempfile::tempdir().unwrap();

    let registry = registry_with(vec![Box::new(FindingRule {
        id: "MD-001",
        severity: Severity::High,
        finding_id: "F1",
        evidence: Some("secret-token here"),
    })]);
    let oracle = Oracle::local(dir.path().to_str().unwrap(), registry).unwrap();

    let load_err = oracle.load_nonce("oracle/nonce/v1").await.unwrap_err();
    assert!(matches!(load_err, mirror_redaction::NonceError::FetchFailed(_)));

    let output = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();
    assert!(output.degraded);
    assert!(output
        .degraded_reasons
        .iter()
        .any(|r| r.contains("no valid nonce cached")));
    assert!(output.violations[0].context.get("evidence").is_none());
}

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

/// Scenario 6 (spec §8): ten orgs contribute FP rates clustered around
/// 0.11 with one outlier at 0.90; `run_calibration` filters the outlier
/// and settles the consensus rate near the cluster.
#[tokio::test]
async fn scenario_6_calibration_consensus_filters_the_outlier() {
    let dir = tempfile::tempdir().unwrap();

    let fp_store = LocalFpStore::open(dir.path()).unwrap();
    let rates = [0.10, 0.12, 0.11, 0.10, 0.13, 0.11, 0.10, 0.12, 0.90, 0.11];
    for (org_idx, rate) in rates.iter().enumerate() {
        let org = format!("org-{org_idx}");
        let fp_count = (*rate * 100.0).round() as usize;
        for i in 0..100 {
            fp_store
                .record_event(fp_event("MD-777", &format!("f-{org}-{i}"), &org, i < fp_count))
                .await
                .unwrap();
        }
    }

    let oracle = Oracle::local(dir.path().to_str().unwrap(), RuleRegistry::new())
        .unwrap()
        .with_reputation_engine(Arc::new(UniformReputation));

    let outcome = oracle.run_calibration("MD-777").await.unwrap();
    match outcome {
        CalibrationOutcome::Result(result) => {
            assert!((0.09..0.14).contains(&result.false_positive_rate));
            assert!(result.filter_summary.outliers_filtered >= 1 || result.filter_summary.low_reputation_filtered >= 1);
            assert!(matches!(
                result.confidence.category,
                mirror_calibration::ConfidenceCategory::Medium | mirror_calibration::ConfidenceCategory::High
            ));
        }
        CalibrationOutcome::InsufficientKAnonymity { .. } => panic!("expected a computed result with 10 contributing orgs"),
    }
}
