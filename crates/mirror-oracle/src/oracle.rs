//! [`Oracle::analyze`]: the seven-step call sequence of spec §4.G.

use crate::adapters::AdapterSet;
use crate::config::OracleConfig;
use crate::input::OracleInput;
use crate::output::{OracleOutput, ReportCounts};
use mirror_adapters::ports::{BlockCounterAdapter, ConsentStoreAdapter, FpStoreAdapter, SecretStoreAdapter};
use mirror_calibration::{
    aggregate_fps_by_rule, CalibrationConfig, CalibrationOutcome, ConsistencyUpdateQueue,
    ReputationEngine, DEFAULT_QUEUE_CAPACITY,
};
use mirror_policy::{decide, Outcome};
use mirror_redaction::{redact, NonceCache, NonceError, RedactionPattern};
use mirror_rules::{evaluate_all_rules_async, EvaluatorConfig, Rule, RuleInput, RuleRegistry};
use mirror_store::{is_false_positive, FpLookup};
use mirror_types::error::{AdapterFault, AdapterFaultCode, MirrorError};
use mirror_types::time::now_ms;
use mirror_types::violation::Severity;
use std::sync::Arc;
use std::time::Duration;

/// Owns the resolved adapter set, nonce cache, and rule registry for one
/// deployment, and exposes [`Oracle::analyze`] as the single entry point
/// a caller drives. `Send + Sync`; constructed once and shared behind an
/// `Arc` across concurrent callers (spec §5).
pub struct Oracle {
    adapters: AdapterSet,
    config: OracleConfig,
    nonce_cache: NonceCache,
    redaction_patterns: Vec<RedactionPattern>,
    registry: Arc<RuleRegistry>,
    evaluator_config: EvaluatorConfig,
    reputation: Option<Arc<dyn ReputationEngine>>,
    consistency_queue: Option<ConsistencyUpdateQueue>,
}

impl Oracle {
    /// Resolves adapters for `config.provider` and takes ownership of
    /// `registry` (spec §4.G step 1: "resolve adapters from
    /// construction-time config").
    pub fn new(config: OracleConfig, registry: RuleRegistry) -> Result<Self, AdapterFault> {
        let adapters = AdapterSet::build(&config)?;
        let nonce_cache = NonceCache::with_ttl(Duration::from_millis(config.nonce_ttl_ms));
        Ok(Self {
            adapters,
            config,
            nonce_cache,
            redaction_patterns: Vec::new(),
            registry: Arc::new(registry),
            evaluator_config: EvaluatorConfig::default(),
            reputation: None,
            consistency_queue: None,
        })
    }

    /// Convenience constructor for `provider=local` pointed at
    /// `data_dir`, matching the six-adapter contract spec §4.D describes
    /// for a fresh local directory.
    pub fn local(data_dir: impl Into<String>, registry: RuleRegistry) -> Result<Self, AdapterFault> {
        let config = OracleConfig::default().with_local_data_dir(data_dir);
        Self::new(config, registry)
    }

    /// Patterns applied to any `context.evidence` snippet before it
    /// leaves the core (spec §4.B / §7 "redaction MUST apply to any
    /// evidence snippets before the report leaves the core").
    pub fn with_redaction_patterns(mut self, patterns: Vec<RedactionPattern>) -> Self {
        self.redaction_patterns = patterns;
        self
    }

    /// Wires an external reputation collaborator so [`Oracle::run_calibration`]
    /// becomes available (spec §4.H's `ReputationEngine` capability is
    /// supplied by the caller, never computed here).
    pub fn with_reputation_engine(mut self, engine: Arc<dyn ReputationEngine>) -> Self {
        self.consistency_queue = Some(ConsistencyUpdateQueue::spawn(Arc::clone(&engine), DEFAULT_QUEUE_CAPACITY));
        self.reputation = Some(engine);
        self
    }

    pub fn evaluator_config(&self) -> &EvaluatorConfig {
        &self.evaluator_config
    }

    pub fn with_evaluator_config(mut self, evaluator_config: EvaluatorConfig) -> Self {
        self.evaluator_config = evaluator_config;
        self
    }

    /// Fetches and caches a new nonce version from the secret store
    /// (spec §4.C). Bridges the adapter's async `get_nonce` with the
    /// cache's synchronous fetcher-closure contract by awaiting the
    /// fetch eagerly before handing the already-resolved value (or
    /// error) to `load_nonce`.
    pub async fn load_nonce(&self, param_name: &str) -> Result<(), NonceError> {
        let fetched = self
            .adapters
            .secret_store
            .get_nonce(param_name)
            .await
            .map_err(|fault| fault.to_string());
        self.nonce_cache.load_nonce(|_| fetched, param_name)
    }

    /// Implements spec §4.G's seven ordered steps. Step 1 (resolving
    /// adapters) already happened at construction; what follows is
    /// steps 2–7.
    #[tracing::instrument(skip(self, input), fields(mode = input.mode.as_str()))]
    pub async fn analyze(&self, input: OracleInput) -> Result<OracleOutput, MirrorError> {
        if let Some(gate) = &input.state {
            let result = mirror_l0::check(&gate.state, now_ms(), &gate.expected_schema_hash);
            if !result.passed {
                let failed: Vec<String> = result.failed_checks.iter().map(|c| c.to_string()).collect();
                tracing::error!(target: "mirror_oracle", ?failed, "L0 gate rejected state; refusing to analyze");
                return Err(MirrorError::InvariantViolation(failed));
            }
        }

        let strict = input.strict.unwrap_or(self.config.strict_mode);
        let dry_run = input.dry_run.unwrap_or(self.config.dry_run);
        let org_id = input.context.org_id_or_default().to_string();

        let mut degraded = false;
        let mut degraded_reasons = Vec::new();

        // Step 2: rule evaluation, fanned out with per-rule isolation.
        let rule_input = Arc::new(RuleInput {
            mode: input.mode.as_str().to_string(),
            org_id: input.context.org_id.clone(),
            baseline: None,
            context: input.payload,
        });
        let report = evaluate_all_rules_async(
            Arc::clone(&self.registry),
            rule_input,
            self.evaluator_config.clone(),
        )
        .await;
        let rules_checked = report.rules_evaluated + report.rules_errored;

        // Step 3: FP filter. Evaluation-error violations bypass it by
        // construction (they carry no `finding_id` to look up).
        let mut kept = Vec::with_capacity(report.violations.len());
        for violation in report.violations {
            if violation.is_evaluation_error() {
                kept.push(violation);
                continue;
            }
            let finding_id = match &violation.finding_id {
                Some(id) => id.clone(),
                None => {
                    kept.push(violation);
                    continue;
                }
            };
            match is_false_positive(self.adapters.fp_store.as_ref(), &violation.rule_id, &finding_id).await {
                FpLookup::KnownFalsePositive => {}
                FpLookup::NotFalsePositive => kept.push(violation),
                FpLookup::Degraded => {
                    degraded = true;
                    degraded_reasons.push(format!(
                        "fp-store unreachable checking {}/{finding_id}; kept the violation",
                        violation.rule_id
                    ));
                    kept.push(violation);
                }
            }
        }

        // Step 4: circuit-breaker check, honoring the configured
        // threshold rather than mirror_store's fixed default.
        let mut circuit_breaker_tripped = false;
        for violation in &kept {
            match self
                .adapters
                .block_counter
                .is_circuit_broken(&violation.rule_id, &org_id, self.config.circuit_breaker_threshold)
                .await
            {
                Ok(tripped) => circuit_breaker_tripped |= tripped,
                Err(fault) => {
                    degraded = true;
                    degraded_reasons.push(format!(
                        "block-counter unreachable checking {}: {fault}",
                        violation.rule_id
                    ));
                }
            }
        }

        // Step 5: decision.
        let rule_ids: Vec<String> = self.registry.iter().map(|r| r.id().to_string()).collect();
        let decision = decide(&kept, input.mode.as_str(), strict, dry_run, circuit_breaker_tripped, &rule_ids);

        // Step 6: on block, bump the circuit-breaker counter for every
        // remaining violation.
        if decision.outcome == Outcome::Block {
            for violation in &kept {
                if let Err(fault) = self.adapters.block_counter.increment(&violation.rule_id, &org_id).await {
                    degraded = true;
                    degraded_reasons.push(format!(
                        "block-counter increment failed for {}: {fault}",
                        violation.rule_id
                    ));
                }
            }
        }

        // Step 7: redact any evidence snippet before it leaves the core.
        let mut violations = kept;
        for violation in &mut violations {
            let Some(serde_json::Value::String(snippet)) = violation.context.get("evidence").cloned() else {
                continue;
            };
            match redact(&self.nonce_cache, &snippet, &self.redaction_patterns) {
                Ok(redacted) => {
                    violation.context.insert(
                        "evidence".to_string(),
                        serde_json::to_value(&redacted).expect("RedactedText always serializes"),
                    );
                }
                Err(_) => {
                    degraded = true;
                    degraded_reasons.push(format!(
                        "could not redact evidence for {}: no valid nonce cached",
                        violation.rule_id
                    ));
                    violation.context.remove("evidence");
                }
            }
        }

        let critical_issues = violations.iter().filter(|v| v.severity == Severity::Critical).count();
        let report_counts = ReportCounts {
            rules_checked,
            violations_found: violations.len(),
            critical_issues,
        };
        let summary = render_summary(&decision, &report_counts, degraded);

        Ok(OracleOutput {
            machine_decision: decision,
            violations,
            summary,
            report: report_counts,
            degraded,
            degraded_reasons,
        })
    }

    /// Runs spec §4.H's calibration pipeline for one rule. Requires
    /// [`Oracle::with_reputation_engine`] to have been called; it is not
    /// part of `analyze`'s hot path (spec §4.H is an on-demand,
    /// separately-scheduled computation, not a per-request step).
    pub async fn run_calibration(&self, rule_id: &str) -> Result<CalibrationOutcome, AdapterFault> {
        let (reputation, queue) = match (&self.reputation, &self.consistency_queue) {
            (Some(r), Some(q)) => (r, q),
            _ => {
                return Err(AdapterFault::new(
                    AdapterFaultCode::Rejected,
                    "oracle",
                    "run_calibration requires with_reputation_engine to be configured first",
                ))
            }
        };
        let calibration_config = CalibrationConfig {
            byzantine_filter_percentile: self.config.byzantine_filter_percentile,
            z_score_threshold: self.config.z_score_threshold,
            k_anonymity_threshold: self.config.k_anonymity_threshold,
        };
        aggregate_fps_by_rule(
            rule_id,
            self.adapters.fp_store.as_ref(),
            self.adapters.calibration_store.as_ref(),
            reputation.as_ref(),
            queue,
            &calibration_config,
        )
        .await
    }

    /// Thin passthrough to the resolved consent adapter — spec §4.D
    /// defines `ConsentStoreAdapter` but §4.G's seven steps never call
    /// it directly, so it is exposed here rather than invented a step.
    pub async fn check_resource_consent(&self, org_id: &str, feature: &str) -> Result<bool, AdapterFault> {
        self.adapters.consent_store.check_resource_consent(org_id, feature).await
    }
}

fn render_summary(decision: &mirror_policy::MachineDecision, report: &ReportCounts, degraded: bool) -> String {
    let mut lines = vec![format!("Mirror Dissonance analysis: {:?}", decision.outcome)];
    lines.push(format!("  rules checked:    {}", report.rules_checked));
    lines.push(format!("  violations found: {}", report.violations_found));
    lines.push(format!("  critical issues:  {}", report.critical_issues));
    for reason in &decision.reasons {
        lines.push(format!("  - {reason}"));
    }
    if degraded {
        lines.push("  (degraded: one or more adapters were unreachable during this analysis)".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{OracleEventContext, OracleMode};
    use mirror_rules::{Rule, RuleError};
    use mirror_types::violation::{RulePhase, Violation};

    struct AlwaysCritical;
    impl Rule for AlwaysCritical {
        fn id(&self) -> &str {
            "MD-002"
        }
        fn version(&self) -> &str {
            "1"
        }
        fn evaluate(&self, _input: &RuleInput) -> Result<Vec<Violation>, RuleError> {
            Ok(vec![Violation::finding("MD-002", Severity::Critical, "bad thing", "F1")])
        }
    }

    struct AlwaysThrows;
    impl Rule for AlwaysThrows {
        fn id(&self) -> &str {
            "MD-004"
        }
        fn version(&self) -> &str {
            "1"
        }
        fn evaluate(&self, _input: &RuleInput) -> Result<Vec<Violation>, RuleError> {
            Err(RuleError::new("MD-004", "1", RulePhase::Evaluate, "regex timeout"))
        }
    }

    fn registry_with(rules: Vec<Box<dyn Rule>>) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    #[tokio::test]
    async fn critical_violation_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Oracle::local(dir.path().to_str().unwrap(), registry_with(vec![Box::new(AlwaysCritical)])).unwrap();
        let input = OracleInput::new(OracleMode::PullRequest).with_context(OracleEventContext {
            org_id: Some("acme".to_string()),
            ..Default::default()
        });
        let output = oracle.analyze(input).await.unwrap();
        assert_eq!(output.machine_decision.outcome, Outcome::Block);
        assert_eq!(output.report.critical_issues, 1);
        assert!(!output.degraded);
    }

    #[tokio::test]
    async fn rule_error_is_fatal_but_does_not_stop_other_rules() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Oracle::local(
            dir.path().to_str().unwrap(),
            registry_with(vec![Box::new(AlwaysCritical), Box::new(AlwaysThrows)]),
        )
        .unwrap();
        let output = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();
        assert_eq!(output.machine_decision.outcome, Outcome::Block);
        assert!(output.violations.iter().any(|v| v.rule_id == "MD-004" && v.is_evaluation_error()));
        assert!(output.violations.iter().any(|v| v.rule_id == "MD-002"));
        assert_eq!(output.report.rules_checked, 2);
    }

    #[tokio::test]
    async fn known_false_positive_is_dropped_from_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Oracle::local(dir.path().to_str().unwrap(), registry_with(vec![Box::new(AlwaysCritical)])).unwrap();

        oracle
            .adapters
            .fp_store
            .record_event(mirror_adapters::model::FpEvent {
                event_id: "e1".to_string(),
                rule_id: "MD-002".to_string(),
                rule_version: "1".to_string(),
                finding_id: "F1".to_string(),
                outcome: "block".to_string(),
                timestamp_ms: 0,
                is_false_positive: true,
                reviewed_by: Some("alice".to_string()),
                suppression_ticket: None,
                reviewed_at: Some(0),
                context: mirror_adapters::model::FpEventContext {
                    org_id_hash: "acme".to_string(),
                    repo_id: None,
                    branch: None,
                    event_type: "pull_request".to_string(),
                },
            })
            .await
            .unwrap();

        let output = oracle.analyze(OracleInput::new(OracleMode::PullRequest)).await.unwrap();
        assert!(output.violations.is_empty());
        assert_eq!(output.machine_decision.outcome, Outcome::Allow);
    }

    #[tokio::test]
    async fn dry_run_allows_but_records_the_hypothetical() {
        let dir = tempfile::tempdir().unwrap();
        let oracle = Oracle::local(dir.path().to_str().unwrap(), registry_with(vec![Box::new(AlwaysCritical)])).unwrap();
        let mut input = OracleInput::new(OracleMode::PullRequest);
        input.dry_run = Some(true);
        let output = oracle.analyze(input).await.unwrap();
        assert_eq!(output.machine_decision.outcome, Outcome::Allow);
        assert!(output.machine_decision.reasons[0].contains("Block"));
    }

    #[tokio::test]
    async fn l0_gate_rejects_before_anything_else_runs() {
        use mirror_l0::{State, StateNonce};

        let dir = tempfile::tempdir().unwrap();
        let oracle = Oracle::local(dir.path().to_str().unwrap(), registry_with(vec![Box::new(AlwaysCritical)])).unwrap();

        let mut input = OracleInput::new(OracleMode::PullRequest);
        input.state = Some(crate::input::StateGateInput {
            state: State {
                schema_version: 1,
                schema_hash: [1u8; 32],
                permission_bits: 0xF000,
                drift_magnitude: 0.1,
                nonce: StateNonce {
                    value: "a".repeat(64),
                    issued_at: now_ms(),
                },
                contraction_witness_score: Some(1.0),
            },
            expected_schema_hash: [1u8; 32],
        });

        let err = oracle.analyze(input).await.unwrap_err();
        assert!(matches!(err, MirrorError::InvariantViolation(_)));
    }
}
