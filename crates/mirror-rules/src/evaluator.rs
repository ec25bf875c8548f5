//! Fan-out evaluation over a [`RuleRegistry`] with per-rule isolation
//! (spec §4.E): one rule's failure — or timeout — never prevents the
//! others from running, and is converted into exactly one synthetic
//! critical violation rather than discarded.

use crate::registry::RuleRegistry;
use crate::rule::{Rule, RuleError, RuleInput};
use mirror_types::violation::{RulePhase, Violation};
use rayon::prelude::*;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Default per-rule wall-clock timeout (spec §4.E / §5).
pub const DEFAULT_RULE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// `None` means unbounded up to CPU count (spec §4.E default).
    pub max_parallelism: Option<usize>,
    pub rule_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: None,
            rule_timeout: DEFAULT_RULE_TIMEOUT,
        }
    }
}

/// Outcome of fanning out over every registered rule.
///
/// `rules_evaluated + rules_errored == registry.len()` always holds.
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub violations: Vec<Violation>,
    pub errors: Vec<RuleError>,
    pub rules_evaluated: usize,
    pub rules_errored: usize,
}

fn finalize(results: Vec<Result<Vec<Violation>, RuleError>>) -> EvaluationReport {
    let mut report = EvaluationReport::default();
    for result in results {
        match result {
            Ok(mut violations) => {
                report.rules_evaluated += 1;
                report.violations.append(&mut violations);
            }
            Err(err) => {
                tracing::warn!(
                    target: "mirror_rules",
                    rule_id = %err.rule_id,
                    phase = ?err.phase,
                    message = %err.message,
                    "rule evaluation failed; emitting synthetic violation"
                );
                report.rules_errored += 1;
                report.violations.push(err.clone().into_violation());
                report.errors.push(err);
            }
        }
    }
    report
}

/// Runs one rule on a scoped worker thread, enforcing `timeout` via a
/// rendezvous channel. A straggler past the deadline is not killed (Rust
/// has no safe preemption primitive for this) but its result is ignored
/// by the caller and a timeout error is reported in its place.
fn run_with_timeout(rule: &dyn Rule, input: &RuleInput, timeout: Duration) -> Result<Vec<Violation>, RuleError> {
    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        scope.spawn(|| {
            let _ = tx.send(rule.evaluate(input));
        });
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(RuleError::new(
                rule.id(),
                rule.version(),
                RulePhase::Evaluate,
                format!("rule timed out after {timeout:?}"),
            )),
        }
    })
}

/// Evaluates every registered rule, fanned out in parallel bounded by
/// `config.max_parallelism` (spec §4.E: "MAY run them in parallel
/// bounded by a configurable degree; default unbounded up to CPU
/// count"). Results are collected in registration order regardless of
/// the order in which individual rules finish.
pub fn evaluate_all_rules(registry: &RuleRegistry, input: &RuleInput, config: &EvaluatorConfig) -> EvaluationReport {
    let rules: Vec<&dyn Rule> = registry.iter().collect();
    let run = |rule: &&dyn Rule| run_with_timeout(*rule, input, config.rule_timeout);

    let results: Vec<Result<Vec<Violation>, RuleError>> = match config.max_parallelism {
        Some(n) if n > 0 => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| rules.par_iter().map(run).collect()),
            Err(err) => {
                tracing::warn!(target: "mirror_rules", %err, "failed to build bounded thread pool; falling back to default");
                rules.par_iter().map(run).collect()
            }
        },
        _ => rules.par_iter().map(run).collect(),
    };

    finalize(results)
}

/// Async entry point used by the orchestrator: offloads each rule onto
/// the blocking thread pool and wraps it in a [`tokio::time::timeout`]
/// rather than the thread-join timeout `evaluate_all_rules` uses, so a
/// caller already on an async runtime never blocks its own worker
/// threads waiting on a straggling rule.
pub async fn evaluate_all_rules_async(
    registry: Arc<RuleRegistry>,
    input: Arc<RuleInput>,
    config: EvaluatorConfig,
) -> EvaluationReport {
    let futures = (0..registry.len()).map(|idx| {
        let rule_id = registry.get(idx).expect("index in bounds").id().to_string();
        let rule_version = registry.get(idx).expect("index in bounds").version().to_string();
        let registry = Arc::clone(&registry);
        let input = Arc::clone(&input);
        let timeout = config.rule_timeout;
        async move {
            let blocking = tokio::task::spawn_blocking(move || {
                let rule = registry.get(idx).expect("index in bounds");
                rule.evaluate(&input)
            });
            match tokio::time::timeout(timeout, blocking).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(RuleError::new(
                    rule_id,
                    rule_version,
                    RulePhase::Evaluate,
                    format!("rule task panicked: {join_err}"),
                )),
                Err(_) => Err(RuleError::new(
                    rule_id,
                    rule_version,
                    RulePhase::Evaluate,
                    format!("rule timed out after {timeout:?}"),
                )),
            }
        }
    });

    finalize(futures::future::join_all(futures).await)
}
