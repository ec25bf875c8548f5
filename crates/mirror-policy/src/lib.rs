//! # Policy / Decision (spec §4.F)
//!
//! Merges a list of violations, plus the circuit-breaker and dry-run
//! signals, into one [`MachineDecision`]. The six rules below are
//! evaluated strictly in order: the first one whose condition holds
//! decides the outcome, but every rule still contributes a reason to
//! the output when its premise is true.

mod decision;

pub use decision::{DecisionMetadata, MachineDecision, Outcome};

use mirror_types::time::now_ms;
use mirror_types::violation::{Severity, Violation};

fn decide_core(critical_count: usize, high_medium_count: usize, strict: bool, circuit_breaker_tripped: bool) -> (Outcome, Vec<String>) {
    if critical_count > 0 && !circuit_breaker_tripped {
        (Outcome::Block, vec![format!("{critical_count} critical violation(s)")])
    } else if circuit_breaker_tripped {
        (Outcome::Warn, vec!["circuit breaker tripped (degraded)".to_string()])
    } else if strict && high_medium_count > 0 {
        (
            Outcome::Block,
            vec![format!("strict mode: {high_medium_count} high/medium violation(s)")],
        )
    } else if high_medium_count > 0 {
        (Outcome::Warn, vec![format!("{high_medium_count} high/medium violation(s)")])
    } else {
        (Outcome::Allow, vec!["no violations requiring action".to_string()])
    }
}

/// Implements spec §4.F's six ordered decision rules.
///
/// Rule 1 (any `isEvaluationError` violation forces `block`, non-
/// overridable even by `dryRun`) and rule 2 (`dryRun` forces `allow` but
/// records what would otherwise have happened) are handled here; rules
/// 3-6 are [`decide_core`].
pub fn decide(
    violations: &[Violation],
    mode: &str,
    strict: bool,
    dry_run: bool,
    circuit_breaker_tripped: bool,
    rules_evaluated: &[String],
) -> MachineDecision {
    let metadata = DecisionMetadata {
        timestamp: now_ms(),
        mode: mode.to_string(),
        rules_evaluated: rules_evaluated.to_vec(),
    };

    let eval_error_count = violations.iter().filter(|v| v.is_evaluation_error()).count();
    if eval_error_count > 0 {
        let critical_count = violations
            .iter()
            .filter(|v| !v.is_evaluation_error() && v.severity == Severity::Critical)
            .count();
        let mut reasons = Vec::new();
        if critical_count > 0 {
            reasons.push(format!("{critical_count} critical violation(s)"));
        }
        reasons.push(format!("{eval_error_count} rule evaluation error(s)"));
        return MachineDecision {
            outcome: Outcome::Block,
            reasons,
            metadata,
        };
    }

    let critical_count = violations.iter().filter(|v| v.severity == Severity::Critical).count();
    let high_medium_count = violations
        .iter()
        .filter(|v| matches!(v.severity, Severity::High | Severity::Medium))
        .count();

    if dry_run {
        let (hypothetical, mut reasons) = decide_core(critical_count, high_medium_count, strict, circuit_breaker_tripped);
        let mut all_reasons = vec![format!("dry run: would have resulted in {hypothetical:?}")];
        all_reasons.append(&mut reasons);
        return MachineDecision {
            outcome: Outcome::Allow,
            reasons: all_reasons,
            metadata,
        };
    }

    let (outcome, reasons) = decide_core(critical_count, high_medium_count, strict, circuit_breaker_tripped);
    MachineDecision { outcome, reasons, metadata }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::violation::RulePhase;

    #[test]
    fn evaluation_error_blocks_non_overridably_even_in_dry_run() {
        let violations = vec![Violation::evaluation_error("MD-004", RulePhase::Evaluate, "regex timeout")];
        let decision = decide(&violations, "pull_request", false, true, false, &[]);
        assert_eq!(decision.outcome, Outcome::Block);
        assert!(decision.reasons.iter().any(|r| r.contains("rule evaluation error")));
    }

    #[test]
    fn dry_run_allows_but_records_what_would_have_happened() {
        let violations = vec![Violation::finding("MD-002", Severity::Critical, "bad", "F1")];
        let decision = decide(&violations, "pull_request", false, true, false, &[]);
        assert_eq!(decision.outcome, Outcome::Allow);
        assert!(decision.reasons[0].contains("Block"));
    }

    #[test]
    fn critical_without_tripped_breaker_blocks() {
        let violations = vec![Violation::finding("MD-002", Severity::Critical, "bad", "F1")];
        let decision = decide(&violations, "pull_request", false, false, false, &[]);
        assert_eq!(decision.outcome, Outcome::Block);
    }

    #[test]
    fn tripped_breaker_degrades_block_to_warn() {
        let violations = vec![Violation::finding("MD-003", Severity::Critical, "bad", "F1")];
        let decision = decide(&violations, "pull_request", false, false, true, &[]);
        assert_eq!(decision.outcome, Outcome::Warn);
        assert!(decision.reasons.iter().any(|r| r.contains("circuit breaker tripped (degraded)")));
    }

    #[test]
    fn strict_mode_blocks_on_high_or_medium() {
        let violations = vec![Violation::finding("MD-005", Severity::High, "meh", "F1")];
        let decision = decide(&violations, "pull_request", true, false, false, &[]);
        assert_eq!(decision.outcome, Outcome::Block);
    }

    #[test]
    fn non_strict_warns_on_high_or_medium() {
        let violations = vec![Violation::finding("MD-005", Severity::Medium, "meh", "F1")];
        let decision = decide(&violations, "pull_request", false, false, false, &[]);
        assert_eq!(decision.outcome, Outcome::Warn);
    }

    #[test]
    fn no_violations_allows() {
        let decision = decide(&[], "pull_request", false, false, false, &[]);
        assert_eq!(decision.outcome, Outcome::Allow);
    }
}
