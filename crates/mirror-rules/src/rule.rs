//! The [`Rule`] contract and its input/error shapes.
//!
//! Concrete rule bodies (MD-001..005, MD-100..102) are out of scope for
//! this crate; it owns only the contract a rule must satisfy and the
//! machinery that fans out over a registry of them.

use mirror_types::violation::{RulePhase, Violation};
use serde::{Deserialize, Serialize};

/// The subset of an incoming change event a rule needs to evaluate
/// against. Deliberately payload-agnostic: since rule bodies live
/// outside this crate, `context` carries whatever structured data a
/// given rule expects rather than a closed set of typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    pub mode: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub baseline: Option<Vec<u8>>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl RuleInput {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            org_id: None,
            baseline: None,
            context: serde_json::Value::Null,
        }
    }
}

/// Raised when a rule fails to complete its contract during one of the
/// four named phases. Converted by the evaluator into exactly one
/// synthetic critical [`Violation`] — never silently discarded (spec §7).
#[derive(Debug, Clone, thiserror::Error)]
#[error("rule {rule_id} v{rule_version} failed during {phase:?}: {message}")]
pub struct RuleError {
    pub rule_id: String,
    pub rule_version: String,
    pub phase: RulePhase,
    pub message: String,
}

impl RuleError {
    pub fn new(
        rule_id: impl Into<String>,
        rule_version: impl Into<String>,
        phase: RulePhase,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_version: rule_version.into(),
            phase,
            message: message.into(),
        }
    }

    /// Converts this failure into the single synthetic violation it emits.
    pub fn into_violation(self) -> Violation {
        Violation::evaluation_error(self.rule_id, self.phase, self.message)
    }
}

/// One registered governance rule.
///
/// Rules are independent and pure over their inputs (spec §4.E), so the
/// trait is synchronous: any adapter I/O a rule body needs is the
/// orchestrator's job, performed before or after evaluation, not inside
/// the rule itself.
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn version(&self) -> &str;
    fn evaluate(&self, input: &RuleInput) -> Result<Vec<Violation>, RuleError>;
}
