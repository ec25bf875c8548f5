//! The [`Violation`] value object and its severity/kind taxonomy.
//!
//! Per the re-architecture guidance this system was distilled from:
//! synthetic violations raised from a failing rule are modeled as a tagged
//! variant (`ViolationKind::EvaluationError`), not as a magic boolean buried
//! in a free-form context map. The decision layer (`mirror-policy`) matches
//! on this tag directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity of a governance violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// The phase a rule was in when it threw, for [`ViolationKind::EvaluationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RulePhase {
    Init,
    Evaluate,
    Evidence,
    Post,
}

/// Distinguishes a violation a rule genuinely found from one synthesized
/// because the rule itself failed to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationKind {
    /// A real finding produced by a rule's own logic.
    Real,
    /// Synthesized because the rule threw during the named phase.
    EvaluationError { phase: RulePhase },
}

/// A single structured governance violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Identifies the specific finding for false-positive tracking.
    /// `None` for synthetic evaluation-error violations, which are never
    /// run through the FP filter.
    #[serde(default)]
    pub finding_id: Option<String>,
}

impl Violation {
    /// Constructs a violation representing a genuine rule finding.
    pub fn finding(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        finding_id: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            kind: ViolationKind::Real,
            context: BTreeMap::new(),
            finding_id: Some(finding_id.into()),
        }
    }

    /// Constructs the synthetic critical violation raised when a rule
    /// throws during evaluation (spec §4.E / §7 "Rule evaluation error").
    pub fn evaluation_error(
        rule_id: impl Into<String>,
        phase: RulePhase,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity: Severity::Critical,
            message: message.into(),
            kind: ViolationKind::EvaluationError { phase },
            context: BTreeMap::new(),
            finding_id: None,
        }
    }

    /// True iff this violation was synthesized from a thrown rule error.
    pub fn is_evaluation_error(&self) -> bool {
        matches!(self.kind, ViolationKind::EvaluationError { .. })
    }

    /// Attaches a context entry, builder-style.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}
