//! [`MachineDecision`] and the [`decide`] entry point.

use serde::{Deserialize, Serialize};

/// The final outcome of one `analyze` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Allow,
    Warn,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetadata {
    pub timestamp: i64,
    pub mode: String,
    pub rules_evaluated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDecision {
    pub outcome: Outcome,
    pub reasons: Vec<String>,
    pub metadata: DecisionMetadata,
}
