//! [`OracleOutput`]: the external response shape of spec §6.

use mirror_policy::MachineDecision;
use mirror_types::violation::Violation;
use serde::{Deserialize, Serialize};

/// Counts summarizing one `analyze` call, independent of the rendered
/// `summary` text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCounts {
    pub rules_checked: usize,
    pub violations_found: usize,
    pub critical_issues: usize,
}

/// The result of one `analyze` call (spec §6 `OracleOutput`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleOutput {
    pub machine_decision: MachineDecision,
    pub violations: Vec<Violation>,
    /// Human-readable multi-line report. Machine consumers MUST rely on
    /// `machine_decision` and `violations` instead of parsing this.
    pub summary: String,
    pub report: ReportCounts,
    /// True iff a fail-closed adapter fault was encountered anywhere
    /// during this call (spec §7: "only the Oracle orchestrator may
    /// translate adapter faults into a degraded-mode annotation on the
    /// outgoing report").
    pub degraded: bool,
    #[serde(default)]
    pub degraded_reasons: Vec<String>,
}
