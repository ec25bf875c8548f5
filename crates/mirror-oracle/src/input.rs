//! [`OracleInput`]: the external request shape of spec §6.

use mirror_l0::State;
use serde::{Deserialize, Serialize};

/// The kind of change event being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleMode {
    PullRequest,
    MergeGroup,
    Drift,
    Calibration,
}

impl OracleMode {
    /// The wire-format string, also passed through to rule bodies as
    /// `RuleInput.mode` and into [`mirror_policy::decide`]'s `mode` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleMode::PullRequest => "pull_request",
            OracleMode::MergeGroup => "merge_group",
            OracleMode::Drift => "drift",
            OracleMode::Calibration => "calibration",
        }
    }
}

/// Identifying context for the event under analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleEventContext {
    pub repository_name: Option<String>,
    pub pr_number: Option<u64>,
    pub commit_sha: Option<String>,
    pub branch: Option<String>,
    pub author: Option<String>,
    pub org_id: Option<String>,
}

impl OracleEventContext {
    /// Circuit-breaker and block-counter buckets are keyed per-org
    /// (spec §3 `BlockCounterEntry`); requests without an explicit
    /// `orgId` share one bucket rather than erroring, since not every
    /// mode (e.g. a local `drift` check) necessarily has an org.
    pub fn org_id_or_default(&self) -> &str {
        self.org_id.as_deref().unwrap_or("unscoped")
    }
}

/// Ambient addition: when present, [`crate::Oracle::analyze`] runs the
/// L0 gate (spec §4.A) against `state` before anything else. A failed
/// gate is fatal for the whole call — it returns
/// `MirrorError::InvariantViolation` rather than a normal
/// [`crate::OracleOutput`], since spec §4.A requires that the offending
/// state never be acted upon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateGateInput {
    pub state: State,
    /// Compared byte-for-byte against `state.schema_hash` by the L0 gate;
    /// kept alongside `state` (rather than hardcoded) since L0 is a pure
    /// function of its inputs.
    pub expected_schema_hash: [u8; 32],
}

/// One `analyze` request (spec §6 `OracleInput`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleInput {
    pub mode: OracleMode,
    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub baseline_file: Option<String>,
    #[serde(default)]
    pub context: OracleEventContext,
    #[serde(default)]
    pub state: Option<StateGateInput>,
    /// Payload handed verbatim to rule bodies as `RuleInput.context`.
    /// Rule bodies (MD-001..005, MD-100..102) live outside this crate,
    /// so this crate cannot know their expected shape in advance.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl OracleInput {
    pub fn new(mode: OracleMode) -> Self {
        Self {
            mode,
            strict: None,
            dry_run: None,
            baseline_file: None,
            context: OracleEventContext::default(),
            state: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_context(mut self, context: OracleEventContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
