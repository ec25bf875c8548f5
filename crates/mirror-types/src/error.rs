//! Error taxonomy shared across subsystem crates.
//!
//! Each kind here names a *contract*, matching spec §7: subsystem crates
//! keep their own local `thiserror` enums and the orchestrator folds them
//! into [`MirrorError`] only at the boundary where it needs to unify them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Carried by any persistence-adapter failure. Fail-closed policy: callers
/// MUST keep the safer outcome (e.g. keep a violation instead of treating
/// it as a filtered false positive) rather than swallow this.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("adapter fault [{code:?}] from {source}: {message}")]
pub struct AdapterFault {
    pub code: AdapterFaultCode,
    pub source: String,
    pub message: String,
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl AdapterFault {
    pub fn new(code: AdapterFaultCode, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            source: source.into(),
            message: message.into(),
            context: BTreeMap::new(),
        }
    }
}

/// Categories of adapter fault, independent of the underlying provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterFaultCode {
    /// The record already exists (e.g. duplicate `eventId`).
    Duplicate,
    /// The requested record does not exist.
    NotFound,
    /// The backing store could not be reached at all.
    Unreachable,
    /// The backing store rejected the operation for another reason.
    Rejected,
    /// A lower-level I/O error (disk, network) occurred.
    Io,
    /// The record retrieved failed structural validation.
    Corrupt,
}

/// Umbrella error used at crate boundaries that must unify multiple
/// subsystem error types (principally the orchestrator).
#[derive(Debug, Clone, thiserror::Error)]
pub enum MirrorError {
    #[error("L0 invariant violated: {0:?}")]
    InvariantViolation(Vec<String>),

    #[error("no valid nonce available for redaction/validation")]
    NonceUnavailable,

    #[error(transparent)]
    Adapter(#[from] AdapterFault),

    #[error("rule evaluation error in {rule_id} during {phase:?}: {message}")]
    RuleEvaluation {
        rule_id: String,
        phase: crate::violation::RulePhase,
        message: String,
    },
}
