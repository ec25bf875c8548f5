//! # Oracle Orchestrator (spec §4.G, §6)
//!
//! Wires the nonce cache and redaction core (`mirror-redaction`), the
//! adapter set (`mirror-adapters`), the semantic store operations
//! (`mirror-store`), the rule evaluator (`mirror-rules`), the decision
//! engine (`mirror-policy`), and calibration (`mirror-calibration`)
//! together into the single public surface a deployment actually calls:
//! [`Oracle::analyze`].
//!
//! Everything upstream of this crate is a pure component tested in
//! isolation; this crate's job is exclusively the seven-step call
//! sequence of spec §4.G, in order, and nothing else.

mod adapters;
mod config;
mod input;
mod oracle;
mod output;

pub use adapters::AdapterSet;
pub use config::{ConfigError, OracleConfig};
pub use input::{OracleEventContext, OracleInput, OracleMode, StateGateInput};
pub use oracle::Oracle;
pub use output::{OracleOutput, ReportCounts};

pub use mirror_redaction::RedactionPattern;
pub use mirror_rules::{Rule, RuleError, RuleInput, RuleRegistry};
pub use mirror_types::error::MirrorError;
