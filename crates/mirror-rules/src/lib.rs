//! # Rule Evaluator (spec §4.E)
//!
//! Owns the registry of governance rules and the fan-out that runs them,
//! isolating one rule's failure from the rest and converting it into a
//! synthetic critical violation instead of discarding it. Concrete rule
//! bodies (MD-001..005, MD-100..102) live outside this crate; it only
//! owns the contract and the evaluation machinery.

mod evaluator;
mod registry;
mod rule;

pub use evaluator::{evaluate_all_rules, evaluate_all_rules_async, EvaluationReport, EvaluatorConfig, DEFAULT_RULE_TIMEOUT};
pub use registry::RuleRegistry;
pub use rule::{Rule, RuleError, RuleInput};
