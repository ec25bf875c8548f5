//! # Mirror Dissonance — Shared Kernel
//!
//! Cross-cutting value objects and the error taxonomy shared by every
//! subsystem crate of the Mirror Dissonance governance Oracle. Nothing in
//! this crate performs I/O; it exists purely so the subsystem crates agree
//! on field names, severities, and error shapes without depending on each
//! other directly.

pub mod error;
pub mod hexbytes;
pub mod time;
pub mod violation;

pub use error::{AdapterFault, AdapterFaultCode, MirrorError};
pub use hexbytes::{Hex64, HexFormatError};
pub use violation::{RulePhase, Severity, Violation, ViolationKind};
