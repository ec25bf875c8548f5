//! The [`ReputationEngine`] capability calibration consumes but never
//! computes (spec Non-goal: "no identity issuance"). Trust scores are
//! supplied by an external collaborator; this crate only reads and
//! writes through the trait.

use async_trait::async_trait;

/// One organization's standing, as reported by the external reputation
/// system at the moment calibration asks for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationWeight {
    /// Contribution weight used directly in the consensus average.
    pub weight: f64,
    /// Raw reputation score in `[0, 1]`, used by the low-reputation cut.
    pub reputation_score: f64,
    pub stake: f64,
}

/// Capability calibration depends on for reputation-weighted consensus
/// and for feeding back per-contributor consistency deltas.
#[async_trait]
pub trait ReputationEngine: Send + Sync {
    async fn calculate_contribution_weight(&self, org_id: &str) -> ReputationWeight;

    /// Applies `delta` to `org_id`'s running consistency score. Callers
    /// invoke this off the hot path (spec §4.H step 6, §9: "bounded task
    /// queue with backpressure").
    async fn update_consistency_score(&self, org_id: &str, delta: f64);
}
