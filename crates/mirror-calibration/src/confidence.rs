//! Confidence scoring over a filtered contributor set (spec §4.H step 5).

use crate::byzantine::{coefficient_of_variation, Contributor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceCategory {
    Insufficient,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub score: f64,
    pub category: ConfidenceCategory,
}

/// Below this many trusted contributors, confidence is always
/// `Insufficient` regardless of the weighted score (spec §4.H step 5).
pub const MIN_TRUSTED_CONTRIBUTORS: usize = 3;

const CONTRIBUTOR_COUNT_WEIGHT: f64 = 0.35;
const AGREEMENT_WEIGHT: f64 = 0.30;
const EVENT_COUNT_WEIGHT: f64 = 0.20;
const MEAN_REPUTATION_WEIGHT: f64 = 0.15;

/// Contributor count beyond which the count sub-score saturates at 1.0.
const CONTRIBUTOR_COUNT_SATURATION: f64 = 15.0;
/// Total event count beyond which the event-count sub-score saturates.
const EVENT_COUNT_SATURATION: f64 = 200.0;

pub fn score(trusted: &[Contributor], total_event_count: usize) -> Confidence {
    if trusted.len() < MIN_TRUSTED_CONTRIBUTORS {
        return Confidence {
            score: 0.0,
            category: ConfidenceCategory::Insufficient,
        };
    }

    let contributor_count_score = (trusted.len() as f64 / CONTRIBUTOR_COUNT_SATURATION).min(1.0);
    let agreement_score = (1.0 - coefficient_of_variation(trusted)).clamp(0.0, 1.0);
    let event_count_score = (total_event_count as f64 / EVENT_COUNT_SATURATION).min(1.0);
    let mean_reputation_score = (trusted.iter().map(|c| c.reputation_score).sum::<f64>() / trusted.len() as f64).clamp(0.0, 1.0);

    let weighted = CONTRIBUTOR_COUNT_WEIGHT * contributor_count_score
        + AGREEMENT_WEIGHT * agreement_score
        + EVENT_COUNT_WEIGHT * event_count_score
        + MEAN_REPUTATION_WEIGHT * mean_reputation_score;

    let category = if weighted >= 0.75 {
        ConfidenceCategory::High
    } else if weighted >= 0.5 {
        ConfidenceCategory::Medium
    } else if weighted >= 0.25 {
        ConfidenceCategory::Low
    } else {
        ConfidenceCategory::Insufficient
    };

    Confidence { score: weighted, category }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byzantine::Contributor;

    fn c(fp_rate: f64, reputation_score: f64, weight: f64) -> Contributor {
        Contributor { fp_rate, reputation_score, weight }
    }

    #[test]
    fn under_minimum_contributors_is_always_insufficient() {
        let trusted = vec![c(0.1, 0.9, 1.0), c(0.1, 0.9, 1.0)];
        let confidence = score(&trusted, 50);
        assert_eq!(confidence.category, ConfidenceCategory::Insufficient);
    }

    #[test]
    fn many_agreeing_high_reputation_contributors_score_high() {
        let trusted: Vec<Contributor> = (0..10).map(|_| c(0.11, 0.95, 1.0)).collect();
        let confidence = score(&trusted, 200);
        assert!(matches!(confidence.category, ConfidenceCategory::High | ConfidenceCategory::Medium));
    }
}
