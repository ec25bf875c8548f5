//! Statistical helpers behind the Byzantine filter (spec §4.H step 3):
//! a low-reputation percentile cut followed by a weighted-z-score
//! outlier cut, gated on a minimum sample size.

/// Minimum number of contributors required before the z-score cut is
/// applied at all; below this, per-org FP rates are too noisy to call
/// any of them outliers.
pub const MIN_SAMPLE_SIZE_FOR_OUTLIER_FILTER: usize = 5;

/// One contributing organization's raw inputs to the filter.
#[derive(Debug, Clone, Copy)]
pub struct Contributor {
    pub fp_rate: f64,
    pub reputation_score: f64,
    pub weight: f64,
}

/// Linear-interpolated percentile (0..1) over `values`, matching the
/// common "percentile rank" definition used for reputation cutoffs.
fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn weighted_mean(contributors: &[Contributor]) -> f64 {
    let total_weight: f64 = contributors.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    contributors.iter().map(|c| c.weight * c.fp_rate).sum::<f64>() / total_weight
}

fn weighted_stddev(contributors: &[Contributor], mean: f64) -> f64 {
    let total_weight: f64 = contributors.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let variance = contributors
        .iter()
        .map(|c| c.weight * (c.fp_rate - mean).powi(2))
        .sum::<f64>()
        / total_weight;
    variance.sqrt()
}

/// Outcome of applying the filter: which original indices survived,
/// and a summary of what was dropped and why.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub trusted_indices: Vec<usize>,
    pub low_reputation_filtered: usize,
    pub outliers_filtered: usize,
}

/// Drops contributors below `byzantine_filter_percentile` of reputation,
/// then (only if `MIN_SAMPLE_SIZE_FOR_OUTLIER_FILTER` or more remain)
/// drops whoever's FP rate is more than `z_score_threshold` weighted
/// standard deviations from the weighted mean of the survivors.
pub fn apply_filter(contributors: &[Contributor], byzantine_filter_percentile: f64, z_score_threshold: f64) -> FilterOutcome {
    let reputations: Vec<f64> = contributors.iter().map(|c| c.reputation_score).collect();
    let cutoff = percentile(&reputations, byzantine_filter_percentile);

    let mut after_reputation: Vec<usize> = Vec::new();
    let mut low_reputation_filtered = 0;
    for (idx, c) in contributors.iter().enumerate() {
        if c.reputation_score < cutoff {
            low_reputation_filtered += 1;
        } else {
            after_reputation.push(idx);
        }
    }

    if after_reputation.len() < MIN_SAMPLE_SIZE_FOR_OUTLIER_FILTER {
        return FilterOutcome {
            trusted_indices: after_reputation,
            low_reputation_filtered,
            outliers_filtered: 0,
        };
    }

    // Leave-one-out z-score: a single strong outlier pulls a group-wide
    // mean/stddev toward itself and can mask its own deviation, so each
    // contributor is scored against the mean/stddev of *everyone else*
    // in the surviving set rather than the whole-group statistics.
    let surviving: Vec<Contributor> = after_reputation.iter().map(|&i| contributors[i]).collect();
    let mut trusted_indices = Vec::new();
    let mut outliers_filtered = 0;
    for (pos, &idx) in after_reputation.iter().enumerate() {
        let others: Vec<Contributor> = surviving
            .iter()
            .enumerate()
            .filter(|(p, _)| *p != pos)
            .map(|(_, c)| *c)
            .collect();
        let mean = weighted_mean(&others);
        let stddev = weighted_stddev(&others, mean);
        let c = surviving[pos];
        let z = if stddev > 0.0 { (c.fp_rate - mean).abs() / stddev } else { 0.0 };
        if z > z_score_threshold {
            outliers_filtered += 1;
        } else {
            trusted_indices.push(idx);
        }
    }

    FilterOutcome {
        trusted_indices,
        low_reputation_filtered,
        outliers_filtered,
    }
}

/// `Σ(weight_i · fpRate_i) / Σ weight_i` over the given contributors.
pub fn consensus_fp_rate(contributors: &[Contributor]) -> f64 {
    weighted_mean(contributors)
}

pub fn coefficient_of_variation(contributors: &[Contributor]) -> f64 {
    let mean = weighted_mean(contributors);
    if mean == 0.0 {
        return 0.0;
    }
    weighted_stddev(contributors, mean) / mean
}
