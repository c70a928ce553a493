//! Ensemble combination.
//!
//! Merges the four algorithm results into a weighted score, a vote
//! count, and a disagreement variance. Pure arithmetic; associative and
//! commutative, so scorer evaluation order never matters.

use crate::config::EnsembleWeights;
use crate::error::{ensure_finite, VerifyError};
use crate::types::AlgorithmResult;

/// Merged view of the four algorithm results, before thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combined {
    /// Weighted ensemble score in [0, 100].
    pub weighted_score: f32,
    /// Algorithms that voted matched.
    pub votes: u8,
    /// Population variance of the unweighted scores.
    pub variance: f32,
    /// Size of the majority voting bloc.
    pub agreement_count: u8,
}

/// Combine per-algorithm results under the configured weights.
pub fn combine(
    results: &[AlgorithmResult],
    weights: &EnsembleWeights,
) -> Result<Combined, VerifyError> {
    if results.is_empty() {
        return Err(VerifyError::InternalComputationError {
            stage: "ensemble combination",
        });
    }

    let weighted_score: f32 = results
        .iter()
        .map(|r| weights.get(r.kind) * r.score)
        .sum();
    let weighted_score = ensure_finite(weighted_score, "ensemble combination")?.clamp(0.0, 100.0);

    let votes = results.iter().filter(|r| r.matched).count() as u8;
    let total = results.len() as u8;
    let agreement_count = votes.max(total - votes);

    let n = results.len() as f32;
    let mean = results.iter().map(|r| r.score).sum::<f32>() / n;
    let variance = results.iter().map(|r| (r.score - mean).powi(2)).sum::<f32>() / n;
    let variance = ensure_finite(variance, "score variance")?;

    Ok(Combined {
        weighted_score,
        votes,
        variance,
        agreement_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlgorithmKind, Confidence, RawMetric};

    fn result(kind: AlgorithmKind, score: f32, matched: bool) -> AlgorithmResult {
        AlgorithmResult {
            kind,
            score,
            matched,
            confidence: Confidence::Medium,
            raw_metric: RawMetric::AngleDegrees(0.0),
        }
    }

    fn four(scores: [f32; 4], matched: [bool; 4]) -> Vec<AlgorithmResult> {
        AlgorithmKind::ALL
            .iter()
            .zip(scores.iter().zip(matched.iter()))
            .map(|(&kind, (&score, &m))| result(kind, score, m))
            .collect()
    }

    #[test]
    fn test_default_weights_applied() {
        let results = four([100.0, 50.0, 80.0, 60.0], [true, false, true, true]);
        let combined = combine(&results, &EnsembleWeights::default()).unwrap();
        // 0.40·100 + 0.20·50 + 0.25·80 + 0.15·60 = 79.0
        assert!((combined.weighted_score - 79.0).abs() < 1e-3);
        assert_eq!(combined.votes, 3);
        assert_eq!(combined.agreement_count, 3);
    }

    #[test]
    fn test_votes_counted() {
        let combined = combine(
            &four([70.0, 70.0, 70.0, 70.0], [true, true, true, true]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        assert_eq!(combined.votes, 4);
        assert_eq!(combined.agreement_count, 4);

        let combined = combine(
            &four([10.0, 10.0, 10.0, 10.0], [false, false, false, false]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        assert_eq!(combined.votes, 0);
        assert_eq!(combined.agreement_count, 4);
    }

    #[test]
    fn test_split_vote_agreement() {
        let combined = combine(
            &four([70.0, 65.0, 30.0, 25.0], [true, true, false, false]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        assert_eq!(combined.votes, 2);
        assert_eq!(combined.agreement_count, 2);
    }

    #[test]
    fn test_variance_of_equal_scores_is_zero() {
        let combined = combine(
            &four([60.0, 60.0, 60.0, 60.0], [true, true, true, true]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        assert_eq!(combined.variance, 0.0);
    }

    #[test]
    fn test_variance_population_formula() {
        let combined = combine(
            &four([80.0, 80.0, 20.0, 20.0], [true, true, false, false]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        // mean 50, deviations ±30 → population variance 900.
        assert!((combined.variance - 900.0).abs() < 1e-3);
    }

    #[test]
    fn test_order_independent() {
        let mut results = four([90.0, 40.0, 70.0, 55.0], [true, false, true, true]);
        let a = combine(&results, &EnsembleWeights::default()).unwrap();
        results.reverse();
        let b = combine(&results, &EnsembleWeights::default()).unwrap();
        assert!((a.weighted_score - b.weighted_score).abs() < 1e-4);
        assert_eq!(a.votes, b.votes);
        assert!((a.variance - b.variance).abs() < 1e-4);
    }

    #[test]
    fn test_weighted_score_stays_in_range() {
        let combined = combine(
            &four([100.0, 100.0, 100.0, 100.0], [true, true, true, true]),
            &EnsembleWeights::default(),
        )
        .unwrap();
        assert!(combined.weighted_score <= 100.0);
        assert!((combined.weighted_score - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_results_rejected() {
        assert!(combine(&[], &EnsembleWeights::default()).is_err());
    }
}
