//! ArcFace angular scorer.
//!
//! Measures the angular separation between L2-normalized embeddings on
//! the unit hypersphere and calibrates it linearly: 0° maps to 100,
//! 90° (or worse) to 0.

use crate::error::VerifyError;
use crate::scorer::{build_result, normalized_pair, AlgorithmScorer};
use crate::types::{AlgorithmKind, AlgorithmResult, FaceSample, RawMetric};

// --- Named constants ---
const ARCFACE_MAX_ANGLE: f32 = 90.0;
const ARCFACE_DECISION_BOUNDARY: f32 = 60.0;

/// Angular-separation scorer; the strongest single algorithm in the
/// ensemble and the one carrying the largest default weight.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArcFaceScorer;

impl AlgorithmScorer for ArcFaceScorer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ArcFace
    }

    fn score(&self, a: &FaceSample, b: &FaceSample) -> Result<AlgorithmResult, VerifyError> {
        let (na, nb) = normalized_pair(a, b)?;

        // Angles past orthogonal saturate: anything ≥ 90° is already a
        // complete non-match on this calibration.
        let angle = na.angle_degrees(&nb).min(ARCFACE_MAX_ANGLE);
        let score = (1.0 - angle / ARCFACE_MAX_ANGLE) * 100.0;

        build_result(
            AlgorithmKind::ArcFace,
            score,
            ARCFACE_DECISION_BOUNDARY,
            RawMetric::AngleDegrees(angle),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Confidence, Embedding, SampleRole};

    fn sample(values: Vec<f32>) -> FaceSample {
        FaceSample::new(
            SampleRole::Selfie,
            Embedding::new(values),
            [(0.0, 0.0); 5],
            90.0,
        )
    }

    fn pair_at_angle(degrees: f32) -> (FaceSample, FaceSample) {
        let r = degrees.to_radians();
        (
            sample(vec![1.0, 0.0]),
            sample(vec![r.cos(), r.sin()]),
        )
    }

    #[test]
    fn test_identical_scores_full() {
        let (a, _) = pair_at_angle(0.0);
        let r = ArcFaceScorer.score(&a, &a).unwrap();
        assert!((r.score - 100.0).abs() < 0.1);
        assert!(r.matched);
        assert_eq!(r.confidence, Confidence::High);
        assert!(matches!(r.raw_metric, RawMetric::AngleDegrees(v) if v < 0.1));
    }

    #[test]
    fn test_orthogonal_scores_zero() {
        let (a, b) = pair_at_angle(90.0);
        let r = ArcFaceScorer.score(&a, &b).unwrap();
        assert!(r.score < 0.1);
        assert!(!r.matched);
    }

    #[test]
    fn test_opposite_saturates_at_ninety() {
        let (a, b) = pair_at_angle(180.0);
        let r = ArcFaceScorer.score(&a, &b).unwrap();
        assert!(r.score < 0.1);
        assert!(matches!(r.raw_metric, RawMetric::AngleDegrees(v) if (v - 90.0).abs() < 0.1));
    }

    #[test]
    fn test_boundary_at_36_degrees() {
        // score = 100 * (1 - 36/90) = 60 exactly at the decision boundary.
        let (a, b) = pair_at_angle(35.0);
        assert!(ArcFaceScorer.score(&a, &b).unwrap().matched);
        let (a, b) = pair_at_angle(37.0);
        assert!(!ArcFaceScorer.score(&a, &b).unwrap().matched);
    }

    #[test]
    fn test_monotone_toward_identity() {
        let mut prev = -1.0f32;
        for step in (0..=18).rev() {
            let (a, b) = pair_at_angle(step as f32 * 5.0);
            let score = ArcFaceScorer.score(&a, &b).unwrap().score;
            assert!(
                score >= prev,
                "score must not decrease toward identity: {score} < {prev}"
            );
            prev = score;
        }
    }

    #[test]
    fn test_symmetric() {
        let (a, b) = pair_at_angle(30.0);
        assert_eq!(
            ArcFaceScorer.score(&a, &b).unwrap(),
            ArcFaceScorer.score(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_scale_invariant() {
        // Normalization makes the raw magnitude irrelevant.
        let a = sample(vec![0.1, 0.0]);
        let b = sample(vec![100.0, 0.0]);
        let r = ArcFaceScorer.score(&a, &b).unwrap();
        assert!((r.score - 100.0).abs() < 0.1);
    }
}
