//! CosFace margin scorer.
//!
//! Applies the large-margin-cosine idea at comparison time: the raw
//! cosine is penalized by an additive margin before a linear rescale to
//! [0, 100], so borderline pairs are pushed toward rejection.

use crate::error::VerifyError;
use crate::scorer::{build_result, normalized_pair, AlgorithmScorer};
use crate::types::{AlgorithmKind, AlgorithmResult, FaceSample, RawMetric};

// --- Named constants ---
const COSFACE_DEFAULT_MARGIN: f32 = 0.35;
const COSFACE_DECISION_BOUNDARY: f32 = 62.0;

/// Cosine-with-margin scorer. The margin is injected from the engine
/// configuration; [`Default`] uses the standard 0.35.
#[derive(Debug, Clone, Copy)]
pub struct CosFaceScorer {
    margin: f32,
}

impl CosFaceScorer {
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }
}

impl Default for CosFaceScorer {
    fn default() -> Self {
        Self::new(COSFACE_DEFAULT_MARGIN)
    }
}

impl AlgorithmScorer for CosFaceScorer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::CosFace
    }

    fn score(&self, a: &FaceSample, b: &FaceSample) -> Result<AlgorithmResult, VerifyError> {
        let (na, nb) = normalized_pair(a, b)?;

        let cosine = na.dot(&nb).clamp(-1.0, 1.0);
        // Linear-plus-margin rescale: [-1, 1] → [0, 100] after the penalty.
        let score = (cosine - self.margin + 1.0) / 2.0 * 100.0;

        build_result(
            AlgorithmKind::CosFace,
            score,
            COSFACE_DECISION_BOUNDARY,
            RawMetric::CosineValue(cosine),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Embedding, SampleRole};

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
        (sample(vec![1.0, 0.0]), sample(vec![r.cos(), r.sin()]))
    }

    #[test]
    fn test_identical_pays_the_margin() {
        let (a, _) = pair_at_angle(0.0);
        let r = CosFaceScorer::default().score(&a, &a).unwrap();
        // (1.0 - 0.35 + 1.0) / 2 = 0.825
        assert!((r.score - 82.5).abs() < 0.1);
        assert!(r.matched);
        assert!(matches!(r.raw_metric, RawMetric::CosineValue(c) if (c - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_orthogonal_scores_low() {
        let (a, b) = pair_at_angle(90.0);
        let r = CosFaceScorer::default().score(&a, &b).unwrap();
        assert!((r.score - 32.5).abs() < 0.1);
        assert!(!r.matched);
    }

    #[test]
    fn test_opposite_clamps_to_zero() {
        let (a, b) = pair_at_angle(180.0);
        let r = CosFaceScorer::default().score(&a, &b).unwrap();
        assert_eq!(r.score, 0.0);
        assert!(matches!(r.raw_metric, RawMetric::CosineValue(c) if (c + 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_raw_metric_is_unpenalized_cosine() {
        // The margin shapes the score, never the reported raw cosine.
        let (a, b) = pair_at_angle(60.0);
        let r = CosFaceScorer::default().score(&a, &b).unwrap();
        assert!(matches!(r.raw_metric, RawMetric::CosineValue(c) if (c - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_larger_margin_scores_lower() {
        let (a, b) = pair_at_angle(30.0);
        let lenient = CosFaceScorer::new(0.1).score(&a, &b).unwrap().score;
        let strict = CosFaceScorer::new(0.5).score(&a, &b).unwrap().score;
        assert!(strict < lenient);
    }

    #[test]
    fn test_monotone_toward_identity() {
        let scorer = CosFaceScorer::default();
        let mut prev = -1.0f32;
        for step in (0..=18).rev() {
            let (a, b) = pair_at_angle(step as f32 * 5.0);
            let score = scorer.score(&a, &b).unwrap().score;
            assert!(score >= prev, "{score} < {prev}");
            prev = score;
        }
    }

    #[test]
    fn test_symmetric() {
        let (a, b) = pair_at_angle(25.0);
        let scorer = CosFaceScorer::default();
        assert_eq!(scorer.score(&a, &b).unwrap(), scorer.score(&b, &a).unwrap());
    }
}
