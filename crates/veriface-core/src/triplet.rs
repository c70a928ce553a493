//! Triplet-loss distance scorer.
//!
//! Works in Euclidean space over normalized embeddings, where distances
//! fall in [0, 2]. Calibration is a Gaussian decay tuned so the score
//! drops fast through the ambiguous middle of the operating range.

use crate::error::VerifyError;
use crate::scorer::{build_result, normalized_pair, AlgorithmScorer};
use crate::types::{AlgorithmKind, AlgorithmResult, FaceSample, RawMetric};

// --- Named constants ---
/// Decay constant for the distance→score curve: score = 100·exp(−(d/σ)²).
const TRIPLET_DECAY_SIGMA: f32 = 0.9;
const TRIPLET_DECISION_BOUNDARY: f32 = 58.0;

/// Euclidean-distance scorer over normalized embeddings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TripletScorer;

impl AlgorithmScorer for TripletScorer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Triplet
    }

    fn score(&self, a: &FaceSample, b: &FaceSample) -> Result<AlgorithmResult, VerifyError> {
        let (na, nb) = normalized_pair(a, b)?;

        let distance = na.euclidean_distance(&nb);
        let score = 100.0 * (-(distance / TRIPLET_DECAY_SIGMA).powi(2)).exp();

        build_result(
            AlgorithmKind::Triplet,
            score,
            TRIPLET_DECISION_BOUNDARY,
            RawMetric::EuclideanDistance(distance),
        )
    }
}
