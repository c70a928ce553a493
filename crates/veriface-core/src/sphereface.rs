//! SphereFace angular-softmax scorer.
//!
//! Same angular family as ArcFace but with a steeper power-law
//! calibration and a lower boundary, so the two angular algorithms
//! disagree on marginal pairs instead of duplicating each other.

use crate::error::VerifyError;
use crate::scorer::{build_result, normalized_pair, AlgorithmScorer};
use crate::types::{AlgorithmKind, AlgorithmResult, FaceSample, RawMetric};

// --- Named constants (different curve than ArcFace!) ---
const SPHEREFACE_MAX_ANGLE: f32 = 90.0;
/// Exponent of the calibration curve; > 1 makes the falloff steeper than
/// ArcFace's linear mapping across the whole angular range.
const SPHEREFACE_CURVE_EXPONENT: f32 = 1.8;
const SPHEREFACE_DECISION_BOUNDARY: f32 = 55.0;

/// Angular scorer with a steep multiplicative-margin style calibration.
#[derive(Debug, Default, Clone, Copy)]
pub struct SphereFaceScorer;

impl AlgorithmScorer for SphereFaceScorer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::SphereFace
    }

    fn score(&self, a: &FaceSample, b: &FaceSample) -> Result<AlgorithmResult, VerifyError> {
        let (na, nb) = normalized_pair(a, b)?;

        let angle = na.angle_degrees(&nb).min(SPHEREFACE_MAX_ANGLE);
        let closeness = 1.0 - angle / SPHEREFACE_MAX_ANGLE;
        let score = 100.0 * closeness.powf(SPHEREFACE_CURVE_EXPONENT);

        build_result(
            AlgorithmKind::SphereFace,
            score,
            SPHEREFACE_DECISION_BOUNDARY,
            RawMetric::AngleDegrees(angle),
        )
    }
}
