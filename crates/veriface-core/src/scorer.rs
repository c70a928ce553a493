//! Common contract shared by the four algorithm scorers.

use crate::error::{ensure_finite, VerifyError};
use crate::types::{AlgorithmKind, AlgorithmResult, Confidence, Embedding, FaceSample, RawMetric};

/// Margin past an algorithm's own decision boundary that upgrades its
/// confidence label.
const HIGH_CONFIDENCE_MARGIN: f32 = 15.0;
const MEDIUM_CONFIDENCE_MARGIN: f32 = 5.0;

/// Strategy interface for one similarity algorithm.
///
/// Implementations are deterministic, side-effect free, and symmetric
/// under swapping the two samples.
pub trait AlgorithmScorer: Send + Sync {
    fn kind(&self) -> AlgorithmKind;

    fn score(&self, a: &FaceSample, b: &FaceSample) -> Result<AlgorithmResult, VerifyError>;
}

/// Validate a sample pair and return both embeddings L2-normalized.
///
/// Empty vectors, dimension mismatch, and non-finite components are all
/// hard `FeatureInvalid` failures — never silently coerced.
pub(crate) fn normalized_pair(
    a: &FaceSample,
    b: &FaceSample,
) -> Result<(Embedding, Embedding), VerifyError> {
    if a.embedding.is_empty() || b.embedding.is_empty() {
        return Err(VerifyError::feature_invalid("empty embedding"));
    }
    if a.embedding.len() != b.embedding.len() {
        return Err(VerifyError::feature_invalid(format!(
            "embedding dimension mismatch: {} vs {}",
            a.embedding.len(),
            b.embedding.len()
        )));
    }
    if !a.embedding.is_finite() || !b.embedding.is_finite() {
        return Err(VerifyError::feature_invalid("non-finite embedding component"));
    }
    Ok((a.embedding.l2_normalized(), b.embedding.l2_normalized()))
}

/// Derive the confidence label from the absolute margin between a score
/// and the algorithm's decision boundary.
pub(crate) fn confidence_from_margin(score: f32, boundary: f32) -> Confidence {
    let margin = (score - boundary).abs();
    if margin >= HIGH_CONFIDENCE_MARGIN {
        Confidence::High
    } else if margin >= MEDIUM_CONFIDENCE_MARGIN {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Assemble an [`AlgorithmResult`], guarding the calibrated score and the
/// raw metric against non-finite values.
pub(crate) fn build_result(
    kind: AlgorithmKind,
    score: f32,
    boundary: f32,
    raw_metric: RawMetric,
) -> Result<AlgorithmResult, VerifyError> {
    let score = ensure_finite(score, "algorithm calibration")?.clamp(0.0, 100.0);
    ensure_finite(raw_metric.value(), "raw metric")?;
    Ok(AlgorithmResult {
        kind,
        score,
        matched: score >= boundary,
        confidence: confidence_from_margin(score, boundary),
        raw_metric,
    })
}
