//! Final decision assembly.
//!
//! Applies the adaptive threshold plus the quality and vote gates to the
//! ensemble output and emits the immutable [`VerificationResult`]. The
//! gates are independent of the raw score so one unusually strong
//! algorithm can never override weak corroboration or unusable input.

use std::collections::BTreeMap;

use crate::arcface::ArcFaceScorer;
use crate::config::{EngineConfig, LowQualityAction};
use crate::cosface::CosFaceScorer;
use crate::ensemble;
use crate::error::{ConfigError, VerifyError};
use crate::metrics;
use crate::scorer::{normalized_pair, AlgorithmScorer};
use crate::sphereface::SphereFaceScorer;
use crate::threshold;
use crate::triplet::TripletScorer;
use crate::types::{
    AlgorithmResult, Confidence, EnsembleStats, FaceSample, VerificationResult,
};

/// Score margin over the threshold for a high-confidence pass.
const HIGH_CONFIDENCE_MARGIN: f32 = 15.0;
const MEDIUM_CONFIDENCE_MARGIN: f32 = 5.0;

/// The verification decision engine.
///
/// Pure, stateless, and synchronous: holds only immutable configuration
/// and is safe to share across threads and invoke concurrently.
pub struct DecisionEngine {
    config: EngineConfig,
    scorers: Vec<Box<dyn AlgorithmScorer>>,
}

impl DecisionEngine {
    /// Build an engine, validating the configuration first.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorers: Vec<Box<dyn AlgorithmScorer>> = vec![
            Box::new(ArcFaceScorer),
            Box::new(TripletScorer),
            Box::new(CosFaceScorer::new(config.cosface_margin)),
            Box::new(SphereFaceScorer),
        ];
        Ok(Self { config, scorers })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compare a selfie against a document photo and decide.
    ///
    /// Either returns a complete, internally consistent result or a
    /// typed failure — never a partial object, and never a rejection
    /// with fabricated numbers standing in for "could not evaluate".
    pub fn verify(
        &self,
        selfie: &FaceSample,
        document: &FaceSample,
    ) -> Result<VerificationResult, VerifyError> {
        // Fail on defective features before any scoring work.
        normalized_pair(selfie, document)?;

        let selfie_quality = checked_quality(selfie)?;
        let document_quality = checked_quality(document)?;

        if self.config.low_quality_action == LowQualityAction::Abort {
            for (role, score) in [
                (selfie.role, selfie_quality),
                (document.role, document_quality),
            ] {
                if score < self.config.quality_floor {
                    return Err(VerifyError::LowQualityInput {
                        role,
                        score,
                        floor: self.config.quality_floor,
                    });
                }
            }
        }

        let mut algorithms = BTreeMap::new();
        for scorer in &self.scorers {
            let result = scorer.score(selfie, document)?;
            tracing::debug!(
                algorithm = %result.kind,
                score = result.score,
                matched = result.matched,
                raw_metric = result.raw_metric.value(),
                "algorithm scored"
            );
            algorithms.insert(result.kind, result);
        }

        let results: Vec<AlgorithmResult> = algorithms.values().cloned().collect();
        let combined = ensemble::combine(&results, &self.config.weights)?;

        let metrics = metrics::compute(selfie, document)?;

        let required_score = threshold::adaptive_threshold(
            selfie_quality,
            document_quality,
            combined.votes,
            combined.variance,
            &self.config,
        )?;

        let passed = decide(
            combined.weighted_score,
            required_score,
            selfie_quality,
            document_quality,
            combined.votes,
            &self.config,
        );
        let confidence = decision_confidence(
            passed,
            combined.weighted_score,
            required_score,
            combined.votes,
        );

        let result = VerificationResult {
            passed,
            score: combined.weighted_score,
            confidence,
            required_score,
            metrics,
            algorithms,
            ensemble_stats: EnsembleStats {
                weighted_score: combined.weighted_score,
                votes: combined.votes,
                variance: combined.variance,
                adaptive_threshold: required_score,
                agreement_count: combined.agreement_count,
            },
            selfie_quality,
            document_quality,
        };

        tracing::debug!(
            passed = result.passed,
            score = result.score,
            required = result.required_score,
            votes = result.ensemble_stats.votes,
            variance = result.ensemble_stats.variance,
            confidence = %result.confidence,
            "verification decided"
        );

        Ok(result)
    }
}

/// One-shot convenience: build an engine for `config` and run a single
/// verification. A rejected configuration is reported as `FeatureInvalid`.
pub fn verify(
    selfie: &FaceSample,
    document: &FaceSample,
    config: &EngineConfig,
) -> Result<VerificationResult, VerifyError> {
    let engine = DecisionEngine::new(config.clone())
        .map_err(|e| VerifyError::feature_invalid(format!("configuration rejected: {e}")))?;
    engine.verify(selfie, document)
}

fn checked_quality(sample: &FaceSample) -> Result<f32, VerifyError> {
    if !sample.quality_score.is_finite() {
        return Err(VerifyError::feature_invalid(format!(
            "{} quality score is not finite",
            sample.role
        )));
    }
    Ok(sample.quality_score.clamp(0.0, 100.0))
}

/// The pass gate. The score comparison is inclusive: a score exactly at
/// the required threshold passes.
fn decide(
    score: f32,
    required: f32,
    selfie_quality: f32,
    document_quality: f32,
    votes: u8,
    config: &EngineConfig,
) -> bool {
    score >= required
        && selfie_quality >= config.quality_floor
        && document_quality >= config.quality_floor
        && votes >= config.min_votes
}

fn decision_confidence(passed: bool, score: f32, required: f32, votes: u8) -> Confidence {
    if !passed {
        return Confidence::Low;
    }
    let margin = score - required;
    if votes == 4 && margin >= HIGH_CONFIDENCE_MARGIN {
        Confidence::High
    } else if votes >= 3 || margin >= MEDIUM_CONFIDENCE_MARGIN {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
