use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::AlgorithmKind;

/// Tolerance when validating that ensemble weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Per-algorithm ensemble weights. Must sum to 1.0.
///
/// ArcFace carries the largest weight as the empirically strongest single
/// algorithm; the other three metric families provide the corroboration
/// that suppresses single-algorithm false accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleWeights {
    pub arcface: f32,
    pub triplet: f32,
    pub cosface: f32,
    pub sphereface: f32,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            arcface: 0.40,
            triplet: 0.20,
            cosface: 0.25,
            sphereface: 0.15,
        }
    }
}

impl EnsembleWeights {
    pub fn get(&self, kind: AlgorithmKind) -> f32 {
        match kind {
            AlgorithmKind::ArcFace => self.arcface,
            AlgorithmKind::Triplet => self.triplet,
            AlgorithmKind::CosFace => self.cosface,
            AlgorithmKind::SphereFace => self.sphereface,
        }
    }

    pub fn sum(&self) -> f32 {
        self.arcface + self.triplet + self.cosface + self.sphereface
    }
}

/// What to do when an input falls below the hard quality floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LowQualityAction {
    /// Evaluate fully and force `passed = false` (the quality gate).
    Gate,
    /// Return a typed `LowQualityInput` failure without evaluating.
    Abort,
}

/// Immutable engine configuration, injected at construction.
///
/// Deserializes from TOML for the daemon and CLI; never stored in
/// module-level globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: EnsembleWeights,
    /// Starting point for the adaptive threshold.
    pub base_threshold: f32,
    /// Lower clamp for the adaptive threshold.
    pub threshold_min: f32,
    /// Upper clamp for the adaptive threshold.
    pub threshold_max: f32,
    /// Hard quality floor; either side below it can never pass.
    pub quality_floor: f32,
    /// Minimum matched votes required to pass, out of 4.
    pub min_votes: u8,
    /// Scales how strongly score disagreement raises the threshold.
    pub variance_sensitivity: f32,
    /// Additive margin applied to the CosFace cosine before rescaling.
    pub cosface_margin: f32,
    pub low_quality_action: LowQualityAction,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            base_threshold: 55.0,
            threshold_min: 40.0,
            threshold_max: 80.0,
            quality_floor: 30.0,
            min_votes: 2,
            variance_sensitivity: 0.5,
            cosface_margin: 0.35,
            low_quality_action: LowQualityAction::Gate,
        }
    }
}

impl EngineConfig {
    /// Check every field before the engine will accept the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, w) in [
            ("weights.arcface", self.weights.arcface),
            ("weights.triplet", self.weights.triplet),
            ("weights.cosface", self.weights.cosface),
            ("weights.sphereface", self.weights.sphereface),
        ] {
            check_range(field, w, 0.0, 1.0)?;
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsSum { sum });
        }

        check_range("threshold_min", self.threshold_min, 0.0, 100.0)?;
        check_range("threshold_max", self.threshold_max, 0.0, 100.0)?;
        if self.threshold_min > self.threshold_max {
            return Err(ConfigError::OutOfRange {
                field: "threshold_min",
                value: self.threshold_min,
                min: 0.0,
                max: self.threshold_max,
            });
        }
        check_range("base_threshold", self.base_threshold, 0.0, 100.0)?;
        check_range("quality_floor", self.quality_floor, 0.0, 100.0)?;
        check_range("min_votes", self.min_votes as f32, 0.0, 4.0)?;
        check_range("variance_sensitivity", self.variance_sensitivity, 0.0, 100.0)?;
        check_range("cosface_margin", self.cosface_margin, 0.0, 0.99)?;

        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
