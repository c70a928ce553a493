use thiserror::Error;

use crate::types::SampleRole;

/// Typed failures from the verification engine.
///
/// "Could not evaluate" is always distinguishable from "evaluated and
/// rejected": a rejection is a complete [`crate::VerificationResult`]
/// with `passed == false`, never one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("no face detected in the input region")]
    NoFaceDetected,

    #[error("invalid face features: {reason}")]
    FeatureInvalid { reason: String },

    #[error("{role} quality {score:.1} is below the hard floor {floor:.1}")]
    LowQualityInput {
        role: SampleRole,
        score: f32,
        floor: f32,
    },

    #[error("non-finite value produced during {stage}")]
    InternalComputationError { stage: &'static str },
}

impl VerifyError {
    pub fn feature_invalid(reason: impl Into<String>) -> Self {
        VerifyError::FeatureInvalid {
            reason: reason.into(),
        }
    }
}

/// Rejected engine configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("ensemble weights must sum to 1.0, got {sum:.4}")]
    WeightsSum { sum: f32 },

    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    #[error("{field} = {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Guard a computed value against NaN/Inf leaking into a result.
pub(crate) fn ensure_finite(value: f32, stage: &'static str) -> Result<f32, VerifyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VerifyError::InternalComputationError { stage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite_passes_numbers() {
        assert_eq!(ensure_finite(42.5, "test").unwrap(), 42.5);
        assert_eq!(ensure_finite(0.0, "test").unwrap(), 0.0);
    }

    #[test]
    fn test_ensure_finite_rejects_nan_and_inf() {
        assert!(matches!(
            ensure_finite(f32::NAN, "ensemble"),
            Err(VerifyError::InternalComputationError { stage: "ensemble" })
        ));
        assert!(ensure_finite(f32::INFINITY, "threshold").is_err());
    }

    #[test]
    fn test_error_messages() {
        let e = VerifyError::LowQualityInput {
            role: SampleRole::Document,
            score: 25.0,
            floor: 30.0,
        };
        assert_eq!(e.to_string(), "document quality 25.0 is below the hard floor 30.0");
    }
}
