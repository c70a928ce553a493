//! Adaptive threshold policy.
//!
//! Computes the minimum passing score for one specific request from
//! quality and agreement signals: an ambiguous match on poor input or
//! with disagreeing algorithms must clear a higher bar, while full
//! consensus on clean input earns a small discount. Pure and
//! deterministic so it is independently testable.

use crate::config::EngineConfig;
use crate::error::{ensure_finite, VerifyError};

// --- Named constants ---
/// Mean quality below this starts raising the threshold.
const LOW_QUALITY_PIVOT: f32 = 50.0;
/// Threshold points added per quality point below the pivot.
const LOW_QUALITY_RAISE_RATE: f32 = 0.3;
/// Mean quality required (with full consensus) for the discount.
const CONSENSUS_QUALITY_PIVOT: f32 = 75.0;
const CONSENSUS_DISCOUNT: f32 = 5.0;
/// Score variance is divided by this before the sensitivity factor.
const VARIANCE_NORMALIZER: f32 = 100.0;
const FULL_CONSENSUS_VOTES: u8 = 4;

/// Compute the adaptive threshold for one request.
///
/// Clamped to the configured bounds (default [40, 80]).
pub fn adaptive_threshold(
    selfie_quality: f32,
    document_quality: f32,
    votes: u8,
    variance: f32,
    config: &EngineConfig,
) -> Result<f32, VerifyError> {
    let mean_quality = (selfie_quality + document_quality) / 2.0;
    let mut threshold = config.base_threshold;

    if mean_quality < LOW_QUALITY_PIVOT {
        threshold += (LOW_QUALITY_PIVOT - mean_quality) * LOW_QUALITY_RAISE_RATE;
    }

    threshold += config.variance_sensitivity * variance / VARIANCE_NORMALIZER;

    if mean_quality >= CONSENSUS_QUALITY_PIVOT && votes == FULL_CONSENSUS_VOTES {
        threshold -= CONSENSUS_DISCOUNT;
    }

    let threshold = ensure_finite(threshold, "adaptive threshold")?;
    Ok(threshold.clamp(config.threshold_min, config.threshold_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_neutral_inputs_return_base() {
        let t = adaptive_threshold(60.0, 60.0, 3, 0.0, &config()).unwrap();
        assert_eq!(t, 55.0);
    }

    #[test]
    fn test_low_quality_raises() {
        let base = adaptive_threshold(60.0, 60.0, 3, 0.0, &config()).unwrap();
        let raised = adaptive_threshold(30.0, 30.0, 3, 0.0, &config()).unwrap();
        assert!(raised > base);
        // (50 − 30) · 0.3 = 6 points
        assert!((raised - 61.0).abs() < 1e-3);
    }

    #[test]
    fn test_variance_raises() {
        let calm = adaptive_threshold(90.0, 90.0, 2, 0.0, &config()).unwrap();
        let noisy = adaptive_threshold(90.0, 90.0, 2, 900.0, &config()).unwrap();
        assert!(noisy > calm);
        assert!((noisy - calm - 4.5).abs() < 1e-3);
    }

    #[test]
    fn test_split_vote_with_disagreement_exceeds_base() {
        // Two matched, two not, elevated variance: threshold must rise
        // above the base even on clean input.
        let t = adaptive_threshold(90.0, 90.0, 2, 500.0, &config()).unwrap();
        assert!(t > 55.0);
    }

    #[test]
    fn test_full_consensus_on_clean_input_discounted() {
        let t = adaptive_threshold(90.0, 90.0, 4, 0.0, &config()).unwrap();
        assert_eq!(t, 50.0);
    }

    #[test]
    fn test_no_discount_without_full_consensus() {
        let t = adaptive_threshold(90.0, 90.0, 3, 0.0, &config()).unwrap();
        assert_eq!(t, 55.0);
    }

    #[test]
    fn test_no_discount_on_poor_quality() {
        let t = adaptive_threshold(55.0, 55.0, 4, 0.0, &config()).unwrap();
        assert_eq!(t, 55.0);
    }

    #[test]
    fn test_clamped_to_upper_bound() {
        let t = adaptive_threshold(0.0, 0.0, 0, 2500.0, &config()).unwrap();
        assert_eq!(t, 80.0);
    }

    #[test]
    fn test_clamped_to_lower_bound() {
        let narrow = EngineConfig {
            base_threshold: 42.0,
            ..EngineConfig::default()
        };
        let t = adaptive_threshold(95.0, 95.0, 4, 0.0, &narrow).unwrap();
        assert_eq!(t, 40.0);
    }

    #[test]
    fn test_always_within_bounds() {
        let cfg = config();
        for sq in [0.0, 25.0, 50.0, 75.0, 100.0] {
            for dq in [0.0, 50.0, 100.0] {
                for votes in 0..=4u8 {
                    for variance in [0.0, 100.0, 900.0, 2500.0] {
                        let t = adaptive_threshold(sq, dq, votes, variance, &cfg).unwrap();
                        assert!((40.0..=80.0).contains(&t), "t = {t}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_sensitivity() {
        let sensitive = EngineConfig {
            variance_sensitivity: 2.0,
            ..EngineConfig::default()
        };
        let t_default = adaptive_threshold(90.0, 90.0, 2, 400.0, &config()).unwrap();
        let t_sensitive = adaptive_threshold(90.0, 90.0, 2, 400.0, &sensitive).unwrap();
        assert!(t_sensitive > t_default);
    }

    #[test]
    fn test_deterministic() {
        let cfg = config();
        assert_eq!(
            adaptive_threshold(72.5, 61.25, 3, 123.4, &cfg),
            adaptive_threshold(72.5, 61.25, 3, 123.4, &cfg)
        );
    }
}
