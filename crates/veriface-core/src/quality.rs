//! Input quality assessment.
//!
//! Scores how usable a face crop is for verification on a 0–100 scale,
//! from sharpness, illumination, face-to-frame size ratio, and pose
//! deviation. Pure function over the crop and its landmarks; no
//! randomness, no side effects.

use crate::error::{ensure_finite, VerifyError};
use crate::types::{FaceRegion, Landmarks};

// --- Component weights (sum to 1.0) ---
const SHARPNESS_WEIGHT: f32 = 0.35;
const ILLUMINATION_WEIGHT: f32 = 0.25;
const SIZE_WEIGHT: f32 = 0.20;
const POSE_WEIGHT: f32 = 0.20;

/// Mean squared gradient of a crisp, well-focused face crop. Anything at
/// or above this earns full sharpness credit.
const SHARPNESS_REFERENCE_ENERGY: f32 = 400.0;

/// Tile grid used for illumination uniformity (same tiling idea as the
/// CLAHE enhancement pass upstream).
const ILLUMINATION_TILES: usize = 4;
const ILLUMINATION_SPREAD_SCALE: f32 = 1.5;
const UNDEREXPOSED_MEAN: f32 = 40.0;
const OVEREXPOSED_MEAN: f32 = 215.0;

/// Faces covering at least this fraction of the frame earn full size credit.
const FULL_SIZE_COVERAGE: f32 = 0.10;

/// A face below either of these is heavily cropped or too small to trust:
/// its quality is capped regardless of sharpness.
const TINY_FACE_MIN_SIDE: u32 = 48;
const TINY_FACE_MIN_COVERAGE: f32 = 0.02;
const TINY_FACE_CAP: f32 = 35.0;

// Pose penalties per unit deviation.
const ROLL_PENALTY_PER_DEGREE: f32 = 2.0;
const YAW_PENALTY_SCALE: f32 = 150.0;
const PITCH_PENALTY_SCALE: f32 = 150.0;
/// Ideal nose position between the eye line and the mouth line, as a
/// fraction of the eye-to-mouth vertical span.
const IDEAL_NOSE_DROP: f32 = 0.55;

/// Assess the usability of one face crop. Returns a score in [0, 100].
///
/// An empty crop means the upstream detector produced nothing to assess
/// and fails with [`VerifyError::NoFaceDetected`]; a crop whose buffer
/// does not match its dimensions is [`VerifyError::FeatureInvalid`].
pub fn assess(region: &FaceRegion, landmarks: &Landmarks) -> Result<f32, VerifyError> {
    if region.data.is_empty() || region.width == 0 || region.height == 0 {
        return Err(VerifyError::NoFaceDetected);
    }
    let expected = (region.width as usize) * (region.height as usize);
    if region.data.len() != expected {
        return Err(VerifyError::feature_invalid(format!(
            "region buffer is {} bytes, dimensions say {expected}",
            region.data.len()
        )));
    }
    if landmarks.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(VerifyError::feature_invalid("non-finite landmark coordinate"));
    }

    let sharpness = sharpness_score(region);
    let illumination = illumination_score(region);
    let size = size_score(region);
    let pose = pose_score(landmarks);

    let mut quality = SHARPNESS_WEIGHT * sharpness
        + ILLUMINATION_WEIGHT * illumination
        + SIZE_WEIGHT * size
        + POSE_WEIGHT * pose;

    if region.width.min(region.height) < TINY_FACE_MIN_SIDE
        || region.frame_coverage() < TINY_FACE_MIN_COVERAGE
    {
        quality = quality.min(TINY_FACE_CAP);
    }

    tracing::trace!(sharpness, illumination, size, pose, quality, "quality components");

    ensure_finite(quality.clamp(0.0, 100.0), "quality assessment")
}

/// Blur estimate from mean squared gradient. Flat crops score 0.
fn sharpness_score(region: &FaceRegion) -> f32 {
    let w = region.width as usize;
    let h = region.height as usize;
    if w < 2 || h < 2 {
        return 0.0;
    }

    let mut energy = 0.0f64;
    let mut count = 0u64;
    for y in 0..h {
        for x in 0..w {
            let p = region.data[y * w + x] as f32;
            if x + 1 < w {
                let dx = region.data[y * w + x + 1] as f32 - p;
                energy += (dx * dx) as f64;
                count += 1;
            }
            if y + 1 < h {
                let dy = region.data[(y + 1) * w + x] as f32 - p;
                energy += (dy * dy) as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        return 0.0;
    }
    let mean_energy = (energy / count as f64) as f32;
    (mean_energy / SHARPNESS_REFERENCE_ENERGY * 100.0).min(100.0)
}

/// Illumination uniformity across a tile grid, scaled down for global
/// under/over-exposure.
fn illumination_score(region: &FaceRegion) -> f32 {
    let w = region.width as usize;
    let h = region.height as usize;
    let tiles = ILLUMINATION_TILES.min(w).min(h);
    if tiles == 0 {
        return 0.0;
    }
    let tile_w = w / tiles;
    let tile_h = h / tiles;

    let mut means = Vec::with_capacity(tiles * tiles);
    for row in 0..tiles {
        for col in 0..tiles {
            let y0 = row * tile_h;
            let x0 = col * tile_w;
            let mut sum = 0u64;
            for y in y0..y0 + tile_h {
                for x in x0..x0 + tile_w {
                    sum += region.data[y * w + x] as u64;
                }
            }
            means.push(sum as f32 / (tile_w * tile_h) as f32);
        }
    }

    let n = means.len() as f32;
    let mean = means.iter().sum::<f32>() / n;
    let variance = means.iter().map(|m| (m - mean).powi(2)).sum::<f32>() / n;
    let uniformity = (100.0 - variance.sqrt() * ILLUMINATION_SPREAD_SCALE).max(0.0);

    let global = region.avg_brightness();
    let exposure = if global < UNDEREXPOSED_MEAN {
        global / UNDEREXPOSED_MEAN
    } else if global > OVEREXPOSED_MEAN {
        ((255.0 - global) / (255.0 - OVEREXPOSED_MEAN)).max(0.0)
    } else {
        1.0
    };

    uniformity * exposure
}

/// Face-to-frame size ratio. Full credit at 10% coverage and above.
fn size_score(region: &FaceRegion) -> f32 {
    (region.frame_coverage() / FULL_SIZE_COVERAGE).min(1.0) * 100.0
}

/// Pose deviation from the five-point landmark geometry: roll from the
/// eye line, yaw from the nose's horizontal offset, pitch from the
/// nose's vertical placement between eyes and mouth.
fn pose_score(landmarks: &Landmarks) -> f32 {
    let [left_eye, right_eye, nose, left_mouth, right_mouth] = *landmarks;

    let eye_dx = right_eye.0 - left_eye.0;
    let eye_dy = right_eye.1 - left_eye.1;
    let iod = (eye_dx * eye_dx + eye_dy * eye_dy).sqrt();
    if iod < 1.0 {
        // Degenerate landmarks: eyes collapsed onto each other.
        return 0.0;
    }

    let roll_degrees = eye_dy.atan2(eye_dx).abs().to_degrees();

    let eye_mid = ((left_eye.0 + right_eye.0) / 2.0, (left_eye.1 + right_eye.1) / 2.0);
    let yaw_ratio = ((nose.0 - eye_mid.0) / iod).abs();

    let mouth_mid = (
        (left_mouth.0 + right_mouth.0) / 2.0,
        (left_mouth.1 + right_mouth.1) / 2.0,
    );
    let vertical_span = mouth_mid.1 - eye_mid.1;
    let pitch_deviation = if vertical_span.abs() < 1.0 {
        1.0
    } else {
        ((nose.1 - eye_mid.1) / vertical_span - IDEAL_NOSE_DROP).abs()
    };

    let penalty = roll_degrees * ROLL_PENALTY_PER_DEGREE
        + yaw_ratio * YAW_PENALTY_SCALE
        + pitch_deviation * PITCH_PENALTY_SCALE;

    (100.0 - penalty).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frontal landmarks matching the InsightFace reference geometry.
    fn frontal_landmarks() -> Landmarks {
        [
            (38.3, 51.7),
            (73.5, 51.5),
            (56.0, 74.0),
            (41.5, 92.4),
            (70.7, 92.2),
        ]
    }

    /// A textured, well-lit 112×112 crop filling half the frame.
    fn good_region() -> FaceRegion {
        let size = 112usize;
        let data: Vec<u8> = (0..size * size)
            .map(|i| {
                let x = i % size;
                let y = i / size;
                // Checker-like texture around mid-gray keeps gradients high
                // without saturating exposure.
                (120 + 40 * (((x / 2) + (y / 2)) % 2)) as u8
            })
            .collect();
        FaceRegion {
            data,
            width: size as u32,
            height: size as u32,
            frame_width: 160,
            frame_height: 160,
        }
    }

    #[test]
    fn test_empty_region_is_no_face() {
        let region = FaceRegion {
            data: vec![],
            width: 0,
            height: 0,
            frame_width: 640,
            frame_height: 480,
        };
        assert_eq!(
            assess(&region, &frontal_landmarks()),
            Err(VerifyError::NoFaceDetected)
        );
    }

    #[test]
    fn test_buffer_dimension_mismatch_rejected() {
        let region = FaceRegion {
            data: vec![0; 10],
            width: 100,
            height: 100,
            frame_width: 640,
            frame_height: 480,
        };
        assert!(matches!(
            assess(&region, &frontal_landmarks()),
            Err(VerifyError::FeatureInvalid { .. })
        ));
    }

    #[test]
    fn test_non_finite_landmark_rejected() {
        let mut lm = frontal_landmarks();
        lm[2].0 = f32::NAN;
        assert!(matches!(
            assess(&good_region(), &lm),
            Err(VerifyError::FeatureInvalid { .. })
        ));
    }

    #[test]
    fn test_score_in_range() {
        let q = assess(&good_region(), &frontal_landmarks()).unwrap();
        assert!((0.0..=100.0).contains(&q), "quality = {q}");
    }

    #[test]
    fn test_good_region_scores_well() {
        let q = assess(&good_region(), &frontal_landmarks()).unwrap();
        assert!(q > 60.0, "expected a usable score for a good crop, got {q}");
    }

    #[test]
    fn test_flat_region_scores_low() {
        let mut region = good_region();
        region.data = vec![128u8; region.data.len()];
        let flat = assess(&region, &frontal_landmarks()).unwrap();
        let sharp = assess(&good_region(), &frontal_landmarks()).unwrap();
        assert!(flat < sharp, "flat {flat} should score below sharp {sharp}");
    }

    #[test]
    fn test_tiny_face_capped() {
        let size = 24usize;
        let data: Vec<u8> = (0..size * size)
            .map(|i| (120 + 40 * ((i / 2) % 2)) as u8)
            .collect();
        let region = FaceRegion {
            data,
            width: size as u32,
            height: size as u32,
            frame_width: 640,
            frame_height: 480,
        };
        let q = assess(&region, &frontal_landmarks()).unwrap();
        assert!(q < 40.0, "tiny face must cap below 40, got {q}");
    }

    #[test]
    fn test_dark_region_scores_below_lit() {
        let mut region = good_region();
        region.data = region.data.iter().map(|&p| p / 8).collect();
        let dark = assess(&region, &frontal_landmarks()).unwrap();
        let lit = assess(&good_region(), &frontal_landmarks()).unwrap();
        assert!(dark < lit, "dark {dark} should score below lit {lit}");
    }

    #[test]
    fn test_rolled_head_scores_below_frontal() {
        // 20° roll: right eye much lower than left.
        let rolled: Landmarks = [
            (38.3, 45.0),
            (73.5, 57.8),
            (56.0, 74.0),
            (41.5, 92.4),
            (70.7, 92.2),
        ];
        let region = good_region();
        let frontal = assess(&region, &frontal_landmarks()).unwrap();
        let tilted = assess(&region, &rolled).unwrap();
        assert!(tilted < frontal);
    }

    #[test]
    fn test_deterministic() {
        let region = good_region();
        let lm = frontal_landmarks();
        assert_eq!(assess(&region, &lm), assess(&region, &lm));
    }
}
