//! Explainability metrics.
//!
//! Six auxiliary similarity measures surfaced to operators alongside the
//! decision. Each is normalized to [0, 100] independently and none of
//! them ever influences the pass/fail outcome.
//!
//! The three pixel-based metrics (structural, texture, histogram) use
//! the samples' face crops when both carry one; otherwise they fall back
//! to deterministic embedding-derived analogues so the bundle is always
//! fully populated.

use crate::error::{ensure_finite, VerifyError};
use crate::scorer::normalized_pair;
use crate::types::{FaceRegion, FaceSample, Landmarks, MetricsBundle};

// --- Named constants ---
/// Common resample size for the aligned-crop structural comparison.
const STRUCTURAL_PATCH_SIZE: usize = 32;
/// Orientation bins for the texture descriptor.
const TEXTURE_ORIENTATION_BINS: usize = 8;
/// Bins for the intensity-histogram correlation.
const INTENSITY_BINS: usize = 32;
/// Bins for the embedding-value histogram fallback.
const EMBEDDING_BINS: usize = 16;
/// Windows for the structural embedding fallback.
const STRUCTURAL_WINDOWS: usize = 8;
/// Mean normalized landmark displacement that zeroes the landmark metric.
const LANDMARK_FULL_MISS: f32 = 0.5;

/// Compute the full explainability bundle for a sample pair.
pub fn compute(a: &FaceSample, b: &FaceSample) -> Result<MetricsBundle, VerifyError> {
    let (na, nb) = normalized_pair(a, b)?;

    let distance = na.euclidean_distance(&nb);
    let euclidean = (1.0 - distance / 2.0).clamp(0.0, 1.0) * 100.0;

    let cosine = (na.cosine(&nb) + 1.0) / 2.0 * 100.0;

    let landmarks = landmark_similarity(&a.landmarks, &b.landmarks)?;

    let (structural, texture, histogram) = match (&a.region, &b.region) {
        (Some(ra), Some(rb)) if region_usable(ra) && region_usable(rb) => (
            structural_similarity(ra, rb),
            texture_similarity(ra, rb),
            histogram_similarity(ra, rb),
        ),
        _ => (
            structural_fallback(&na.values, &nb.values),
            texture_fallback(&na.values, &nb.values),
            histogram_fallback(&na.values, &nb.values),
        ),
    };

    let bundle = MetricsBundle {
        euclidean: ensure_finite(euclidean, "euclidean metric")?,
        cosine: ensure_finite(cosine, "cosine metric")?,
        landmarks: ensure_finite(landmarks, "landmark metric")?,
        structural: ensure_finite(structural.clamp(0.0, 100.0), "structural metric")?,
        texture: ensure_finite(texture.clamp(0.0, 100.0), "texture metric")?,
        histogram: ensure_finite(histogram.clamp(0.0, 100.0), "histogram metric")?,
    };
    Ok(bundle)
}

/// A region is only usable for pixel metrics when its buffer actually
/// matches its claimed dimensions.
fn region_usable(region: &FaceRegion) -> bool {
    region.width > 0
        && region.height > 0
        && region.data.len() == (region.width as usize) * (region.height as usize)
}

/// Landmark-geometry correspondence, invariant to translation and scale.
///
/// Both five-point sets are recentred on the eye midpoint and scaled by
/// the inter-ocular distance before comparison.
fn landmark_similarity(a: &Landmarks, b: &Landmarks) -> Result<f32, VerifyError> {
    for (x, y) in a.iter().chain(b.iter()) {
        if !x.is_finite() || !y.is_finite() {
            return Err(VerifyError::feature_invalid("non-finite landmark coordinate"));
        }
    }

    let (Some(norm_a), Some(norm_b)) = (normalize_landmarks(a), normalize_landmarks(b)) else {
        return Ok(0.0);
    };

    let mean_displacement = norm_a
        .iter()
        .zip(norm_b.iter())
        .map(|(p, q)| {
            let dx = p.0 - q.0;
            let dy = p.1 - q.1;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f32>()
        / a.len() as f32;

    Ok((1.0 - (mean_displacement / LANDMARK_FULL_MISS).min(1.0)) * 100.0)
}

/// Recentre on the eye midpoint and scale by inter-ocular distance.
/// Returns None for degenerate geometry (eyes collapsed).
fn normalize_landmarks(lm: &Landmarks) -> Option<Landmarks> {
    let (le, re) = (lm[0], lm[1]);
    let iod = ((re.0 - le.0).powi(2) + (re.1 - le.1).powi(2)).sqrt();
    if iod < 1e-3 {
        return None;
    }
    let mid = ((le.0 + re.0) / 2.0, (le.1 + re.1) / 2.0);
    let mut out = [(0.0f32, 0.0f32); 5];
    for (i, (x, y)) in lm.iter().enumerate() {
        out[i] = ((x - mid.0) / iod, (y - mid.1) / iod);
    }
    Some(out)
}

/// Aligned-crop agreement: both crops resampled to a common patch size,
/// scored by mean absolute pixel difference.
fn structural_similarity(a: &FaceRegion, b: &FaceRegion) -> f32 {
    let pa = resample(a, STRUCTURAL_PATCH_SIZE);
    let pb = resample(b, STRUCTURAL_PATCH_SIZE);
    let mad = pa
        .iter()
        .zip(pb.iter())
        .map(|(&x, &y)| (x as f32 - y as f32).abs())
        .sum::<f32>()
        / pa.len() as f32;
    (1.0 - mad / 255.0) * 100.0
}

/// Bilinear resample of a grayscale crop to `size`×`size`.
fn resample(region: &FaceRegion, size: usize) -> Vec<u8> {
    let w = region.width as usize;
    let h = region.height as usize;
    let mut out = vec![0u8; size * size];
    if w == 0 || h == 0 {
        return out;
    }
    let scale_x = w as f32 / size as f32;
    let scale_y = h as f32 / size as f32;

    for oy in 0..size {
        let src_y = (oy as f32 + 0.5) * scale_y - 0.5;
        let y0 = (src_y.floor() as i32).clamp(0, h as i32 - 1) as usize;
        let y1 = (y0 + 1).min(h - 1);
        let fy = (src_y - y0 as f32).clamp(0.0, 1.0);

        for ox in 0..size {
            let src_x = (ox as f32 + 0.5) * scale_x - 0.5;
            let x0 = (src_x.floor() as i32).clamp(0, w as i32 - 1) as usize;
            let x1 = (x0 + 1).min(w - 1);
            let fx = (src_x - x0 as f32).clamp(0.0, 1.0);

            let tl = region.data[y0 * w + x0] as f32;
            let tr = region.data[y0 * w + x1] as f32;
            let bl = region.data[y1 * w + x0] as f32;
            let br = region.data[y1 * w + x1] as f32;

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            out[oy * size + ox] = val.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Texture-descriptor similarity: magnitude-weighted gradient-orientation
/// histograms compared by intersection.
fn texture_similarity(a: &FaceRegion, b: &FaceRegion) -> f32 {
    let ha = orientation_histogram(a);
    let hb = orientation_histogram(b);
    let intersection: f32 = ha.iter().zip(hb.iter()).map(|(x, y)| x.min(*y)).sum();
    intersection * 100.0
}

fn orientation_histogram(region: &FaceRegion) -> [f32; TEXTURE_ORIENTATION_BINS] {
    let w = region.width as usize;
    let h = region.height as usize;
    let mut hist = [0.0f32; TEXTURE_ORIENTATION_BINS];
    if w < 2 || h < 2 {
        return hist;
    }

    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let p = region.data[y * w + x] as f32;
            let dx = region.data[y * w + x + 1] as f32 - p;
            let dy = region.data[(y + 1) * w + x] as f32 - p;
            let magnitude = (dx * dx + dy * dy).sqrt();
            if magnitude <= 0.0 {
                continue;
            }
            // Map orientation [-π, π] onto the bin range.
            let angle = dy.atan2(dx);
            let normalized = (angle + std::f32::consts::PI) / (2.0 * std::f32::consts::PI);
            let bin = ((normalized * TEXTURE_ORIENTATION_BINS as f32) as usize)
                .min(TEXTURE_ORIENTATION_BINS - 1);
            hist[bin] += magnitude;
        }
    }

    let total: f32 = hist.iter().sum();
    if total > 0.0 {
        for v in hist.iter_mut() {
            *v /= total;
        }
    }
    hist
}

/// Intensity-histogram correlation mapped from [-1, 1] onto [0, 100].
fn histogram_similarity(a: &FaceRegion, b: &FaceRegion) -> f32 {
    let ha = intensity_histogram(&a.data);
    let hb = intensity_histogram(&b.data);
    (pearson(&ha, &hb) + 1.0) / 2.0 * 100.0
}

fn intensity_histogram(data: &[u8]) -> Vec<f32> {
    let mut hist = vec![0.0f32; INTENSITY_BINS];
    if data.is_empty() {
        return hist;
    }
    let bucket = 256 / INTENSITY_BINS;
    for &p in data {
        hist[(p as usize / bucket).min(INTENSITY_BINS - 1)] += 1.0;
    }
    let n = data.len() as f32;
    for v in hist.iter_mut() {
        *v /= n;
    }
    hist
}

/// Pearson correlation; degenerate (zero-variance) inputs compare by
/// equality instead.
fn pearson(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len() as f32;
    let mean_a = a.iter().sum::<f32>() / n;
    let mean_b = b.iter().sum::<f32>() / n;

    let mut cov = 0.0f32;
    let mut var_a = 0.0f32;
    let mut var_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 {
        (cov / denom).clamp(-1.0, 1.0)
    } else if a == b {
        1.0
    } else {
        0.0
    }
}

// --- Embedding-derived fallbacks (no pixel data available) ---

/// Windowed correlation over embedding chunks.
fn structural_fallback(a: &[f32], b: &[f32]) -> f32 {
    let window = (a.len() / STRUCTURAL_WINDOWS).max(1);
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for (ca, cb) in a.chunks(window).zip(b.chunks(window)) {
        sum += chunk_cosine(ca, cb);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (sum / count as f32 + 1.0) / 2.0 * 100.0
}

/// Similarity of first-difference vectors: how alike the two embeddings'
/// local variation patterns are.
fn texture_fallback(a: &[f32], b: &[f32]) -> f32 {
    if a.len() < 2 {
        return (chunk_cosine(a, b) + 1.0) / 2.0 * 100.0;
    }
    let da: Vec<f32> = a.windows(2).map(|w| w[1] - w[0]).collect();
    let db: Vec<f32> = b.windows(2).map(|w| w[1] - w[0]).collect();
    (chunk_cosine(&da, &db) + 1.0) / 2.0 * 100.0
}

/// Correlation of embedding-value histograms over [-1, 1].
fn histogram_fallback(a: &[f32], b: &[f32]) -> f32 {
    let ha = value_histogram(a);
    let hb = value_histogram(b);
    (pearson(&ha, &hb) + 1.0) / 2.0 * 100.0
}

fn value_histogram(values: &[f32]) -> Vec<f32> {
    let mut hist = vec![0.0f32; EMBEDDING_BINS];
    if values.is_empty() {
        return hist;
    }
    for &v in values {
        let normalized = ((v.clamp(-1.0, 1.0) + 1.0) / 2.0) * (EMBEDDING_BINS as f32 - 1e-3);
        hist[(normalized as usize).min(EMBEDDING_BINS - 1)] += 1.0;
    }
    let n = values.len() as f32;
    for v in hist.iter_mut() {
        *v /= n;
    }
    hist
}

fn chunk_cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom > 0.0 { (dot / denom).clamp(-1.0, 1.0) } else { 0.0 }
}
