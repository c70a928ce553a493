use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Face embedding vector (typically 512-dimensional, produced by an
/// external extraction model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// L2-normalized copy. A zero vector is returned unchanged.
    pub fn l2_normalized(&self) -> Embedding {
        let norm: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let values = if norm > 0.0 {
            self.values.iter().map(|x| x / norm).collect()
        } else {
            self.values.clone()
        };
        Embedding {
            values,
            model_version: self.model_version.clone(),
        }
    }

    pub fn dot(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Cosine similarity in [-1, 1]. Always processes all dimensions.
    pub fn cosine(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { (dot / denom).clamp(-1.0, 1.0) } else { 0.0 }
    }

    /// Euclidean distance between the two vectors.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Angular separation on the unit hypersphere, in degrees [0, 180].
    pub fn angle_degrees(&self, other: &Embedding) -> f32 {
        self.cosine(other).acos().to_degrees()
    }
}

/// Grayscale face crop with the dimensions of the frame it was cut from.
///
/// Raw luma buffer, row-major, `width * height` bytes. The source-frame
/// dimensions are retained for the face-to-frame size ratio check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRegion {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl FaceRegion {
    /// Average pixel brightness (0.0–255.0).
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Fraction of the source frame covered by this crop, in [0, 1].
    pub fn frame_coverage(&self) -> f32 {
        let frame_area = (self.frame_width as f32) * (self.frame_height as f32);
        if frame_area <= 0.0 {
            return 0.0;
        }
        ((self.width as f32) * (self.height as f32) / frame_area).clamp(0.0, 1.0)
    }
}

/// Which side of the comparison a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleRole {
    Selfie,
    Document,
}

impl std::fmt::Display for SampleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleRole::Selfie => write!(f, "selfie"),
            SampleRole::Document => write!(f, "document"),
        }
    }
}

/// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth,
/// right_mouth] (InsightFace convention).
pub type Landmarks = [(f32, f32); 5];

/// One pre-extracted face, scoped to a single verification request.
///
/// Produced by the external feature extractor; immutable once built.
/// `region` is optional pixel data feeding only quality assessment and
/// the explainability metrics — never the match decision itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceSample {
    pub embedding: Embedding,
    pub landmarks: Landmarks,
    pub quality_score: f32,
    pub role: SampleRole,
    #[serde(default)]
    pub region: Option<FaceRegion>,
}

impl FaceSample {
    /// Build a sample, clamping the quality score to [0, 100].
    pub fn new(
        role: SampleRole,
        embedding: Embedding,
        landmarks: Landmarks,
        quality_score: f32,
    ) -> Self {
        Self {
            embedding,
            landmarks,
            quality_score: quality_score.clamp(0.0, 100.0),
            role,
            region: None,
        }
    }

    pub fn with_region(mut self, region: FaceRegion) -> Self {
        self.region = Some(region);
        self
    }
}

/// The four scoring algorithm families in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    ArcFace,
    Triplet,
    CosFace,
    SphereFace,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::ArcFace,
        AlgorithmKind::Triplet,
        AlgorithmKind::CosFace,
        AlgorithmKind::SphereFace,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmKind::ArcFace => "arcface",
            AlgorithmKind::Triplet => "triplet",
            AlgorithmKind::CosFace => "cosface",
            AlgorithmKind::SphereFace => "sphereface",
        }
    }
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The native metric an algorithm computed before calibration.
///
/// Exactly one variant per algorithm kind — angular algorithms carry
/// degrees, Triplet carries a distance, CosFace a cosine. Never an
/// ambiguous set of optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawMetric {
    AngleDegrees(f32),
    EuclideanDistance(f32),
    CosineValue(f32),
}

impl RawMetric {
    pub fn value(&self) -> f32 {
        match self {
            RawMetric::AngleDegrees(v)
            | RawMetric::EuclideanDistance(v)
            | RawMetric::CosineValue(v) => *v,
        }
    }
}

/// Qualitative strength indicator, derived from score margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// One algorithm's verdict on a sample pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub kind: AlgorithmKind,
    /// Calibrated score in [0, 100].
    pub score: f32,
    /// This algorithm's binary vote.
    pub matched: bool,
    pub confidence: Confidence,
    pub raw_metric: RawMetric,
}

/// Operator-facing comparison metrics, each in [0, 100].
///
/// Purely explanatory — none of these feeds the pass/fail decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub euclidean: f32,
    pub cosine: f32,
    pub landmarks: f32,
    pub structural: f32,
    pub texture: f32,
    pub histogram: f32,
}

impl MetricsBundle {
    pub fn values(&self) -> [(&'static str, f32); 6] {
        [
            ("euclidean", self.euclidean),
            ("cosine", self.cosine),
            ("landmarks", self.landmarks),
            ("structural", self.structural),
            ("texture", self.texture),
            ("histogram", self.histogram),
        ]
    }
}

/// Aggregate signals from the four-algorithm ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleStats {
    /// Weighted combination of the four calibrated scores, in [0, 100].
    pub weighted_score: f32,
    /// Count of algorithms that voted matched, in [0, 4].
    pub votes: u8,
    /// Population variance of the four unweighted scores (disagreement
    /// signal only).
    pub variance: f32,
    /// The minimum passing score computed for this request, within the
    /// configured bounds (default [40, 80]).
    pub adaptive_threshold: f32,
    /// Size of the majority voting bloc, in [2, 4].
    pub agreement_count: u8,
}

/// The immutable outcome of one verification request.
///
/// `score` is the canonical decision score and always equals
/// `ensemble_stats.weighted_score`; `required_score` always equals
/// `ensemble_stats.adaptive_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub score: f32,
    pub confidence: Confidence,
    pub required_score: f32,
    pub metrics: MetricsBundle,
    pub algorithms: BTreeMap<AlgorithmKind, AlgorithmResult>,
    pub ensemble_stats: EnsembleStats,
    pub selfie_quality: f32,
    pub document_quality: f32,
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (score: {:.2}, required: {:.2}, votes: {}/4, confidence: {})",
            if self.passed { "PASSED" } else { "REJECTED" },
            self.score,
            self.required_score,
            self.ensemble_stats.votes,
            self.confidence,
        )
    }
}
