//! veriface-core — Multi-algorithm face-verification decision engine.
//!
//! Compares a live selfie against a photo extracted from an identity
//! document and produces a calibrated accept/reject decision with an
//! auditable score breakdown. Four independent similarity algorithms
//! (ArcFace, Triplet, CosFace, SphereFace) are merged by a weighted
//! ensemble with voting, variance-based disagreement detection, and a
//! quality-adaptive threshold.
//!
//! The engine consumes pre-extracted [`FaceSample`]s from an upstream
//! feature extractor and emits a pure [`VerificationResult`]; it
//! performs no detection, no I/O, and no persistence.

pub mod arcface;
pub mod config;
pub mod cosface;
pub mod decision;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod quality;
pub mod scorer;
pub mod sphereface;
pub mod threshold;
pub mod triplet;
pub mod types;

pub use arcface::ArcFaceScorer;
pub use config::{EngineConfig, EnsembleWeights, LowQualityAction};
pub use cosface::CosFaceScorer;
pub use decision::{verify, DecisionEngine};
pub use error::{ConfigError, VerifyError};
pub use scorer::AlgorithmScorer;
pub use sphereface::SphereFaceScorer;
pub use triplet::TripletScorer;
pub use types::{
    AlgorithmKind, AlgorithmResult, Confidence, Embedding, EnsembleStats, FaceRegion, FaceSample,
    Landmarks, MetricsBundle, RawMetric, SampleRole, VerificationResult,
};
