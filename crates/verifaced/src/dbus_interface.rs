use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use zbus::interface;

use veriface_core::{
    quality, DecisionEngine, FaceRegion, FaceSample, Landmarks, SampleRole, VerificationResult,
    VerifyError,
};

/// Audit envelope returned for every verification.
///
/// The engine result itself stays pure; the daemon stamps each request
/// so external storage collaborators can persist a traceable record.
#[derive(Debug, Serialize)]
pub struct Evaluation {
    pub request_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub result: VerificationResult,
}

/// D-Bus interface for the Veriface decision daemon.
///
/// Bus name: org.veriface.Engine1
/// Object path: /org/veriface/Engine1
pub struct EngineService {
    engine: DecisionEngine,
}

impl EngineService {
    pub fn new(engine: DecisionEngine) -> Self {
        Self { engine }
    }
}

#[interface(name = "org.veriface.Engine1")]
impl EngineService {
    /// Compare a selfie sample against a document sample.
    ///
    /// Both arguments are `FaceSample` JSON. Returns an `Evaluation`
    /// envelope as JSON. Input defects map to `InvalidArgs`, internal
    /// numeric failures to `Failed` — a rejection is NOT an error.
    async fn verify(&self, selfie_json: &str, document_json: &str) -> zbus::fdo::Result<String> {
        let selfie = parse_sample(selfie_json, "selfie")?;
        let document = parse_sample(document_json, "document")?;

        if selfie.role != SampleRole::Selfie || document.role != SampleRole::Document {
            tracing::warn!(
                selfie_role = %selfie.role,
                document_role = %document.role,
                "sample roles do not match argument order"
            );
        }

        let result = self.engine.verify(&selfie, &document).map_err(to_fdo)?;

        tracing::info!(
            passed = result.passed,
            score = result.score,
            required = result.required_score,
            votes = result.ensemble_stats.votes,
            confidence = %result.confidence,
            "verify decided"
        );

        let evaluation = Evaluation {
            request_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            result,
        };
        serde_json::to_string(&evaluation)
            .map_err(|e| zbus::fdo::Error::Failed(format!("encoding evaluation: {e}")))
    }

    /// Assess the usability of one face crop (`FaceRegion` JSON plus a
    /// five-point landmarks JSON array). Returns the 0–100 score.
    async fn assess_quality(
        &self,
        region_json: &str,
        landmarks_json: &str,
    ) -> zbus::fdo::Result<f64> {
        let region: FaceRegion = serde_json::from_str(region_json)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("region: {e}")))?;
        let landmarks: Landmarks = serde_json::from_str(landmarks_json)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("landmarks: {e}")))?;

        let score = quality::assess(&region, &landmarks).map_err(to_fdo)?;
        tracing::info!(score, "quality assessed");
        Ok(score as f64)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let config = self.engine.config();
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "base_threshold": config.base_threshold,
            "quality_floor": config.quality_floor,
            "min_votes": config.min_votes,
            "weights": {
                "arcface": config.weights.arcface,
                "triplet": config.weights.triplet,
                "cosface": config.weights.cosface,
                "sphereface": config.weights.sphereface,
            },
        })
        .to_string())
    }
}

fn parse_sample(json: &str, which: &str) -> zbus::fdo::Result<FaceSample> {
    serde_json::from_str(json)
        .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("{which} sample: {e}")))
}

/// Map engine failures onto D-Bus errors, keeping "could not evaluate"
/// distinguishable from an evaluated rejection.
fn to_fdo(err: VerifyError) -> zbus::fdo::Error {
    match err {
        VerifyError::NoFaceDetected
        | VerifyError::FeatureInvalid { .. }
        | VerifyError::LowQualityInput { .. } => zbus::fdo::Error::InvalidArgs(err.to_string()),
        VerifyError::InternalComputationError { .. } => zbus::fdo::Error::Failed(err.to_string()),
    }
}
