use std::path::PathBuf;

use veriface_core::{EngineConfig, LowQualityAction};

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Optional TOML file with the full engine configuration.
    pub engine_config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `VERIFACE_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            engine_config_path: std::env::var("VERIFACE_CONFIG").map(PathBuf::from).ok(),
        }
    }

    /// Resolve the engine configuration: defaults, then the TOML file if
    /// one is given, then scalar `VERIFACE_*` overrides on top.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.engine_config_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("cannot read engine config {}: {e}", path.display())
                })?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("invalid engine config {}: {e}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        config.base_threshold = env_f32("VERIFACE_BASE_THRESHOLD", config.base_threshold);
        config.quality_floor = env_f32("VERIFACE_QUALITY_FLOOR", config.quality_floor);
        config.min_votes = env_u8("VERIFACE_MIN_VOTES", config.min_votes);
        config.variance_sensitivity =
            env_f32("VERIFACE_VARIANCE_SENSITIVITY", config.variance_sensitivity);
        config.cosface_margin = env_f32("VERIFACE_COSFACE_MARGIN", config.cosface_margin);
        if let Ok(action) = std::env::var("VERIFACE_LOW_QUALITY_ACTION") {
            config.low_quality_action = parse_low_quality_action(&action)
                .ok_or_else(|| anyhow::anyhow!("VERIFACE_LOW_QUALITY_ACTION: unknown value {action:?}"))?;
        }

        Ok(config)
    }
}

fn parse_low_quality_action(value: &str) -> Option<LowQualityAction> {
    match value.to_ascii_lowercase().as_str() {
        "gate" => Some(LowQualityAction::Gate),
        "abort" => Some(LowQualityAction::Abort),
        _ => None,
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u8(key: &str, default: u8) -> u8 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
