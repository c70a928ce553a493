use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use veriface_core::{quality, DecisionEngine, EngineConfig, FaceRegion, FaceSample, Landmarks};

const BUS_NAME: &str = "org.veriface.Engine1";
const OBJECT_PATH: &str = "/org/veriface/Engine1";

#[derive(Parser)]
#[command(name = "veriface", about = "Veriface face-verification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a selfie sample against a document sample
    Verify {
        /// Selfie FaceSample JSON file
        #[arg(short, long)]
        selfie: PathBuf,
        /// Document FaceSample JSON file
        #[arg(short, long)]
        document: PathBuf,
        /// Engine configuration TOML file (defaults apply if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Pretty-print the result JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Assess the quality of a face crop image
    Quality {
        /// Face crop image (any format the image crate reads; converted
        /// to grayscale)
        #[arg(short, long)]
        image: PathBuf,
        /// Five-point landmarks JSON file: [[x,y] × 5]
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Source frame width (defaults to the image width)
        #[arg(long)]
        frame_width: Option<u32>,
        /// Source frame height (defaults to the image height)
        #[arg(long)]
        frame_height: Option<u32>,
    },
    /// Show daemon status
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            2
        }
    };
    std::process::exit(code);
}

async fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Verify {
            selfie,
            document,
            config,
            pretty,
        } => {
            let engine_config = load_config(config.as_deref())?;
            let engine = DecisionEngine::new(engine_config)
                .map_err(|e| anyhow::anyhow!("engine configuration rejected: {e}"))?;

            let selfie = load_sample(&selfie)?;
            let document = load_sample(&document)?;

            let result = engine.verify(&selfie, &document)?;
            tracing::info!(
                passed = result.passed,
                score = result.score,
                required = result.required_score,
                "verification complete"
            );

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");

            Ok(if result.passed { 0 } else { 1 })
        }
        Commands::Quality {
            image,
            landmarks,
            frame_width,
            frame_height,
        } => {
            let img = image::open(&image)
                .with_context(|| format!("cannot open image {}", image.display()))?
                .to_luma8();
            let (width, height) = img.dimensions();
            let region = FaceRegion {
                data: img.into_raw(),
                width,
                height,
                frame_width: frame_width.unwrap_or(width),
                frame_height: frame_height.unwrap_or(height),
            };

            let raw = std::fs::read_to_string(&landmarks)
                .with_context(|| format!("cannot read landmarks {}", landmarks.display()))?;
            let landmarks: Landmarks =
                serde_json::from_str(&raw).context("landmarks must be [[x,y] × 5]")?;

            let score = quality::assess(&region, &landmarks)?;
            println!("{score:.1}");
            Ok(0)
        }
        Commands::Status => {
            let connection = zbus::Connection::session()
                .await
                .context("connecting to session bus")?;
            let reply = connection
                .call_method(Some(BUS_NAME), OBJECT_PATH, Some(BUS_NAME), "Status", &())
                .await
                .context("is verifaced running?")?;
            let status: String = reply.body().deserialize()?;
            println!("{status}");
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_sample(path: &Path) -> Result<FaceSample> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read sample {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid FaceSample in {}", path.display()))
}
