use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use vidpress_cli::IngestReport;
use vidpress_core::models::{UploadAsset, VideoRecord};
use vidpress_core::Config;
use vidpress_infra::{init_telemetry, shutdown_telemetry};
use vidpress_processing::{InMemoryVideoRepository, IngestService, PipelineConfig, VideoPipeline};
use vidpress_storage::create_storage;

#[derive(Parser, Debug)]
#[command(name = "ingest_video")]
#[command(about = "Normalize, classify and publish a single video file")]
struct Args {
    /// Video file to ingest
    #[arg(long, value_name = "PATH")]
    file: PathBuf,

    /// Declared media type of the upload
    #[arg(long, default_value = "video/mp4")]
    content_type: String,

    /// Owner of the video record (random when omitted)
    #[arg(long, value_name = "UUID")]
    owner: Option<Uuid>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_telemetry(config.log_format(), config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let pipeline = VideoPipeline::new(PipelineConfig::from_config(&config), storage)
        .context("Failed to initialize video pipeline")?;

    let owner_id = args.owner.unwrap_or_else(Uuid::new_v4);
    let title = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    let record = VideoRecord::new(owner_id, title);
    let video_id = record.id;

    let repository = InMemoryVideoRepository::new();
    repository.insert(record).await;

    let file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let declared_size = file
        .metadata()
        .await
        .with_context(|| format!("Failed to stat {}", args.file.display()))?
        .len();
    let asset = UploadAsset::from_reader(Box::pin(file), declared_size, args.content_type);

    tracing::info!(
        video_id = %video_id,
        file = %args.file.display(),
        size_bytes = declared_size,
        "Starting ingest"
    );

    let service = IngestService::new(Arc::new(pipeline), Arc::new(repository));
    let report = match service.ingest(video_id, owner_id, asset).await {
        Ok(stored) => IngestReport::published(&stored),
        Err(e) => IngestReport::failed(video_id, &e),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render_text());
    }

    shutdown_telemetry().await;

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
