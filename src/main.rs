use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pet_classifier::{
    config::{Config, TtaConfig},
    dataset::{clean_dataset, CleanupOptions},
    image::Augmentation,
    web::serve,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pet-classifier")]
#[command(about = "Cat vs. dog classifier service with test-time augmentation")]
struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info", env = "PETCLS_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP prediction API
    Serve(ServeArgs),

    /// Remove corrupted images from a dataset directory
    Clean(CleanArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000", env = "PETCLS_BIND")]
    bind: String,

    /// ONNX model path
    #[arg(long, default_value = "model/model.onnx", env = "PETCLS_MODEL_PATH")]
    model_path: PathBuf,

    /// Number of worker threads
    #[arg(long, env = "PETCLS_WORKERS")]
    workers: Option<usize>,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin", env = "PETCLS_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Mean confidence below which the verdict is "unknown"
    #[arg(long, default_value_t = 0.98)]
    confidence_threshold: f32,

    /// Per-class standard deviation above which predictions are unstable
    #[arg(long, default_value_t = 0.15)]
    instability_threshold: f32,

    /// Zoom factor of the centre-crop augmentation
    #[arg(long, default_value_t = 1.2)]
    zoom: f64,

    /// Enable development mode (permissive CORS, longer timeouts)
    #[arg(long)]
    dev: bool,
}

#[derive(Args)]
struct CleanArgs {
    /// Dataset root directory
    #[arg(default_value = "data")]
    data_dir: PathBuf,

    /// Report corrupted files without deleting them
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Command::Serve(args) => run_server(args),
        Command::Clean(args) => run_cleanup(args),
    }
}

fn run_server(args: ServeArgs) -> Result<()> {
    tracing::info!("Starting pet classifier service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model_path.display());

    let tta_config = TtaConfig {
        augmentations: vec![
            Augmentation::identity(),
            Augmentation::flip(),
            Augmentation::zoom(args.zoom),
        ],
        confidence_threshold: args.confidence_threshold,
        instability_threshold: args.instability_threshold,
    };

    let config = Config::new(args.bind, args.model_path, args.workers, args.dev)?
        .with_cors_origins(args.cors_origins)
        .with_tta(tta_config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;
    Ok(())
}

fn run_cleanup(args: CleanArgs) -> Result<()> {
    let options = CleanupOptions {
        dry_run: args.dry_run,
    };

    let report = clean_dataset(&args.data_dir, &options)
        .with_context(|| format!("Failed to clean {}", args.data_dir.display()))?;

    tracing::info!("Total files scanned: {}", report.total_files);
    tracing::info!(
        "Corrupted files {}: {}",
        if options.dry_run { "found" } else { "removed" },
        report.corrupted_files
    );

    Ok(())
}
