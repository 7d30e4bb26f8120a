//! CLI command definitions for labelforge.
//!
//! Provides commands for generating releases, inspecting release history,
//! and cleaning up failed release output.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use uuid::Uuid;

use crate::augment::{ChainExpander, PassthroughExecutor};
use crate::export::{FormatChoice, TaskType};
use crate::release::{PathResolver, ReleaseConfig, ReleaseOrchestrator};
use crate::storage::Database;

/// Default database location.
const DEFAULT_DATABASE_URL: &str = "sqlite://labelforge.db";

/// Default root directory for release output.
const DEFAULT_RELEASE_ROOT: &str = "./releases";

/// Dataset release generator for labeled image collections.
#[derive(Parser)]
#[command(name = "labelforge")]
#[command(about = "Generate augmented dataset releases with export artifacts")]
#[command(version)]
#[command(
    long_about = "labelforge turns labeled image datasets plus a versioned transformation catalog into augmented image variants and a packaged annotation export (YOLO, COCO, Pascal VOC, or CSV).\n\nExample usage:\n  labelforge generate --name v1 --project proj-1 --dataset ds-1 --version 2024.1"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Database connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, global = true)]
    pub database_url: String,

    /// Root directory for release output.
    #[arg(long, default_value = DEFAULT_RELEASE_ROOT, global = true)]
    pub release_root: PathBuf,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a release from pending catalog transformations.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// List past releases for a project.
    History(HistoryArgs),

    /// Remove a failed release's output directory.
    Cleanup(CleanupArgs),
}

/// Arguments for `labelforge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Release name.
    #[arg(long)]
    pub name: String,

    /// Project the release belongs to.
    #[arg(long)]
    pub project: String,

    /// Release description.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Dataset to include (repeatable).
    #[arg(long = "dataset", required = true)]
    pub datasets: Vec<String>,

    /// Transformation catalog version to apply.
    #[arg(long)]
    pub version: String,

    /// Export format (auto, yolo_detection, yolo_segmentation, coco, pascal_voc, csv).
    #[arg(long, default_value = "auto")]
    pub format: String,

    /// Task type (object_detection, segmentation, other).
    #[arg(long, default_value = "object_detection")]
    pub task_type: String,

    /// Augmented variants to generate per original image.
    #[arg(long, default_value_t = 4)]
    pub images_per_original: u32,

    /// Encoding for generated images.
    #[arg(long, default_value = "jpg")]
    pub output_encoding: String,

    /// Exclude originals from the final image count.
    #[arg(long)]
    pub skip_original: bool,

    /// Do not bundle source images into the export artifact.
    #[arg(long)]
    pub no_images: bool,

    /// Fail the release when export generation fails.
    #[arg(long)]
    pub strict_export: bool,

    /// Additional base directory for resolving stored image paths (repeatable).
    #[arg(long = "image-base")]
    pub image_bases: Vec<PathBuf>,
}

/// Arguments for `labelforge history`.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Project to list releases for.
    #[arg(long)]
    pub project: String,

    /// Maximum number of releases to show.
    #[arg(long, default_value_t = 20)]
    pub limit: i64,
}

/// Arguments for `labelforge cleanup`.
#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// Release id to clean up.
    #[arg(long)]
    pub release_id: Uuid,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses CLI arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let db = Database::connect(&cli.database_url).await?;
    db.run_migrations().await?;

    match cli.command {
        Commands::Generate(args) => generate(db, cli.release_root, args).await,
        Commands::History(args) => history(db, cli.release_root, args).await,
        Commands::Cleanup(args) => cleanup(db, cli.release_root, args).await,
    }
}

fn build_orchestrator(db: Database, release_root: PathBuf) -> ReleaseOrchestrator {
    ReleaseOrchestrator::new(
        Arc::new(db),
        Arc::new(ChainExpander),
        Arc::new(PassthroughExecutor),
        release_root,
    )
}

async fn generate(db: Database, release_root: PathBuf, args: GenerateArgs) -> anyhow::Result<()> {
    let export_format = FormatChoice::from_str(&args.format)
        .map_err(|e| anyhow::anyhow!("invalid --format: {e}"))?;
    let task_type = TaskType::from_str(&args.task_type)
        .map_err(|e| anyhow::anyhow!("invalid --task-type: {e}"))?;

    let mut config = ReleaseConfig::new(args.name, args.project)
        .with_description(args.description)
        .with_datasets(args.datasets)
        .with_format(export_format)
        .with_task_type(task_type)
        .with_images_per_original(args.images_per_original)
        .with_include_original(!args.skip_original);
    config.output_encoding = args.output_encoding;
    config.include_images = !args.no_images;

    let mut orchestrator =
        build_orchestrator(db, release_root).with_strict_export(args.strict_export);
    if !args.image_bases.is_empty() {
        orchestrator = orchestrator.with_resolver(PathResolver::new(args.image_bases));
    }

    let release_id = orchestrator.generate(config, &args.version).await?;
    if let Some(progress) = orchestrator.progress(release_id) {
        info!(
            %release_id,
            processed = progress.processed_images,
            generated = progress.generated_images,
            "Release finished"
        );
    }
    println!("{release_id}");
    Ok(())
}

async fn history(db: Database, release_root: PathBuf, args: HistoryArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(db, release_root);
    let releases = orchestrator.history(&args.project, args.limit).await?;

    if releases.is_empty() {
        println!("No releases for project {}", args.project);
        return Ok(());
    }
    for release in releases {
        println!(
            "{}  {}  {}  format={}  images={}  output={}",
            release.created_at.format("%Y-%m-%d %H:%M:%S"),
            release.id,
            release.name,
            release.export_format,
            release
                .final_image_count
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            release.output_path.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn cleanup(db: Database, release_root: PathBuf, args: CleanupArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(db, release_root);
    orchestrator.cleanup_failed(args.release_id).await?;
    println!("Cleaned up release {}", args.release_id);
    Ok(())
}
