use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vitrina_cli::{format_bytes, init_tracing, load_source, resolve_item_id};
use vitrina_core::constants::{ANNOUNCEMENTS_FOLDER, PROPERTIES_FOLDER};
use vitrina_core::{detailed_message, log_error, Config, ErrorMetadata, StorageBackend};
use vitrina_processing::{
    ImageOptimizer, OptimizationSpec, OptimizationStats, ProgressReporter, UploadResult,
    UploadSequencer,
};
use vitrina_storage::create_storage;

#[derive(Parser, Debug)]
#[command(name = "vitrina")]
#[command(about = "Optimize listing images and upload them to object storage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Optimize images into a local directory
    Optimize(OptimizeArgs),
    /// Optimize images and store them under <folder>/<item-id>/
    Upload(UploadArgs),
}

/// Overrides for the IMAGE_* settings
#[derive(Args, Debug)]
struct SpecArgs {
    #[arg(long)]
    max_width: Option<u32>,

    #[arg(long)]
    max_height: Option<u32>,

    /// Lossy quality in (0, 1]
    #[arg(long)]
    quality: Option<f32>,

    /// webp, jpeg, png or avif
    #[arg(long)]
    format: Option<String>,
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    #[command(flatten)]
    spec: SpecArgs,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct UploadArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Logical folder, e.g. "propiedades" or "anuncios"
    #[arg(long)]
    folder: String,

    #[arg(long, required_unless_present = "title", conflicts_with = "title")]
    item_id: Option<String>,

    /// Listing title; its slug becomes the item id
    #[arg(long)]
    title: Option<String>,

    /// Override STORAGE_BACKEND (s3, local or memory)
    #[arg(long)]
    backend: Option<StorageBackend>,

    #[command(flatten)]
    spec: SpecArgs,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Optimize(args) => {
            apply_spec_overrides(&mut config, &args.spec);
            optimize(config, args).await
        }
        Command::Upload(args) => {
            apply_spec_overrides(&mut config, &args.spec);
            if let Some(backend) = args.backend {
                config.storage.backend = Some(backend);
            }
            upload(config, args).await
        }
    }
}

fn apply_spec_overrides(config: &mut Config, spec: &SpecArgs) {
    if let Some(max_width) = spec.max_width {
        config.images.max_width = max_width;
    }
    if let Some(max_height) = spec.max_height {
        config.images.max_height = max_height;
    }
    if let Some(quality) = spec.quality {
        config.images.quality = quality;
    }
    if let Some(ref format) = spec.format {
        config.images.format = format.clone();
    }
}

async fn optimize(config: Config, args: OptimizeArgs) -> Result<()> {
    let spec = OptimizationSpec::from_config(&config).context("Invalid image settings")?;
    let optimizer = ImageOptimizer::from_config(&config);

    tokio::fs::create_dir_all(&args.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        sources.push(load_source(path).await?);
    }

    let optimized = tokio::task::spawn_blocking(move || optimizer.optimize_batch(&sources, &spec))
        .await
        .context("Optimization task panicked")?
        .inspect_err(|e| log_error(e, "Optimization failed"))
        .context("Optimization aborted")?;

    let mut stats: Vec<OptimizationStats> = Vec::with_capacity(optimized.len());
    for (path, image) in args.files.iter().zip(&optimized) {
        let target = args.out_dir.join(&image.file_name);
        tokio::fs::write(&target, &image.data)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;

        if !args.json {
            println!(
                "{} -> {} ({}x{} -> {}x{}, {} -> {}, {}%)",
                path.display(),
                target.display(),
                image.original_width,
                image.original_height,
                image.width,
                image.height,
                format_bytes(image.original_size),
                format_bytes(image.optimized_size),
                image.reduction_percent,
            );
        }
        stats.push(image.stats());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}

async fn upload(config: Config, args: UploadArgs) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let item_id = resolve_item_id(args.item_id.as_deref(), args.title.as_deref())?;

    if ![PROPERTIES_FOLDER, ANNOUNCEMENTS_FOLDER].contains(&args.folder.as_str()) {
        tracing::warn!(folder = %args.folder, "Folder is not one the site reads images from");
    }

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    let sequencer =
        UploadSequencer::from_config(&config, storage).context("Invalid image settings")?;

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        sources.push(load_source(path).await?);
    }

    let (reporter, mut rx) = ProgressReporter::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            eprintln!("[{:>3}%] {}", event.percent, event.message);
        }
    });

    let outcome = sequencer
        .process_batch(sources, &args.folder, &item_id, &reporter)
        .await;

    // Closing the channel lets the printer drain and exit.
    drop(reporter);
    let _ = printer.await;

    let results: Vec<UploadResult> = match outcome {
        Ok(results) => results,
        Err(err) => {
            let file = args
                .files
                .get(err.index)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            tracing::debug!(details = %detailed_message(&err), "Upload failure chain");
            eprintln!("{} ({})", err.client_message(), file);
            if let Some(action) = err.suggested_action() {
                eprintln!("{}", action);
            }
            return Err(anyhow::Error::new(err).context("Upload aborted"));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!(
                "{} ({}x{}, {} -> {}, {}%)",
                result.url,
                result.width,
                result.height,
                format_bytes(result.original_size),
                format_bytes(result.optimized_size),
                result.reduction_percent,
            );
        }
    }

    Ok(())
}
