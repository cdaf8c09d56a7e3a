//! labelscan: extract image labels with the Cloud Vision API.
//!
//! Scans a folder for images, extracts up to ten labels per image, writes
//! the results as CSV and logs a label frequency histogram built from the
//! written file.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use labelscan::config::{Config, Secrets};
use labelscan::histogram::{HistogramOptions, build_histogram_with};
use labelscan::{DispatcherBuilder, LabelScanError, VisionClient, dataset, dispatch, results};

/// Extract semantic labels from a folder of images.
#[derive(Parser)]
#[command(name = "labelscan")]
#[command(version = labelscan::PKG_VERSION)]
#[command(about = "Extract image labels with the Cloud Vision API")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vision API key (overrides secrets file and VISION_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Folder where images are located.
    #[arg(short, long)]
    folder: PathBuf,

    /// File to store image labels.
    #[arg(short, long)]
    results: Option<PathBuf>,

    /// Skip the label analysis of the results file.
    #[arg(long)]
    no_graph: bool,

    /// Number of concurrent extractions.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Ignore images without labels in the analysis.
    #[arg(long)]
    skip_empty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.dispatch.workers = workers;
    }
    if let Some(path) = args.results {
        config.output.results = path;
    }
    if args.no_graph {
        config.output.graph = false;
    }
    if args.skip_empty {
        config.output.skip_empty_labels = true;
    }

    let api_key = match args.api_key {
        Some(key) => key,
        None => Secrets::load()?.api_key().ok_or_else(|| {
            LabelScanError::Configuration(
                "no Vision API key: pass --api-key, set VISION_API_KEY or add secrets.toml"
                    .to_string(),
            )
        })?,
    };

    info!(
        version = labelscan::PKG_VERSION,
        folder = %args.folder.display(),
        "extracting image path information"
    );
    let images = dataset::load_dataset(&args.folder, &config.dataset.extensions)?;

    let client = VisionClient::from_config(api_key, &config.vision)?;
    let dispatcher = DispatcherBuilder::from_config(&config)
        .provider(Arc::new(client))
        .build()?;

    let outcomes = dispatcher.process_batch(&images).await?;
    let rows = dispatch::into_rows(outcomes);
    results::save_results(&rows, &config.output.results)?;

    if config.output.graph {
        info!(path = %config.output.results.display(), "analyzing images");
        let rows = results::load_results(&config.output.results)?;
        if rows.is_empty() {
            return Err(LabelScanError::InvalidInput("no records found".to_string()).into());
        }
        let histogram = build_histogram_with(
            &rows,
            HistogramOptions {
                skip_empty_tokens: config.output.skip_empty_labels,
            },
        );
        info!(
            distinct = histogram.len(),
            total = histogram.total(),
            "label histogram"
        );
        for (label, count) in histogram.most_common(histogram.len()) {
            info!(label, count, "label frequency");
        }
    }

    info!("analysis completed");
    Ok(())
}
