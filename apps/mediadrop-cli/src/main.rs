//! `mediadrop`: upload files and directories to the MediaDrop endpoint.

mod config;
mod report;
mod scanner;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mediadrop_transport::{Base64Transport, FormTransport, Transport};
use mediadrop_upload_pipeline::UploadPipeline;
use mediadrop_upload_store::UploadStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Strategy};

/// Command-line arguments for mediadrop.
#[derive(Parser, Debug)]
#[command(name = "mediadrop")]
#[command(about = "Upload media files to the MediaDrop analysis endpoint")]
#[command(version)]
struct Args {
    /// Files or directories to upload
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Upload strategy
    #[arg(short, long, value_enum, env = "MEDIADROP_STRATEGY")]
    strategy: Option<Strategy>,

    /// Endpoint for the selected strategy
    #[arg(short, long, env = "MEDIADROP_ENDPOINT")]
    endpoint: Option<String>,

    /// Files uploaded at once per batch chunk
    #[arg(short, long)]
    concurrency: Option<NonZeroUsize>,

    /// Upload one file at a time, pausing between files
    #[arg(long)]
    sequential: bool,

    /// Config file (defaults to ~/.config/mediadrop/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(endpoint) = &self.endpoint {
            config.set_endpoint(endpoint.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.get();
        }
    }
}

fn build_transport(config: &AppConfig) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.strategy {
        Strategy::Base64 => Arc::new(
            Base64Transport::new(config.base64.clone()).context("failed to build base64 transport")?,
        ),
        Strategy::Form => {
            Arc::new(FormTransport::new(config.form.clone()).context("failed to build form transport")?)
        }
    };
    Ok(transport)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mediadrop=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let files = scanner::collect_files(&args.paths).context("failed to collect files")?;
    if files.is_empty() {
        bail!("no files to upload");
    }

    let store = UploadStore::new();
    let transport = build_transport(&config)?;
    let pipeline = UploadPipeline::new(store.clone(), transport, config.pipeline_config()?)?;
    info!(
        files = files.len(),
        strategy = ?config.strategy,
        endpoint = config.endpoint(),
        "starting upload"
    );

    let mut progress = store.select(|s| s.total_progress().round() as u8);
    let watcher = tokio::spawn(async move {
        while let Some(percent) = progress.changed().await {
            info!(percent, "total progress");
        }
    });

    let ids = store.add_files(files);
    let results = if args.sequential {
        pipeline.upload_many(&ids).await
    } else {
        pipeline
            .batch_upload(&ids, pipeline.config().concurrency)
            .await
    };
    watcher.abort();

    let state = store.snapshot();
    if args.json {
        println!("{}", report::render_json(&state, &results)?);
    } else {
        print!("{}", report::render_text(&state, &results));
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        bail!("{failed} of {} uploads failed", results.len());
    }
    Ok(())
}
