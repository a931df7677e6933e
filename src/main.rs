//! Render real-vs-fake waveform comparison figures for a labelled audio dataset.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use waveform_analysis::config::{AppConfig, OutputFormat};
use waveform_analysis::{AnalysisError, WaveformAnalyzer};

#[derive(Parser)]
#[command(name = "waveform_analysis")]
#[command(about = "Compare waveforms of real and fake audio samples")]
struct Cli {
    /// Dataset root to scan (defaults to the configured root, `Dataset`)
    dataset: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Figure format, overriding the config file
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(dataset) = cli.dataset {
        config.dataset.root = dataset;
    }
    if let Some(format) = cli.format {
        config.render.format = format;
    }

    let mut analyzer = WaveformAnalyzer::new(config).context("Invalid configuration")?;
    match analyzer.run() {
        Ok(report) => {
            for path in report.comparison.iter().chain(&report.detailed) {
                tracing::info!("Wrote {}", path.display());
            }
            Ok(())
        }
        Err(AnalysisError::Scan(e)) => {
            if let Some(hint) = e.recovery_hint() {
                tracing::error!("{}", hint);
            }
            bail!("Dataset scan failed: {}", e)
        }
        Err(e) => Err(e).context("Waveform analysis failed"),
    }
}
