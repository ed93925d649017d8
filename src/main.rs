use anyhow::{Context, Result};
use log::info;
use pharma_sales::config::{PipelineConfig, CONFIG_FILE};
use pharma_sales::pipeline::{analysis, forecasting, preprocessing, visualization};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = Path::new(CONFIG_FILE);
    let config = if config_path.exists() {
        info!("Using configuration from {}", config_path.display());
        PipelineConfig::from_file(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?
    } else {
        PipelineConfig::default()
    };
    let charts = config.chart_writer();

    let start = Instant::now();
    analysis::run(&config, Some(&charts)).context("analysis pipeline")?;
    info!("analysis done in {:?}", start.elapsed());

    let start = Instant::now();
    let report = preprocessing::run(&config).context("preprocessing pipeline")?;
    info!(
        "preprocessing wrote {} rows to {} in {:?}",
        report.processed.height(),
        report.output_path.display(),
        start.elapsed()
    );

    let start = Instant::now();
    visualization::run(&config, Some(&charts)).context("visualization pipeline")?;
    info!("visualization done in {:?}", start.elapsed());

    let start = Instant::now();
    forecasting::run(&config, Some(&charts)).context("forecasting pipeline")?;
    info!("forecasting done in {:?}", start.elapsed());

    info!("charts written to {}", charts.output_dir().display());
    Ok(())
}
