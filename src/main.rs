//! Award Prediction Service - Main Entry Point
//!
//! Loads the model bundle, reads JSON-lines requests from stdin and writes
//! one JSON-lines response per request to stdout. Requests are processed in
//! parallel, bounded by `serving.workers`.

use anyhow::{Context, Result};
use prouni_award_pipeline::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, PredictionMetrics},
    models::inference::InferenceEngine,
    serving::handle_raw_line,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("prouni_award_pipeline={}", logging.level).parse()?);

    // stdout carries responses, logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting Award Prediction Service");
    info!(
        model_path = %config.model.path.display(),
        reference_year = config.model.reference_year,
        workers = config.serving.workers,
        "Configuration loaded"
    );

    let mut engine = InferenceEngine::new(&config);
    if !engine.model_exists() {
        anyhow::bail!(
            "Model bundle not found at {}. Train one first: train <data.csv> {}",
            engine.model_path().display(),
            engine.model_path().display()
        );
    }
    engine
        .load()
        .with_context(|| format!("Failed to load model from {}", engine.model_path().display()))?;

    if let Some(model) = engine.model_info() {
        info!(
            classes = ?model.classes,
            features = model.feature_columns.len(),
            trained_at = %model.metadata.trained_at,
            "Inference engine initialized"
        );
    }

    let engine = Arc::new(engine);
    let metrics = Arc::new(PredictionMetrics::new());

    if config.serving.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.serving.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let workers = config.serving.workers.max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    // raw segments; undecodable lines are answered per line
    let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');
    let mut line_no = 0usize;

    info!(workers = workers, "Reading requests from stdin");

    while let Some(line) = lines.next_segment().await? {
        line_no += 1;
        let permit = semaphore.clone().acquire_owned().await?;

        let engine = engine.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            if let Some(response) = handle_raw_line(&engine, &metrics, line_no, &line) {
                match serde_json::to_string(&response) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!(line = line_no, error = %e, "Failed to encode response"),
                }
            }
            drop(permit);
        });
    }

    // Wait for in-flight requests
    let _all = semaphore.acquire_many(workers as u32).await?;

    info!(requests = line_no, "Input closed, shutting down");
    metrics.print_summary();

    Ok(())
}
