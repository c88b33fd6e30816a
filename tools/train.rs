//! Model Training Tool
//!
//! Fits the award classifier on a historical PROUNI CSV and writes the model
//! bundle.
//!
//! Usage: train <data.csv> [out.json]

use anyhow::{Context, Result};
use prouni_award_pipeline::{config::AppConfig, models::trainer::ModelTrainer};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prouni_award_pipeline=info".parse()?)
                .add_directive("train=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let data = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => anyhow::bail!(
            "Usage: {} <data.csv> [out.json]",
            args.first().map(String::as_str).unwrap_or("train")
        ),
    };

    let config = AppConfig::load()?;
    let out = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.model.path.clone());

    info!(
        data = %data.display(),
        out = %out.display(),
        test_size = config.training.test_size,
        seed = config.training.seed,
        "Starting training"
    );

    let trainer = ModelTrainer::new(config.training.clone(), config.model.reference_year);
    let outcome = trainer
        .train_from_csv(&data, &out)
        .with_context(|| format!("Training on {} failed", data.display()))?;

    println!(
        "\nRows: {} train, {} test ({} without a usable target)",
        outcome.train_rows, outcome.test_rows, outcome.dropped_unlabeled
    );
    if let Some(report) = &outcome.report {
        println!("\nClassification report:");
        println!("{}", report);
    }
    if let Some(auc) = outcome.roc_auc {
        println!("ROC-AUC (INTEGRAL as positive): {:.4}", auc);
    }
    println!("\nSaved model to: {}", out.display());

    Ok(())
}
