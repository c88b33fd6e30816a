//! Error types for the award prediction pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required columns absent from a batch or feature frame
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Model not loaded. Call load() before predicting")]
    NotLoaded,

    #[error("Model artifact not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Short machine-readable kind, used by the serving adapter
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingColumns(_) => "missing_columns",
            PipelineError::NotLoaded => "not_loaded",
            PipelineError::ModelNotFound(_) => "model_not_found",
            PipelineError::InvalidArtifact(_) => "invalid_artifact",
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::EmptyDataset(_) => "empty_dataset",
            PipelineError::Encoding(_) => "encoding",
            PipelineError::Csv(_) => "csv",
            PipelineError::Io(_) => "io",
            PipelineError::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_every_column() {
        let err = PipelineError::MissingColumns(vec![
            "TIPO_BOLSA".to_string(),
            "UF_BENEFICIARIO".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required columns: TIPO_BOLSA, UF_BENEFICIARIO"
        );
        assert_eq!(err.kind(), "missing_columns");
    }

    #[test]
    fn test_not_loaded_is_distinct_from_missing_artifact() {
        let not_loaded = PipelineError::NotLoaded;
        let missing = PipelineError::ModelNotFound(PathBuf::from("models/x.json"));
        assert_ne!(not_loaded.kind(), missing.kind());
        assert!(missing.to_string().contains("models/x.json"));
    }
}
