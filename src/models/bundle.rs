//! Persisted model artifact.
//!
//! A bundle carries the fitted preprocessing + classifier pipeline, the class
//! labels in classifier order, and the feature columns the pipeline expects.
//! It is written once by training and only ever read afterwards.

use crate::error::{PipelineError, Result};
use crate::models::logistic::LogisticRegression;
use crate::models::preprocessor::FeaturePreprocessor;
use crate::types::frame::FeatureFrame;
use crate::types::prediction::Label;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Transform-and-classify pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPipeline {
    pub preprocessor: FeaturePreprocessor,
    pub classifier: LogisticRegression,
}

impl ClassifierPipeline {
    pub fn new(preprocessor: FeaturePreprocessor, classifier: LogisticRegression) -> Self {
        Self {
            preprocessor,
            classifier,
        }
    }

    /// Probability matrix, columns in `classifier.classes()` order
    pub fn predict_proba(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        let x = self.preprocessor.transform(frame)?;
        self.classifier.predict_proba(&x)
    }

    pub fn predict(&self, frame: &FeatureFrame) -> Result<Vec<Label>> {
        let x = self.preprocessor.transform(frame)?;
        self.classifier.predict(&x)
    }
}

/// Descriptive training metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub trained_at: DateTime<Utc>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Year assumed for conversational requests
    pub reference_year: i32,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub roc_auc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub pipeline: ClassifierPipeline,
    /// Class labels in classifier order
    pub classes: Vec<Label>,
    /// Columns expected in the inference frame
    pub feature_columns: Vec<String>,
    pub metadata: BundleMetadata,
}

impl ModelBundle {
    pub fn new(
        pipeline: ClassifierPipeline,
        feature_columns: Vec<String>,
        metadata: BundleMetadata,
    ) -> Self {
        let classes = pipeline.classifier.classes().to_vec();
        Self {
            pipeline,
            classes,
            feature_columns,
            metadata,
        }
    }

    /// Reject bundles whose parts disagree with each other.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(PipelineError::InvalidArtifact(
                "bundle lists no classes".to_string(),
            ));
        }
        if self.classes != self.pipeline.classifier.classes() {
            return Err(PipelineError::InvalidArtifact(format!(
                "class list {:?} does not match classifier classes {:?}",
                self.classes,
                self.pipeline.classifier.classes()
            )));
        }
        if self.pipeline.preprocessor.output_width() != self.pipeline.classifier.n_features() {
            return Err(PipelineError::InvalidArtifact(format!(
                "preprocessor emits {} columns but classifier expects {}",
                self.pipeline.preprocessor.output_width(),
                self.pipeline.classifier.n_features()
            )));
        }

        let unknown: Vec<String> = self
            .pipeline
            .preprocessor
            .input_columns()
            .into_iter()
            .filter(|c| !self.feature_columns.contains(c))
            .collect();
        if !unknown.is_empty() {
            return Err(PipelineError::InvalidArtifact(format!(
                "pipeline reads columns not listed as features: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    /// Write the bundle as JSON. The file appears at `path` only once it is
    /// complete; parent directories are created as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

        info!(
            path = %path.display(),
            classes = ?self.classes,
            features = self.feature_columns.len(),
            "Model bundle saved"
        );
        Ok(())
    }

    /// Read and validate a bundle.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::ModelNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let bundle: ModelBundle = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::InvalidArtifact(format!("{}: {}", path.display(), e)))?;
        bundle.validate()?;
        Ok(bundle)
    }
}
