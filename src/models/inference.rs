//! Inference engine for award prediction.
//!
//! The engine is an explicitly constructed service object. `load` and
//! `unload` take `&mut self`; once loaded, share it behind an `Arc` and call
//! `predict` from as many tasks as needed.

use crate::adapter::ConversationalProfile;
use crate::config::AppConfig;
use crate::error::{PipelineError, Result};
use crate::feature_extractor::{ensure_columns, FeatureExtractor};
use crate::models::bundle::{BundleMetadata, ModelBundle};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::prediction::{ConversationalPrediction, Label, PredictionResult};
use crate::types::record::ApplicantRecord;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Grant years accepted at serving time
pub const GRANT_YEAR_RANGE: RangeInclusive<i32> = 2000..=2030;

/// Probability reported for a label the classifier does not know
const UNKNOWN_CLASS_PROBABILITY: f64 = 0.5;

/// Summary of the loaded bundle
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub path: PathBuf,
    pub classes: Vec<Label>,
    pub feature_columns: Vec<String>,
    pub metadata: BundleMetadata,
}

pub struct InferenceEngine {
    model_path: PathBuf,
    model: Option<LoadedModel>,
    extractor: FeatureExtractor,
    /// Grant year used for conversational requests. Follows the loaded
    /// bundle; the configured value applies until one is loaded.
    reference_year: i32,
}

impl InferenceEngine {
    /// Create an unloaded engine from configuration
    pub fn new(config: &AppConfig) -> Self {
        Self {
            model_path: config.model.path.clone(),
            model: None,
            extractor: FeatureExtractor::new(),
            reference_year: config.model.reference_year,
        }
    }

    /// Create an unloaded engine for a specific bundle path
    pub fn with_model_path<P: AsRef<Path>>(path: P, reference_year: i32) -> Self {
        Self {
            model_path: path.as_ref().to_path_buf(),
            model: None,
            extractor: FeatureExtractor::new(),
            reference_year,
        }
    }

    /// Create a loaded engine around an in-memory bundle
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        bundle.validate()?;
        let reference_year = bundle.metadata.reference_year;
        let model_path = PathBuf::from("<memory>");
        Ok(Self {
            model: Some(LoadedModel::from_bundle(model_path.clone(), bundle)),
            model_path,
            extractor: FeatureExtractor::new(),
            reference_year,
        })
    }

    /// Load the bundle from the configured path, replacing any loaded one.
    pub fn load(&mut self) -> Result<()> {
        let loaded = ModelLoader::new().load_model(&self.model_path)?;
        let trained_year = loaded.bundle.metadata.reference_year;
        if trained_year != self.reference_year {
            warn!(
                configured = self.reference_year,
                bundle = trained_year,
                "Reference year differs from the bundle's, using the bundle's"
            );
            self.reference_year = trained_year;
        }
        self.model = Some(loaded);
        info!(path = %self.model_path.display(), "Inference engine ready");
        Ok(())
    }

    pub fn unload(&mut self) {
        if self.model.take().is_some() {
            info!(path = %self.model_path.display(), "Model unloaded");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Whether a bundle file exists at the configured path
    pub fn model_exists(&self) -> bool {
        self.model_path.exists()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model.as_ref().map(|m| ModelInfo {
            path: m.path.clone(),
            classes: m.bundle.classes.clone(),
            feature_columns: m.bundle.feature_columns.clone(),
            metadata: m.bundle.metadata.clone(),
        })
    }

    /// Predict the award class for one applicant
    pub fn predict(&self, record: &ApplicantRecord) -> Result<PredictionResult> {
        let model = self.model.as_ref().ok_or(PipelineError::NotLoaded)?;

        match record.grant_year {
            Some(year) if GRANT_YEAR_RANGE.contains(&year) => {}
            Some(year) => {
                return Err(PipelineError::InvalidInput(format!(
                    "grant year {} outside {}..={}",
                    year,
                    GRANT_YEAR_RANGE.start(),
                    GRANT_YEAR_RANGE.end()
                )))
            }
            None => {
                return Err(PipelineError::InvalidInput(
                    "grant year is required".to_string(),
                ))
            }
        }

        let frame = self.extractor.extract_one(record)?;
        ensure_columns(&frame, &model.bundle.feature_columns)?;

        let pipeline = &model.bundle.pipeline;
        let label = pipeline
            .predict(&frame)?
            .first()
            .copied()
            .ok_or_else(|| PipelineError::InvalidArtifact("classifier returned no label".to_string()))?;
        let proba = pipeline.predict_proba(&frame)?;

        let lookup = |target: Label| match model.class_index.index_of(target) {
            Some(col) => proba[[0, col]],
            None => {
                warn!(
                    label = %target,
                    "Classifier does not know this label, reporting neutral probability"
                );
                UNKNOWN_CLASS_PROBABILITY
            }
        };
        let proba_integral = lookup(Label::Integral);
        let proba_parcial = lookup(Label::Parcial);

        let result = PredictionResult::new(label, proba_integral, proba_parcial);
        debug!(
            label = %result.label,
            proba_integral = result.proba_integral,
            confidence = result.confidence.as_str(),
            "Prediction complete"
        );
        Ok(result)
    }

    /// Predict for a batch of applicants, one result per record
    pub fn predict_batch(&self, records: &[ApplicantRecord]) -> Vec<Result<PredictionResult>> {
        records.iter().map(|r| self.predict(r)).collect()
    }

    /// Predict from a sparse conversational profile
    pub fn predict_conversational(
        &self,
        profile: &ConversationalProfile,
    ) -> Result<ConversationalPrediction> {
        let record = profile.to_applicant_record(self.reference_year);
        Ok(self.predict(&record)?.to_conversational())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::{CATEGORICAL_FEATURES, NUMERIC_FEATURES};
    use crate::models::bundle::ClassifierPipeline;
    use crate::models::logistic::{LogisticParams, LogisticRegression};
    use crate::models::preprocessor::FeaturePreprocessor;
    use crate::types::prediction::ConfidenceTier;
    use chrono::Utc;

    fn applicant(course: &str, shift: &str, birth: &str) -> ApplicantRecord {
        ApplicantRecord {
            sex: Some("F".to_string()),
            course: Some(course.to_string()),
            shift: Some(shift.to_string()),
            birth_date: Some(birth.to_string()),
            state: Some("SP".to_string()),
            region: Some("SUDESTE".to_string()),
            ..ApplicantRecord::new(2020)
        }
    }

    /// Bundle trained on an assembled frame where course decides the label
    fn bundle_from(records: &[ApplicantRecord], labels: &[Label]) -> ModelBundle {
        let extractor = FeatureExtractor::new();
        let frame = extractor.extract(records).unwrap();
        let preprocessor =
            FeaturePreprocessor::fit(&frame, &CATEGORICAL_FEATURES, &NUMERIC_FEATURES, 1).unwrap();
        let x = preprocessor.transform(&frame).unwrap();
        let classifier = LogisticRegression::fit(&x, labels, &LogisticParams::default()).unwrap();

        ModelBundle::new(
            ClassifierPipeline::new(preprocessor, classifier),
            extractor.feature_names(),
            BundleMetadata {
                trained_at: Utc::now(),
                train_rows: records.len(),
                test_rows: 0,
                reference_year: 2020,
                accuracy: None,
                roc_auc: None,
            },
        )
    }

    fn synthetic() -> (Vec<ApplicantRecord>, Vec<Label>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let birth = format!("{}-05-10", 1995 + i % 5);
            records.push(applicant("MEDICINA", "INTEGRAL", &birth));
            labels.push(Label::Integral);
            records.push(applicant("ADMINISTRACAO", "NOTURNO", &birth));
            labels.push(Label::Parcial);
        }
        (records, labels)
    }

    #[test]
    fn test_unloaded_engine_refuses_to_predict() {
        let mut engine = InferenceEngine::new(&AppConfig::default());
        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.predict(&applicant("MEDICINA", "INTEGRAL", "2000-01-01")),
            Err(PipelineError::NotLoaded)
        ));

        let (records, labels) = synthetic();
        let mut loaded = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();
        loaded.unload();
        assert!(matches!(
            loaded.predict(&records[0]),
            Err(PipelineError::NotLoaded)
        ));
        engine.unload();
    }

    #[test]
    fn test_round_trip_reproduces_training_label() {
        let (records, labels) = synthetic();
        let engine = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();

        for (record, label) in records.iter().zip(labels.iter()).take(4) {
            let result = engine.predict(record).unwrap();
            assert_eq!(result.label, *label);
            assert!(result.label_probability() >= 0.5);
            assert!((result.proba_integral + result.proba_parcial - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_grant_year_is_validated() {
        let (records, labels) = synthetic();
        let engine = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();

        let mut record = records[0].clone();
        record.grant_year = Some(1990);
        assert!(matches!(engine.predict(&record), Err(PipelineError::InvalidInput(_))));
        record.grant_year = None;
        assert!(matches!(engine.predict(&record), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_sparse_record_still_predicts() {
        let (records, labels) = synthetic();
        let engine = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();

        let result = engine.predict(&ApplicantRecord::new(2020)).unwrap();
        assert!((result.proba_integral + result.proba_parcial - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_class_bundle_falls_back_to_neutral() {
        let (records, _) = synthetic();
        let labels = vec![Label::Parcial; records.len()];
        let engine = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();

        let result = engine.predict(&records[0]).unwrap();
        assert_eq!(result.label, Label::Parcial);
        assert_eq!(result.proba_parcial, 1.0);
        assert_eq!(result.proba_integral, UNKNOWN_CLASS_PROBABILITY);
        assert_eq!(result.confidence, ConfidenceTier::High);
    }

    #[test]
    fn test_conversational_prediction() {
        let (records, labels) = synthetic();
        let engine = InferenceEngine::from_bundle(bundle_from(&records, &labels)).unwrap();

        let profile: ConversationalProfile = serde_json::from_str(
            r#"{"idade": 22, "sexo": "F", "uf": "SP", "curso": "Medicina", "turno": "Integral"}"#,
        )
        .unwrap();
        let response = engine.predict_conversational(&profile).unwrap();
        assert_eq!(response.tipo_bolsa, Label::Integral);
        assert!(response.probabilidade_integral > 50.0);
        assert!(response.mensagem.contains("INTEGRAL"));
    }

    #[test]
    fn test_load_from_disk() {
        let (records, labels) = synthetic();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        bundle_from(&records, &labels).save(&path).unwrap();

        let mut engine = InferenceEngine::with_model_path(&path, 2020);
        assert!(engine.model_exists());
        engine.load().unwrap();
        assert!(engine.is_loaded());

        let info = engine.model_info().unwrap();
        assert_eq!(info.classes, vec![Label::Integral, Label::Parcial]);
        assert_eq!(info.feature_columns.len(), 11);

        let batch = engine.predict_batch(&records[..2]);
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_load_adopts_bundle_reference_year() {
        let (records, labels) = synthetic();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        bundle_from(&records, &labels).save(&path).unwrap();

        let mut engine = InferenceEngine::with_model_path(&path, 2018);
        assert_eq!(engine.reference_year(), 2018);
        engine.load().unwrap();
        assert_eq!(engine.reference_year(), 2020);

        let profile = ConversationalProfile {
            age: Some(22),
            ..Default::default()
        };
        let record = profile.to_applicant_record(engine.reference_year());
        assert_eq!(record.birth_date.as_deref(), Some("1998-01-01"));
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = InferenceEngine::with_model_path(dir.path().join("absent.json"), 2020);
        assert!(!engine.model_exists());
        assert!(matches!(engine.load(), Err(PipelineError::ModelNotFound(_))));
        assert!(!engine.is_loaded());
    }
}
