//! Training procedure: CSV to persisted model bundle

use crate::config::TrainingConfig;
use crate::dataset::load_training_records;
use crate::error::{PipelineError, Result};
use crate::feature_extractor::{FeatureExtractor, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::models::bundle::{BundleMetadata, ClassifierPipeline, ModelBundle};
use crate::models::evaluation::{roc_auc, ClassificationReport};
use crate::models::loader::ClassIndex;
use crate::models::logistic::LogisticRegression;
use crate::models::preprocessor::FeaturePreprocessor;
use crate::models::split::stratified_split;
use crate::types::frame::FeatureFrame;
use crate::types::prediction::Label;
use crate::types::record::ApplicantRecord;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub bundle: ModelBundle,
    /// Hold-out report; `None` when the test split is empty
    pub report: Option<ClassificationReport>,
    /// ROC-AUC with INTEGRAL as positive class, when defined
    pub roc_auc: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Rows whose target mapped to no label
    pub dropped_unlabeled: usize,
}

pub struct ModelTrainer {
    config: TrainingConfig,
    reference_year: i32,
    extractor: FeatureExtractor,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig, reference_year: i32) -> Self {
        Self {
            config,
            reference_year,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Attach labels and drop rows whose target is not a known label.
    pub fn prepare(records: Vec<ApplicantRecord>) -> (Vec<ApplicantRecord>, Vec<Label>, usize) {
        let total = records.len();
        let (kept, labels): (Vec<ApplicantRecord>, Vec<Label>) = records
            .into_iter()
            .filter_map(|r| {
                let label = r.scholarship_type.as_deref().and_then(Label::from_target_text)?;
                Some((r, label))
            })
            .unzip();
        let dropped = total - kept.len();
        (kept, labels, dropped)
    }

    /// Fit a bundle on cleaned records. Nothing is written to disk.
    pub fn fit(&self, records: Vec<ApplicantRecord>) -> Result<TrainingOutcome> {
        let started = Instant::now();
        let (records, labels, dropped_unlabeled) = Self::prepare(records);
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset(format!(
                "no labeled rows ({} dropped without a recognizable target)",
                dropped_unlabeled
            )));
        }
        if dropped_unlabeled > 0 {
            info!(dropped = dropped_unlabeled, "Dropped rows without a target label");
        }

        let frame = self.extractor.extract(&records)?;
        let (train_idx, test_idx) =
            stratified_split(&labels, self.config.test_size, self.config.seed);
        let pick = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<Label>>();
        let (y_train, y_test) = (pick(&train_idx), pick(&test_idx));
        let train_frame = frame.select_rows(&train_idx);
        let test_frame = frame.select_rows(&test_idx);

        info!(
            train_rows = train_idx.len(),
            test_rows = test_idx.len(),
            seed = self.config.seed,
            "Stratified split complete"
        );

        let preprocessor = FeaturePreprocessor::fit(
            &train_frame,
            &CATEGORICAL_FEATURES,
            &NUMERIC_FEATURES,
            self.config.min_frequency,
        )?;
        let x_train = preprocessor.transform(&train_frame)?;
        let classifier =
            LogisticRegression::fit(&x_train, &y_train, &self.config.logistic_params())?;
        let pipeline = ClassifierPipeline::new(preprocessor, classifier);

        let (report, auc) = if test_idx.is_empty() {
            warn!("Test split is empty, skipping evaluation");
            (None, None)
        } else {
            self.evaluate(&pipeline, &test_frame, &y_test)?
        };

        let metadata = BundleMetadata {
            trained_at: Utc::now(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            reference_year: self.reference_year,
            accuracy: report.as_ref().map(|r| r.accuracy),
            roc_auc: auc,
        };
        let bundle = ModelBundle::new(pipeline, self.extractor.feature_names(), metadata);
        bundle.validate()?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            classes = ?bundle.classes,
            accuracy = ?bundle.metadata.accuracy,
            roc_auc = ?auc,
            "Training complete"
        );

        Ok(TrainingOutcome {
            bundle,
            report,
            roc_auc: auc,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            dropped_unlabeled,
        })
    }

    fn evaluate(
        &self,
        pipeline: &ClassifierPipeline,
        test_frame: &FeatureFrame,
        y_test: &[Label],
    ) -> Result<(Option<ClassificationReport>, Option<f64>)> {
        let predicted = pipeline.predict(test_frame)?;
        let report = ClassificationReport::new(y_test, &predicted);

        let classes = pipeline.classifier.classes();
        let auc = match ClassIndex::from_classes(classes).index_of(Label::Integral) {
            Some(col) if classes.len() == 2 => {
                let proba = pipeline.predict_proba(test_frame)?;
                let scores: Vec<f64> = proba.column(col).to_vec();
                let positive: Vec<bool> = y_test.iter().map(|l| *l == Label::Integral).collect();
                roc_auc(&positive, &scores)
            }
            _ => None,
        };

        Ok((Some(report), auc))
    }

    /// Full run: read and clean the CSV, fit, then persist the bundle.
    /// On any error before the final write, no file is created at `out`.
    pub fn train_from_csv<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        data: P,
        out: Q,
    ) -> Result<TrainingOutcome> {
        let records = load_training_records(data)?;
        let outcome = self.fit(records)?;
        outcome.bundle.save(out)?;
        Ok(outcome)
    }
}
