//! Feature assembly for award prediction.
//!
//! Turns applicant records into the feature frame consumed by the model
//! pipeline. Training and serving both go through [`FeatureExtractor::extract`],
//! so the transformation is identical on both paths.

use crate::error::{PipelineError, Result};
use crate::preprocessing::age::derive_age;
use crate::preprocessing::text::normalize_field;
use crate::types::frame::FeatureFrame;
use crate::types::record::{columns, ApplicantRecord, FeatureRecord};
use tracing::debug;

/// Categorical model inputs, in the order used by [`FeatureRecord::categorical`]
pub const CATEGORICAL_FEATURES: [&str; 9] = [
    columns::SEX,
    columns::RACE,
    columns::DISABILITY,
    columns::REGION,
    columns::STATE,
    columns::MUNICIPALITY,
    columns::MODALITY,
    columns::COURSE,
    columns::SHIFT,
];

/// Numeric model inputs
pub const NUMERIC_FEATURES: [&str; 2] = [columns::GRANT_YEAR, columns::AGE];

/// Feature assembler: age derivation, text normalization, contract check.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Derive the feature record for one applicant.
    ///
    /// Age is computed from the raw birth date before any text
    /// normalization touches the record.
    pub fn derive(&self, record: &ApplicantRecord) -> FeatureRecord {
        let record = record.canonicalized();

        let age = derive_age(record.grant_year, record.birth_date.as_deref());
        let categorical = record.categorical_values().map(normalize_field);

        FeatureRecord {
            grant_year: record.grant_year,
            age,
            categorical,
        }
    }

    /// Assemble a feature frame for a batch of applicants.
    pub fn extract(&self, records: &[ApplicantRecord]) -> Result<FeatureFrame> {
        let derived: Vec<FeatureRecord> = records.iter().map(|r| self.derive(r)).collect();

        let frame = FeatureFrame::from_records(
            &derived,
            &CATEGORICAL_FEATURES,
            columns::GRANT_YEAR,
            columns::AGE,
        );
        ensure_columns(&frame, &self.feature_names())?;

        debug!(
            rows = frame.len(),
            missing_age = derived.iter().filter(|r| r.age.is_none()).count(),
            "Features extracted"
        );

        Ok(frame)
    }

    /// Assemble a single-row feature frame.
    pub fn extract_one(&self, record: &ApplicantRecord) -> Result<FeatureFrame> {
        self.extract(std::slice::from_ref(record))
    }

    /// Number of contract columns
    pub fn feature_count(&self) -> usize {
        CATEGORICAL_FEATURES.len() + NUMERIC_FEATURES.len()
    }

    /// Contract columns: categorical first, then numeric
    pub fn feature_names(&self) -> Vec<String> {
        CATEGORICAL_FEATURES
            .iter()
            .chain(NUMERIC_FEATURES.iter())
            .map(|c| c.to_string())
            .collect()
    }
}

/// Fail with the exact list of `expected` columns absent from the frame.
pub fn ensure_columns<S: AsRef<str>>(frame: &FeatureFrame, expected: &[S]) -> Result<()> {
    let mut missing: Vec<String> = expected
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !frame.contains(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        missing.sort();
        Err(PipelineError::MissingColumns(missing))
    }
}
