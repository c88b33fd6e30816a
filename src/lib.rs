//! Scholarship Award Prediction Pipeline
//!
//! Feature normalization, training and inference for predicting whether a
//! PROUNI applicant receives a full (`INTEGRAL`) or partial (`PARCIAL`)
//! scholarship. Training and serving share one feature assembler, so both
//! paths transform records identically.

pub mod adapter;
pub mod config;
pub mod dataset;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod serving;
pub mod types;

pub use adapter::ConversationalProfile;
pub use config::AppConfig;
pub use error::{PipelineError, Result};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use models::trainer::ModelTrainer;
pub use types::{ApplicantRecord, Label, PredictionResult};
