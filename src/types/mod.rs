//! Type definitions for the award prediction pipeline

pub mod frame;
pub mod prediction;
pub mod record;

pub use frame::{FeatureColumn, FeatureFrame};
pub use prediction::{ConfidenceTier, ConversationalPrediction, Label, PredictionResult};
pub use record::{ApplicantRecord, FeatureRecord};
