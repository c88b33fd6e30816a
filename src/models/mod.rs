//! Model pipeline: preprocessing, classifier, training and inference

pub mod bundle;
pub mod evaluation;
pub mod inference;
pub mod loader;
pub mod logistic;
pub mod preprocessor;
pub mod split;
pub mod trainer;

pub use bundle::{ClassifierPipeline, ModelBundle};
pub use inference::InferenceEngine;
pub use loader::{ClassIndex, ModelLoader};
pub use trainer::{ModelTrainer, TrainingOutcome};
