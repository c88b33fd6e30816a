//! Model bundle loader

use crate::error::Result;
use crate::models::bundle::ModelBundle;
use crate::types::prediction::Label;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Position of each label in the classifier's probability columns, resolved
/// once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassIndex {
    /// Indexed in [`Label::ALL`] order
    positions: [Option<usize>; 2],
}

impl ClassIndex {
    pub fn from_classes(classes: &[Label]) -> Self {
        let mut positions = [None; 2];
        for (slot, label) in Label::ALL.iter().enumerate() {
            positions[slot] = classes.iter().position(|c| c == label);
        }
        Self { positions }
    }

    /// Probability column for `label`, if the classifier knows it
    pub fn index_of(&self, label: Label) -> Option<usize> {
        let slot = Label::ALL.iter().position(|l| *l == label)?;
        self.positions[slot]
    }

    /// Labels the classifier cannot score
    pub fn missing_labels(&self) -> Vec<Label> {
        Label::ALL
            .iter()
            .zip(self.positions.iter())
            .filter(|(_, p)| p.is_none())
            .map(|(l, _)| *l)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }
}

/// Loaded bundle with its resolved class index
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub path: PathBuf,
    pub bundle: ModelBundle,
    pub class_index: ClassIndex,
}

impl LoadedModel {
    /// Wrap an in-memory bundle (no file involved)
    pub fn from_bundle(path: PathBuf, bundle: ModelBundle) -> Self {
        let class_index = ClassIndex::from_classes(&bundle.classes);
        if !class_index.is_complete() {
            warn!(
                path = %path.display(),
                classes = ?bundle.classes,
                missing = ?class_index.missing_labels(),
                "Bundle classifier does not know every label, missing ones will score 0.5"
            );
        }
        Self {
            path,
            bundle,
            class_index,
        }
    }
}

/// Loader for model bundles
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelLoader;

impl ModelLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate a bundle from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model bundle");

        let bundle = ModelBundle::load(path)?;

        info!(
            path = %path.display(),
            classes = ?bundle.classes,
            features = bundle.feature_columns.len(),
            trained_at = %bundle.metadata.trained_at,
            "Model loaded successfully"
        );

        Ok(LoadedModel::from_bundle(path.to_path_buf(), bundle))
    }
}
