use serde::Deserialize;
use std::path::PathBuf;

/// What a classifier consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierInput {
    /// Normalized landmark feature vector of the given length.
    Features { len: usize },
    /// RGB image resized to `width` x `height`.
    Image { width: u32, height: u32 },
}

impl Default for ClassifierInput {
    fn default() -> Self {
        ClassifierInput::Features {
            len: crate::features::FEATURE_LEN,
        }
    }
}

/// Whether the recognition backends came up.
///
/// A disabled pipeline still accepts frames but never produces predictions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Disabled(String),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Settings used by registry factories to build a classifier.
#[derive(Clone, Debug, Default)]
pub struct ClassifierSettings {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub input: ClassifierInput,
}
