use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::GestureClassifier;
use super::backends::{NearestCentroidClassifier, SyntheticLandmarkSource};
use super::result::ClassifierSettings;

/// Builds a classifier from settings.
pub type ClassifierFactory =
    Box<dyn Fn(&ClassifierSettings) -> Result<Box<dyn GestureClassifier>> + Send + Sync>;

/// Registry of classifier backends, keyed by name.
///
/// Classifiers own heavyweight model state, so the registry stores factories and
/// each pipeline builds (and later closes) its own instance.
pub struct BackendRegistry {
    factories: HashMap<String, ClassifierFactory>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            default_name: None,
        }
    }

    /// Registry with every backend compiled into this build.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("centroid", |settings: &ClassifierSettings| {
            let path = settings
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow!("centroid classifier requires a model_path"))?;
            let classifier = NearestCentroidClassifier::from_path(path)?;
            Ok(Box::new(classifier) as Box<dyn GestureClassifier>)
        });
        // Centroids of the synthetic hand's poses, for demos without a model file.
        registry.register("synthetic", |_: &ClassifierSettings| {
            let centroids = SyntheticLandmarkSource::reference_centroids();
            let classifier = NearestCentroidClassifier::new(centroids)?;
            Ok(Box::new(classifier) as Box<dyn GestureClassifier>)
        });
        #[cfg(feature = "backend-tract")]
        registry.register("tract", |settings: &ClassifierSettings| {
            let classifier = super::backends::TractClassifier::from_settings(settings)?;
            Ok(Box::new(classifier) as Box<dyn GestureClassifier>)
        });
        registry
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ClassifierSettings) -> Result<Box<dyn GestureClassifier>> + Send + Sync + 'static,
    {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.factories.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// List registered backends, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a classifier by name.
    pub fn build(
        &self,
        name: &str,
        settings: &ClassifierSettings,
    ) -> Result<Box<dyn GestureClassifier>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| anyhow!("backend '{}' not registered", name))?;
        let classifier = factory(settings)?;
        log::info!("classifier backend '{}' loaded", classifier.name());
        Ok(classifier)
    }

    /// Build the default classifier.
    pub fn build_default(
        &self,
        settings: &ClassifierSettings,
    ) -> Result<Box<dyn GestureClassifier>> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| anyhow!("no classifier backends registered"))?;
        self.build(name, settings)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backend::LandmarkSource;
    use crate::detect::backends::SYNTHETIC_LABELS;
    use crate::features::extract_features;
    use crate::frame::Frame;

    fn fixed(_: &ClassifierSettings) -> Result<Box<dyn GestureClassifier>> {
        let classifier =
            NearestCentroidClassifier::new(vec![("A".to_string(), vec![0.0; 4])])?;
        Ok(Box::new(classifier))
    }

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register("first", fixed);
        registry.register("second", fixed);
        assert_eq!(registry.default_name(), Some("first"));
        registry.set_default("second").unwrap();
        assert_eq!(registry.default_name(), Some("second"));
        assert!(registry.set_default("missing").is_err());
        assert_eq!(registry.list(), vec!["first", "second"]);
    }

    #[test]
    fn build_reports_unknown_backend() {
        let registry = BackendRegistry::new();
        assert!(registry.build("nope", &ClassifierSettings::default()).is_err());
        assert!(registry
            .build_default(&ClassifierSettings::default())
            .is_err());
    }

    #[test]
    fn builtin_centroid_requires_model_path() {
        let registry = BackendRegistry::with_builtin();
        assert!(registry.contains("centroid"));
        assert!(registry
            .build("centroid", &ClassifierSettings::default())
            .is_err());
    }

    #[test]
    fn synthetic_classifier_recognizes_synthetic_poses() {
        let registry = BackendRegistry::with_builtin();
        assert_eq!(registry.default_name(), Some("centroid"));
        let mut classifier = registry
            .build("synthetic", &ClassifierSettings::default())
            .unwrap();
        let mut source = SyntheticLandmarkSource::new(5, 5);

        // Frame 1 holds the first pose, frame 11 the second.
        for (sequence, expected) in [(1, SYNTHETIC_LABELS[0]), (11, SYNTHETIC_LABELS[1])] {
            let hands = source.detect(&Frame::blank(8, 8, sequence)).unwrap();
            let features = extract_features(hands.hands[0].landmarks());
            let prediction = classifier.classify_features(&features).unwrap().unwrap();
            assert_eq!(prediction.label, expected);
            assert!(prediction.confidence > 0.9);
        }
    }
}
