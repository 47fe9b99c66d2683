//! Nearest-centroid classifier over landmark feature vectors.
//!
//! A lightweight backend for deployments without an inference runtime: each
//! label owns one reference vector and a frame is assigned to the closest one.
//! Confidence is `1 / (1 + distance)`, so an exact match scores 1.0.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::backend::GestureClassifier;
use crate::detect::result::ClassifierInput;
use crate::stabilizer::Prediction;

#[derive(Debug, Deserialize)]
struct CentroidFile {
    #[serde(default)]
    max_distance: Option<f32>,
    centroids: Vec<CentroidEntry>,
}

#[derive(Debug, Deserialize)]
struct CentroidEntry {
    label: String,
    centroid: Vec<f32>,
}

pub struct NearestCentroidClassifier {
    centroids: Vec<(String, Vec<f32>)>,
    dims: usize,
    max_distance: Option<f32>,
    closed: bool,
}

impl NearestCentroidClassifier {
    pub fn new(centroids: Vec<(String, Vec<f32>)>) -> Result<Self> {
        let dims = centroids
            .first()
            .map(|(_, c)| c.len())
            .ok_or_else(|| anyhow!("centroid table is empty"))?;
        if dims == 0 {
            return Err(anyhow!("centroids must have at least one dimension"));
        }
        for (label, centroid) in &centroids {
            if label.trim().is_empty() {
                return Err(anyhow!("centroid labels must be non-empty"));
            }
            if centroid.len() != dims {
                return Err(anyhow!(
                    "centroid '{}' has {} dimensions, expected {}",
                    label,
                    centroid.len(),
                    dims
                ));
            }
        }
        Ok(Self {
            centroids,
            dims,
            max_distance: None,
            closed: false,
        })
    }

    /// Load `{ "max_distance": .., "centroids": [{ "label": .., "centroid": [..] }] }`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read centroid table {}", path.display()))?;
        let file: CentroidFile = serde_json::from_str(&raw)
            .with_context(|| format!("invalid centroid table {}", path.display()))?;
        let centroids = file
            .centroids
            .into_iter()
            .map(|entry| (entry.label, entry.centroid))
            .collect();
        Ok(Self::new(centroids)?.with_max_distance(file.max_distance))
    }

    /// Reject frames farther than `max_distance` from every centroid.
    pub fn with_max_distance(mut self, max_distance: Option<f32>) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|(label, _)| label.as_str())
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

impl GestureClassifier for NearestCentroidClassifier {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn input_kind(&self) -> ClassifierInput {
        ClassifierInput::Features { len: self.dims }
    }

    fn is_ready(&self) -> bool {
        !self.closed && !self.centroids.is_empty()
    }

    fn classify_features(&mut self, features: &[f32]) -> Result<Option<Prediction>> {
        if self.closed {
            return Err(anyhow!("classifier closed"));
        }
        if features.is_empty() {
            return Ok(None);
        }
        if features.len() != self.dims {
            return Err(anyhow!(
                "feature vector has {} values, classifier expects {}",
                features.len(),
                self.dims
            ));
        }
        let best = self
            .centroids
            .iter()
            .map(|(label, centroid)| (label, euclidean(features, centroid)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((label, distance)) = best else {
            return Ok(None);
        };
        if self.max_distance.is_some_and(|max| distance > max) {
            return Ok(None);
        }
        Ok(Some(Prediction::new(label.clone(), 1.0 / (1.0 + distance))))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn classifier() -> NearestCentroidClassifier {
        NearestCentroidClassifier::new(vec![
            ("A".to_string(), vec![0.0, 0.0]),
            ("B".to_string(), vec![1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn picks_closest_centroid() {
        let mut c = classifier();
        let p = c.classify_features(&[0.1, 0.0]).unwrap().unwrap();
        assert_eq!(p.label, "A");
        let p = c.classify_features(&[1.0, 1.0]).unwrap().unwrap();
        assert_eq!(p.label, "B");
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn rejects_wrong_dimension_and_handles_empty() {
        let mut c = classifier();
        assert!(c.classify_features(&[0.0, 0.0, 0.0]).is_err());
        assert!(c.classify_features(&[]).unwrap().is_none());
    }

    #[test]
    fn max_distance_rejects_outliers() {
        let mut c = classifier().with_max_distance(Some(0.5));
        assert!(c.classify_features(&[5.0, 5.0]).unwrap().is_none());
    }

    #[test]
    fn closed_classifier_is_not_ready() {
        let mut c = classifier();
        assert!(c.is_ready());
        c.close();
        c.close();
        assert!(!c.is_ready());
        assert!(c.classify_features(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn loads_table_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"max_distance": 2.0, "centroids": [{{"label": "hola", "centroid": [0.5, 0.5]}}]}}"#
        )
        .unwrap();
        let mut c = NearestCentroidClassifier::from_path(file.path()).unwrap();
        assert_eq!(c.labels().collect::<Vec<_>>(), vec!["hola"]);
        assert_eq!(c.input_kind(), ClassifierInput::Features { len: 2 });
        assert!(c.classify_features(&[3.0, 3.0]).unwrap().is_none());
    }

    #[test]
    fn mismatched_dimensions_fail_to_load() {
        let result = NearestCentroidClassifier::new(vec![
            ("A".to_string(), vec![0.0, 0.0]),
            ("B".to_string(), vec![1.0]),
        ]);
        assert!(result.is_err());
    }
}
