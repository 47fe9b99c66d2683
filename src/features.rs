//! Feature extraction for gesture classification.
//!
//! Landmarks are re-expressed relative to the wrist and divided by the
//! wrist-to-index-tip distance, so the vector does not depend on where the
//! hand is in frame or how large it appears. Orientation and articulation are
//! what remain for the classifier.

use crate::landmark::{Landmark, INDEX_TIP, WRIST};

/// Lower bound on the normalization distance.
pub const MIN_SCALE: f32 = 1e-6;

/// Number of features produced for a full hand.
pub const FEATURE_LEN: usize = crate::landmark::LANDMARK_COUNT * 2;

/// Flatten one hand into `[x0, y0, x1, y1, ...]` wrist-relative, scale-normalized pairs.
///
/// Returns an empty vector for an empty slice; callers treat that as "no
/// prediction possible". When the reference point is missing the wrist is used,
/// which collapses the scale to `MIN_SCALE`.
pub fn extract_features(landmarks: &[Landmark]) -> Vec<f32> {
    let Some(wrist) = landmarks.get(WRIST).copied() else {
        return Vec::new();
    };
    let reference = landmarks.get(INDEX_TIP).copied().unwrap_or(wrist);
    let scale = wrist.distance(&reference).max(MIN_SCALE);

    let mut features = Vec::with_capacity(landmarks.len() * 2);
    for p in landmarks {
        features.push((p.x - wrist.x) / scale);
        features.push((p.y - wrist.y) / scale);
    }
    features
}
