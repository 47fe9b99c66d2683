use anyhow::Result;

use crate::detect::result::ClassifierInput;
use crate::frame::Frame;
use crate::landmark::HandFrame;
use crate::stabilizer::Prediction;

/// Hand landmark extractor.
///
/// Implementations wrap a hand-pose model. They return zero or more hands per
/// frame, each with 21 normalized points. Errors are per-frame and are never
/// retried by the pipeline.
pub trait LandmarkSource: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run landmark detection on a frame.
    fn detect(&mut self, frame: &Frame) -> Result<HandFrame>;

    /// Release native resources. Must be idempotent.
    fn close(&mut self) {}
}

/// Gesture classifier.
///
/// Feature models consume the 42-value vector from `extract_features`; image
/// models consume the frame itself. A classifier answers only for the input
/// kind it reports and returns `Ok(None)` for the other.
pub trait GestureClassifier: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    fn input_kind(&self) -> ClassifierInput;

    /// False when the model or its labels failed to load.
    fn is_ready(&self) -> bool;

    fn classify_features(&mut self, features: &[f32]) -> Result<Option<Prediction>>;

    fn classify_image(&mut self, _frame: &Frame) -> Result<Option<Prediction>> {
        Ok(None)
    }

    /// Release native resources. Must be idempotent.
    fn close(&mut self) {}
}
