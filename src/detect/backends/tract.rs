#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::GestureClassifier;
use crate::detect::result::{ClassifierInput, ClassifierSettings};
use crate::frame::Frame;
use crate::stabilizer::Prediction;

/// Best scores below this trigger a second pass with [-1, 1] pixel scaling.
const LOW_SCORE_RETRY: f32 = 0.20;

/// Tract-based classifier for ONNX gesture models.
///
/// Feature models take `[1, N]` f32 input. Image models take `[1, H, W, 3]`
/// RGB in [0, 1]; when the best score is low the frame is re-run with [-1, 1]
/// scaling, since exported image models disagree on preprocessing.
/// The model output is one score per label, in label-file order.
pub struct TractClassifier {
    model: Option<SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>>,
    labels: Vec<String>,
    input: ClassifierInput,
}

impl TractClassifier {
    /// Load an ONNX model and its JSON label array from disk.
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(
        model_path: P,
        labels_path: L,
        input: ClassifierInput,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let shape = match input {
            ClassifierInput::Features { len } => tvec!(1, len),
            ClassifierInput::Image { width, height } => {
                tvec!(1, height as usize, width as usize, 3)
            }
        };
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let labels = load_labels(labels_path.as_ref())?;
        log::debug!(
            "tract classifier: {} labels, input {:?}",
            labels.len(),
            input
        );

        Ok(Self {
            model: Some(model),
            labels,
            input,
        })
    }

    pub fn from_settings(settings: &ClassifierSettings) -> Result<Self> {
        let model_path = settings
            .model_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract classifier requires a model_path"))?;
        let labels_path = settings
            .labels_path
            .as_ref()
            .ok_or_else(|| anyhow!("tract classifier requires a labels_path"))?;
        Self::new(model_path, labels_path, settings.input)
    }

    fn run(&self, input: Tensor) -> Result<Option<(usize, f32)>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("classifier closed"))?;
        let outputs = model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        Ok(scores
            .iter()
            .cloned()
            .enumerate()
            .filter(|(_, score)| score.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1)))
    }

    fn prediction(&self, best: Option<(usize, f32)>) -> Option<Prediction> {
        let (idx, score) = best?;
        let label = self.labels.get(idx)?;
        Some(Prediction::new(label.clone(), score))
    }

    fn build_image_input(&self, frame: &Frame, signed: bool) -> Result<Tensor> {
        let ClassifierInput::Image { width, height } = self.input else {
            return Err(anyhow!("classifier does not take images"));
        };
        if frame.width == 0 || frame.height == 0 {
            return Err(anyhow!("frame has no pixels"));
        }
        let (src_w, src_h) = frame.oriented_size();
        let (src_w, src_h) = (src_w as usize, src_h as usize);
        let (dst_w, dst_h) = (width as usize, height as usize);

        // Nearest-neighbour resize of the upright image into NHWC.
        let shape = (1, dst_h, dst_w, 3);
        let input = tract_ndarray::Array4::from_shape_fn(shape, |(_, y, x, c)| {
            let sy = (y * src_h / dst_h) as u32;
            let sx = (x * src_w / dst_w) as u32;
            let v = frame.upright_rgb(sx, sy).map_or(0.0, |rgb| rgb[c] as f32 / 255.0);
            if signed {
                v * 2.0 - 1.0
            } else {
                v
            }
        });
        Ok(input.into_tensor())
    }
}

fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read labels {}", path.display()))?;
    let labels: Vec<String> = serde_json::from_str(&raw).with_context(|| {
        format!(
            "labels file {} must be a JSON array of strings",
            path.display()
        )
    })?;
    if labels.is_empty() {
        return Err(anyhow!("labels file {} is empty", path.display()));
    }
    Ok(labels)
}

impl GestureClassifier for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn input_kind(&self) -> ClassifierInput {
        self.input
    }

    fn is_ready(&self) -> bool {
        self.model.is_some() && !self.labels.is_empty()
    }

    fn classify_features(&mut self, features: &[f32]) -> Result<Option<Prediction>> {
        let ClassifierInput::Features { len } = self.input else {
            return Ok(None);
        };
        if features.is_empty() {
            return Ok(None);
        }
        if features.len() != len {
            return Err(anyhow!(
                "feature vector has {} values, model expects {}",
                features.len(),
                len
            ));
        }
        let input = tract_ndarray::Array2::from_shape_vec((1, len), features.to_vec())
            .context("failed to shape feature input")?
            .into_tensor();
        let best = self.run(input)?;
        Ok(self.prediction(best))
    }

    fn classify_image(&mut self, frame: &Frame) -> Result<Option<Prediction>> {
        if !matches!(self.input, ClassifierInput::Image { .. }) {
            return Ok(None);
        }
        let mut best = self.run(self.build_image_input(frame, false)?)?;
        if best.map_or(true, |(_, score)| score < LOW_SCORE_RETRY) {
            let retry = self.run(self.build_image_input(frame, true)?)?;
            log::debug!("low-score retry with [-1, 1] scaling: {:?} -> {:?}", best, retry);
            if retry.map(|(_, s)| s) > best.map(|(_, s)| s) {
                best = retry;
            }
        }
        Ok(self.prediction(best))
    }

    fn close(&mut self) {
        self.model = None;
    }
}
