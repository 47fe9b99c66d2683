use anyhow::{anyhow, Result};
use rand::Rng;
use std::collections::VecDeque;

use crate::detect::backend::LandmarkSource;
use crate::features::extract_features;
use crate::frame::Frame;
use crate::landmark::{Hand, HandFrame, Handedness, Landmark, LANDMARK_COUNT};

/// Landmark source that replays a fixed script, one step per frame.
///
/// `Err` steps simulate a model failure for that frame. Once the script is
/// exhausted every frame reports no hands.
pub struct ScriptedLandmarkSource {
    script: VecDeque<std::result::Result<HandFrame, String>>,
    closed: bool,
}

impl ScriptedLandmarkSource {
    pub fn new(script: Vec<std::result::Result<HandFrame, String>>) -> Self {
        Self {
            script: script.into(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LandmarkSource for ScriptedLandmarkSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, frame: &Frame) -> Result<HandFrame> {
        if self.closed {
            return Err(anyhow!("landmark source closed"));
        }
        match self.script.pop_front() {
            Some(Ok(hands)) => Ok(hands),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => {
                let (w, h) = frame.oriented_size();
                Ok(HandFrame::empty(w, h))
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.script.clear();
    }
}

const WIDE_SPREAD: f32 = 0.04;
const NARROW_SPREAD: f32 = 0.015;

/// Labels of the two synthetic poses, in cycle order.
pub const SYNTHETIC_LABELS: [&str; 2] = ["open", "closed"];

/// Landmark source that synthesizes a hand for demos (`stub://` sources).
///
/// Per cycle of `hold_frames + move_frames` frames, the hand holds a pose with
/// sub-threshold jitter, then sweeps sideways. Poses alternate between cycles.
/// Every `gap_every`-th cycle the hand leaves the frame for the move phase.
pub struct SyntheticLandmarkSource {
    hold_frames: u64,
    move_frames: u64,
    gap_every: u64,
    jitter: f32,
}

impl SyntheticLandmarkSource {
    pub fn new(hold_frames: u64, move_frames: u64) -> Self {
        Self {
            hold_frames: hold_frames.max(1),
            move_frames,
            gap_every: 4,
            jitter: 0.0005,
        }
    }

    /// One centroid per synthetic pose, keyed by `SYNTHETIC_LABELS`.
    pub fn reference_centroids() -> Vec<(String, Vec<f32>)> {
        SYNTHETIC_LABELS
            .iter()
            .zip([WIDE_SPREAD, NARROW_SPREAD])
            .map(|(label, spread)| {
                let points = pose(Landmark::new(0.5, 0.65), spread, 0.0);
                (label.to_string(), extract_features(&points))
            })
            .collect()
    }
}

fn pose(origin: Landmark, spread: f32, jitter: f32) -> Vec<Landmark> {
    let mut rng = rand::thread_rng();
    let mut noise = move || {
        if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        }
    };
    (0..LANDMARK_COUNT)
        .map(|i| {
            let (dx, dy) = if i == 0 {
                (0.0, 0.0)
            } else {
                let finger = (i - 1) / 4;
                let joint = (i - 1) % 4 + 1;
                ((finger as f32 - 2.0) * spread, -(joint as f32) * 0.05)
            };
            Landmark::new(origin.x + dx + noise(), origin.y + dy + noise())
        })
        .collect()
}

impl Default for SyntheticLandmarkSource {
    fn default() -> Self {
        Self::new(30, 10)
    }
}

impl LandmarkSource for SyntheticLandmarkSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn detect(&mut self, frame: &Frame) -> Result<HandFrame> {
        let (w, h) = frame.oriented_size();
        let cycle_len = self.hold_frames + self.move_frames;
        let cycle = frame.sequence / cycle_len;
        let phase = frame.sequence % cycle_len;

        // Alternate poses between cycles so the classifier sees different signs.
        let spread = if cycle % 2 == 0 {
            WIDE_SPREAD
        } else {
            NARROW_SPREAD
        };

        if phase < self.hold_frames {
            let points = pose(Landmark::new(0.5, 0.65), spread, self.jitter);
            let hand = Hand::new(points, Handedness::Right, 0.92)?;
            return Ok(HandFrame::with_hands(vec![hand], w, h));
        }

        if self.gap_every > 0 && cycle % self.gap_every == self.gap_every - 1 {
            return Ok(HandFrame::empty(w, h));
        }

        let t = (phase - self.hold_frames) as f32 / self.move_frames.max(1) as f32;
        let points = pose(Landmark::new(0.5 + 0.2 * t, 0.65), spread, self.jitter);
        let hand = Hand::new(points, Handedness::Right, 0.85)?;
        Ok(HandFrame::with_hands(vec![hand], w, h))
    }
}
