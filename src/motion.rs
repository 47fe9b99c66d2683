//! Stillness detection between consecutive frames.
//!
//! In precise (alphabet) mode a prediction is admitted only after the hand has
//! been nearly motionless for a few consecutive frames, which filters out
//! classifications made while the hand is still moving into position.

use crate::landmark::{Hand, Landmark};

/// Mean displacement below which a hand counts as still (normalized units).
pub const DEFAULT_STILL_THRESHOLD: f32 = 0.003;

/// Consecutive still frames required before a prediction is admitted.
pub const DEFAULT_REQUIRED_STILL_FRAMES: u32 = 3;

/// Mean Euclidean displacement over corresponding landmark indices.
///
/// Compares the first `min(len)` points. Returns `None` when either side is empty.
pub fn mean_displacement(current: &[Landmark], previous: &[Landmark]) -> Option<f32> {
    let n = current.len().min(previous.len());
    if n == 0 {
        return None;
    }
    let sum: f64 = current
        .iter()
        .zip(previous)
        .map(|(c, p)| c.distance(p) as f64)
        .sum();
    Some((sum / n as f64) as f32)
}

#[derive(Clone, Copy, Debug)]
pub struct MotionGate {
    threshold: f32,
}

impl MotionGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Without a previous sample motion cannot be assessed, so the answer is "not still".
    pub fn is_still(&self, current: &[Landmark], previous: Option<&[Landmark]>) -> bool {
        previous
            .and_then(|prev| mean_displacement(current, prev))
            .is_some_and(|mean| mean < self.threshold)
    }
}

impl Default for MotionGate {
    fn default() -> Self {
        Self::new(DEFAULT_STILL_THRESHOLD)
    }
}

/// Counts consecutive still frames for the primary hand.
pub struct StillnessTracker {
    gate: MotionGate,
    required: u32,
    previous: Option<Vec<Landmark>>,
    still_frames: u32,
}

impl StillnessTracker {
    pub fn new(gate: MotionGate, required: u32) -> Self {
        Self {
            gate,
            required,
            previous: None,
            still_frames: 0,
        }
    }

    /// Record `hand` and report whether it has now been still long enough.
    pub fn observe(&mut self, hand: &Hand) -> bool {
        let current = hand.landmarks();
        if self.gate.is_still(current, self.previous.as_deref()) {
            self.still_frames = self.still_frames.saturating_add(1);
        } else {
            self.still_frames = 0;
        }
        self.previous = Some(current.to_vec());
        self.still_frames >= self.required
    }

    /// Remember `hand` as the previous sample without touching the counter.
    pub fn remember(&mut self, hand: &Hand) {
        self.previous = Some(hand.landmarks().to_vec());
    }

    pub fn still_frames(&self) -> u32 {
        self.still_frames
    }

    pub fn has_history(&self) -> bool {
        self.previous.is_some()
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.still_frames = 0;
    }
}

impl Default for StillnessTracker {
    fn default() -> Self {
        Self::new(MotionGate::default(), DEFAULT_REQUIRED_STILL_FRAMES)
    }
}
