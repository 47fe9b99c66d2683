//! Temporal stabilization of per-frame predictions.
//!
//! Single-frame classifications flicker. The stabilizer keeps a bounded FIFO
//! window of the most recent predictions and reports the majority label only
//! when it has enough support and the window's mean confidence is high enough.
//!
//! Tie-break policy: when two labels share the highest count, the one whose
//! most recent occurrence is newest wins.
//!
//! `LabelHistory` runs a second, coarser vote over the labels the window has
//! already settled on, so a single flip of the stable label does not reach the
//! display.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_MIN_SUPPORT: usize = DEFAULT_WINDOW_SIZE / 2;
pub const DEFAULT_MIN_AVG_CONFIDENCE: f32 = 0.35;
pub const DEFAULT_LABEL_HISTORY: usize = 7;

/// One classified frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// The "no hand / rejected / failed" entry.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
}

/// Tuning knobs trading responsiveness against stability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilizerPolicy {
    pub window_size: usize,
    pub min_support: usize,
    pub min_avg_confidence: f32,
}

impl Default for StabilizerPolicy {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_support: DEFAULT_MIN_SUPPORT,
            min_avg_confidence: DEFAULT_MIN_AVG_CONFIDENCE,
        }
    }
}

impl StabilizerPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(anyhow!("window_size must be at least 1"));
        }
        if self.min_support == 0 || self.min_support > self.window_size {
            return Err(anyhow!(
                "min_support must be in 1..={} (got {})",
                self.window_size,
                self.min_support
            ));
        }
        if !(0.0..=1.0).contains(&self.min_avg_confidence) {
            return Err(anyhow!(
                "min_avg_confidence must be within 0..=1 (got {})",
                self.min_avg_confidence
            ));
        }
        Ok(())
    }
}

/// Majority label of the window with the window's mean confidence.
#[derive(Clone, Debug, PartialEq)]
pub struct StableResult {
    pub label: String,
    pub confidence: f32,
    pub support: usize,
}

/// Bounded FIFO window of predictions.
pub struct Stabilizer {
    window: VecDeque<Prediction>,
    capacity: usize,
}

impl Stabilizer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_policy(policy: &StabilizerPolicy) -> Self {
        Self::new(policy.window_size)
    }

    /// Append a prediction, evicting the oldest entry when full.
    pub fn push(&mut self, prediction: Prediction) {
        while self.window.len() >= self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(prediction);
    }

    /// Append a no-hand entry so stale predictions decay out of the window.
    pub fn push_empty(&mut self) {
        self.push(Prediction::empty());
    }

    pub fn stable(&self, policy: &StabilizerPolicy) -> Option<StableResult> {
        if self.window.is_empty() {
            return None;
        }

        // label -> (count, index of latest occurrence)
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (idx, p) in self.window.iter().enumerate() {
            if p.is_empty() {
                continue;
            }
            let entry = counts.entry(p.label.as_str()).or_insert((0, idx));
            entry.0 += 1;
            entry.1 = idx;
        }

        let (label, (support, _)) = counts
            .into_iter()
            .max_by_key(|(_, (count, latest))| (*count, *latest))?;

        let confidence = self.average_confidence();
        if support >= policy.min_support && confidence >= policy.min_avg_confidence {
            Some(StableResult {
                label: label.to_string(),
                confidence,
                support,
            })
        } else {
            None
        }
    }

    /// Mean confidence over every entry in the window, empty ones included.
    pub fn average_confidence(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().map(|p| p.confidence).sum::<f32>() / self.window.len() as f32
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Prediction> {
        self.window.iter()
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

/// Majority over the most recent stable labels.
///
/// Ties keep the label that entered the history first.
pub struct LabelHistory {
    labels: VecDeque<String>,
    capacity: usize,
}

impl LabelHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            labels: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a stable label and return the label to display.
    pub fn smooth(&mut self, label: &str) -> String {
        while self.labels.len() >= self.capacity {
            self.labels.pop_front();
        }
        self.labels.push_back(label.to_string());

        // label -> (count, index of first occurrence)
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        for (idx, l) in self.labels.iter().enumerate() {
            counts.entry(l.as_str()).or_insert((0, idx)).0 += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, (count, first))| (*count, Reverse(*first)))
            .map(|(l, _)| l.to_string())
            .unwrap_or_else(|| label.to_string())
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelHistory {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_HISTORY)
    }
}
