//! Hand landmark data model.
//!
//! Landmarks are 2D points in normalized image coordinates (0..1). A `Hand` is
//! always exactly 21 points in the fixed anatomical order used by hand-pose
//! models: wrist, then thumb, index, middle, ring and pinky joints from base to
//! tip.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Bone connections for overlay rendering.
#[rustfmt::skip]
pub const HAND_SKELETON: [(usize, usize); 20] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP),
    (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP),
    (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP),
    (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP), (RING_MCP, RING_PIP),
    (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP),
    (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse a source-provided category name. Anything unrecognized is `Unknown`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_lowercase()).as_deref() {
            Some("left") => Handedness::Left,
            Some("right") => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

/// One detected hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Handedness,
    #[serde(default)]
    pub confidence: f32,
}

impl Hand {
    /// Build a hand from exactly `LANDMARK_COUNT` points.
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness, confidence: f32) -> Result<Self> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(anyhow!(
                "hand requires {} landmarks, received {}",
                LANDMARK_COUNT,
                landmarks.len()
            ));
        }
        Ok(Self {
            landmarks,
            handedness,
            confidence,
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[WRIST]
    }

    /// Check the point count after deserialization, which bypasses `new`.
    pub fn validate(&self) -> Result<()> {
        if self.landmarks.len() != LANDMARK_COUNT {
            return Err(anyhow!(
                "hand requires {} landmarks, found {}",
                LANDMARK_COUNT,
                self.landmarks.len()
            ));
        }
        Ok(())
    }
}

/// Result of running a landmark source on one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    #[serde(default)]
    pub hands: Vec<Hand>,
    /// Handedness score of the first hand (0 when no hand is present).
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
}

impl HandFrame {
    pub fn empty(image_width: u32, image_height: u32) -> Self {
        Self {
            hands: Vec::new(),
            confidence: 0.0,
            image_width,
            image_height,
        }
    }

    pub fn with_hands(hands: Vec<Hand>, image_width: u32, image_height: u32) -> Self {
        let confidence = hands.first().map(|h| h.confidence).unwrap_or(0.0);
        Self {
            hands,
            confidence,
            image_width,
            image_height,
        }
    }

    pub fn primary(&self) -> Option<&Hand> {
        self.hands.first()
    }
}
