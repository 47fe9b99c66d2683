//! Landmark trace replay.
//!
//! A trace is a JSON-lines file with one `HandFrame` per captured frame, as
//! recorded from a live hand-pose model. Blank lines stand for frames with no
//! hands. Replay ignores frame pixels and hands out the next recorded result.

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::detect::backend::LandmarkSource;
use crate::frame::Frame;
use crate::landmark::HandFrame;

pub struct ReplayLandmarkSource {
    frames: Vec<HandFrame>,
    cursor: usize,
    looping: bool,
}

impl ReplayLandmarkSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read landmark trace {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid landmark trace {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut frames = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                frames.push(HandFrame::default());
                continue;
            }
            let frame: HandFrame = serde_json::from_str(line)
                .map_err(|e| anyhow!("line {}: {}", lineno + 1, e))?;
            for hand in &frame.hands {
                hand.validate()
                    .map_err(|e| anyhow!("line {}: {}", lineno + 1, e))?;
            }
            frames.push(frame);
        }
        if frames.is_empty() {
            return Err(anyhow!("landmark trace is empty"));
        }
        Ok(Self {
            frames,
            cursor: 0,
            looping: false,
        })
    }

    /// Restart from the first recorded frame once the trace is exhausted.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.looping && self.cursor >= self.frames.len()
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&mut self, frame: &Frame) -> Result<HandFrame> {
        if self.cursor >= self.frames.len() {
            if !self.looping {
                let (w, h) = frame.oriented_size();
                return Ok(HandFrame::empty(w, h));
            }
            self.cursor = 0;
        }
        let result = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(result)
    }
}
