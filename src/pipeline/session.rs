use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Identifies one detection period (from `start` to `stop`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionState {
    Idle,
    Detecting(SessionId),
}

/// Pairs a submitted frame with the session that submitted it.
///
/// Results carrying a ticket from an earlier session are discarded, so a late
/// callback can never repopulate state that `stop` already cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTicket {
    pub session: SessionId,
    /// Per-session submission order, starting at 1.
    pub sequence: u64,
}

/// What the landmark stage produced for one ticket.
#[derive(Clone, Debug)]
pub enum FrameOutcome {
    Hands(crate::landmark::HandFrame),
    Failed(String),
    NotReady,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    /// Any catalog sign; predictions enter the window immediately.
    #[default]
    Words,
    /// Fingerspelled letters and digits; predictions need a still hand and
    /// labels are normalized to a single character.
    Alphabet,
}

impl FromStr for RecognitionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "words" | "word" => Ok(RecognitionMode::Words),
            "alphabet" | "letters" => Ok(RecognitionMode::Alphabet),
            other => Err(anyhow!(
                "unknown recognition mode '{}' (expected words or alphabet)",
                other
            )),
        }
    }
}
