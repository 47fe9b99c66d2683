//! Frame acquisition.
//!
//! Sources produce `Frame`s at a target rate. Between the source and the
//! recognition worker sits a single-slot `LatestFrame` mailbox: when the worker
//! is still busy, a newer frame replaces the unconsumed one instead of queueing
//! behind it. Backpressure lives here, not inside the pipeline.
//!
//! Sources MUST NOT:
//! - Store frames to disk
//! - Retain frames beyond handoff to the slot

pub mod latest;
pub mod synthetic;

pub use latest::{LatestFrame, SlotStats};
pub use synthetic::{SourceConfig, SourceStats, SyntheticSource};
