//! Sign Translator Kernel
//!
//! This crate implements the live recognition pipeline of a sign-language
//! tutor: camera frames go in, a stable sign label comes out.
//!
//! # Architecture
//!
//! Each processed frame flows through:
//!
//! 1. **Landmark source**: 21 normalized points per detected hand.
//! 2. **Feature extraction**: wrist-relative, scale-normalized vector.
//! 3. **Classification**: one `(label, confidence)` prediction per frame.
//! 4. **Motion gate**: in alphabet mode, only still hands are classified.
//! 5. **Stabilization**: windowed majority vote with a confidence floor.
//! 6. **Publication**: the stable label and its catalog text, for the UI.
//!
//! The landmark model and the classifier are black boxes behind the
//! `LandmarkSource` and `GestureClassifier` traits.
//!
//! # Module Structure
//!
//! - `landmark`, `features`, `stabilizer`, `motion`: pure recognition logic
//! - `pipeline`: the `Translator` state machine, sessions, frame worker
//! - `detect`: backend traits, registry, built-in backends
//! - `frame`, `ingest`: frames, keep-only-latest slot, synthetic source
//! - `catalog`, `publish`, `overlay`: display-side helpers
//! - `config`: file + environment configuration

pub mod catalog;
pub mod config;
pub mod detect;
pub mod features;
pub mod frame;
pub mod ingest;
pub mod landmark;
pub mod motion;
pub mod overlay;
pub mod pipeline;
pub mod publish;
pub mod stabilizer;

pub use catalog::{normalize_alphabet_label, CatalogEntry, LabelCatalog};
pub use config::TranslatorConfig;
pub use detect::{BackendRegistry, GestureClassifier, LandmarkSource, Readiness};
pub use features::extract_features;
pub use frame::Frame;
pub use ingest::{LatestFrame, SyntheticSource};
pub use landmark::{Hand, HandFrame, Handedness, Landmark};
pub use motion::{MotionGate, StillnessTracker};
pub use overlay::OverlayMapper;
pub use pipeline::{
    DetectionState, FrameOutcome, FrameTicket, PipelineSettings, RecognitionMode, SessionId,
    SharedTranslator, Translator,
};
pub use publish::{Publication, StablePublisher};
pub use stabilizer::{LabelHistory, Prediction, StabilizerPolicy, StableResult, Stabilizer};
