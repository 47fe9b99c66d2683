//! Per-frame recognition pipeline.
//!
//! `Translator` owns the landmark source, the classifier, the stabilization
//! window and the stillness tracker. Every mutation goes through its per-frame
//! entry points (`process_frame`, or `begin_frame` + `complete` when landmark
//! results arrive asynchronously), so none of that state is shared.
//!
//! Frame flow while detecting:
//! 1. landmark source → first hand
//! 2. feature extraction → classifier (or the frame itself for image models)
//! 3. stillness gate in alphabet mode
//! 4. accepted prediction, or an empty entry, into the window
//! 5. stable label voted against recent stable labels, then published
//!
//! Per-frame failures never escape: they become empty entries, which only
//! dilute the window.

mod session;
pub mod worker;

pub use session::{DetectionState, FrameOutcome, FrameTicket, RecognitionMode, SessionId};
pub use worker::{spawn as spawn_worker, WorkerHandle};

use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::catalog::{normalize_alphabet_label, LabelCatalog};
use crate::detect::{ClassifierInput, GestureClassifier, LandmarkSource, Readiness};
use crate::features::extract_features;
use crate::frame::Frame;
use crate::landmark::{Hand, HandFrame};
use crate::motion::{
    MotionGate, StillnessTracker, DEFAULT_REQUIRED_STILL_FRAMES, DEFAULT_STILL_THRESHOLD,
};
use crate::publish::{Publication, StablePublisher};
use crate::stabilizer::{LabelHistory, Prediction, StabilizerPolicy, StableResult, Stabilizer};

/// Translator shared with a frame worker or an asynchronous landmark callback.
pub type SharedTranslator = Arc<Mutex<Translator>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineSettings {
    pub policy: StabilizerPolicy,
    pub still_threshold: f32,
    pub required_still_frames: u32,
    pub mode: RecognitionMode,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            policy: StabilizerPolicy::default(),
            still_threshold: DEFAULT_STILL_THRESHOLD,
            required_still_frames: DEFAULT_REQUIRED_STILL_FRAMES,
            mode: RecognitionMode::Words,
        }
    }
}

/// Counters for the current session, or the last one while idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_applied: u64,
    pub frames_without_hands: u64,
    pub landmark_failures: u64,
    pub classifier_failures: u64,
    /// Predictions replaced by an empty entry because the hand was moving.
    pub gated_out: u64,
    /// Results discarded because their session had ended.
    pub stale_discarded: u64,
}

struct Backends {
    source: Box<dyn LandmarkSource>,
    classifier: Box<dyn GestureClassifier>,
}

pub struct Translator {
    settings: PipelineSettings,
    backends: Option<Backends>,
    readiness: Readiness,
    catalog: LabelCatalog,
    stabilizer: Stabilizer,
    history: LabelHistory,
    stillness: StillnessTracker,
    state: DetectionState,
    last_session: u64,
    next_sequence: u64,
    last_hands: Option<HandFrame>,
    publisher: StablePublisher,
    stats: PipelineStats,
}

impl Translator {
    pub fn new(
        settings: PipelineSettings,
        source: Box<dyn LandmarkSource>,
        classifier: Box<dyn GestureClassifier>,
        catalog: LabelCatalog,
    ) -> Self {
        let readiness = if classifier.is_ready() {
            Readiness::Ready
        } else {
            Readiness::Disabled(format!("classifier '{}' is not ready", classifier.name()))
        };
        let mut translator = Self::with_readiness(settings, readiness, catalog);
        translator.backends = Some(Backends { source, classifier });
        translator.report_readiness();
        translator
    }

    /// Translator whose backends failed to initialize. Frames are accepted and
    /// always yield "no prediction".
    pub fn unavailable(
        settings: PipelineSettings,
        reason: impl Into<String>,
        catalog: LabelCatalog,
    ) -> Self {
        let translator =
            Self::with_readiness(settings, Readiness::Disabled(reason.into()), catalog);
        translator.report_readiness();
        translator
    }

    /// Build from the outcome of backend initialization.
    pub fn from_init(
        settings: PipelineSettings,
        init: Result<(Box<dyn LandmarkSource>, Box<dyn GestureClassifier>)>,
        catalog: LabelCatalog,
    ) -> Self {
        match init {
            Ok((source, classifier)) => Self::new(settings, source, classifier, catalog),
            Err(e) => Self::unavailable(settings, format!("{:#}", e), catalog),
        }
    }

    fn with_readiness(
        settings: PipelineSettings,
        readiness: Readiness,
        catalog: LabelCatalog,
    ) -> Self {
        Self {
            stabilizer: Stabilizer::from_policy(&settings.policy),
            history: LabelHistory::default(),
            stillness: StillnessTracker::new(
                MotionGate::new(settings.still_threshold),
                settings.required_still_frames,
            ),
            settings,
            backends: None,
            readiness,
            catalog,
            state: DetectionState::Idle,
            last_session: 0,
            next_sequence: 0,
            last_hands: None,
            publisher: StablePublisher::new(),
            stats: PipelineStats::default(),
        }
    }

    fn report_readiness(&self) {
        match &self.readiness {
            Readiness::Ready => log::info!(
                "translator ready (window={}, min_support={}, min_avg_confidence={:.2}, mode={:?})",
                self.settings.policy.window_size,
                self.settings.policy.min_support,
                self.settings.policy.min_avg_confidence,
                self.settings.mode
            ),
            Readiness::Disabled(reason) => {
                log::error!("gesture recognition disabled: {}", reason)
            }
        }
    }

    pub fn into_shared(self) -> SharedTranslator {
        Arc::new(Mutex::new(self))
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    pub fn is_detecting(&self) -> bool {
        matches!(self.state, DetectionState::Detecting(_))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn mode(&self) -> RecognitionMode {
        self.settings.mode
    }

    /// Switch recognition mode.
    ///
    /// Predictions buffered under the old mode never passed the new mode's
    /// gate, so the window and the published label start over.
    pub fn set_mode(&mut self, mode: RecognitionMode) {
        if self.settings.mode == mode {
            return;
        }
        log::info!("recognition mode {:?} -> {:?}", self.settings.mode, mode);
        self.settings.mode = mode;
        self.reset_recognition();
        self.publisher.publish(Publication::cleared(self.session()));
    }

    /// Observer handle for the published label.
    pub fn publisher(&self) -> StablePublisher {
        self.publisher.clone()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    /// Most recent landmark result, for the overlay.
    pub fn last_hands(&self) -> Option<&HandFrame> {
        self.last_hands.as_ref()
    }

    /// Current stable result of the window.
    pub fn stable(&self) -> Option<StableResult> {
        self.stabilizer.stable(&self.settings.policy)
    }

    pub fn window_len(&self) -> usize {
        self.stabilizer.len()
    }

    fn session(&self) -> Option<SessionId> {
        match self.state {
            DetectionState::Detecting(session) => Some(session),
            DetectionState::Idle => None,
        }
    }

    /// Idle → Detecting. Starting while detecting opens a fresh session.
    pub fn start(&mut self) -> SessionId {
        self.last_session += 1;
        let session = SessionId(self.last_session);
        self.reset_transient();
        self.stats = PipelineStats::default();
        self.state = DetectionState::Detecting(session);
        self.publisher.publish(Publication::cleared(Some(session)));
        log::info!("detection started ({})", session);
        session
    }

    /// Detecting → Idle. Clears every buffered prediction and the published label.
    pub fn stop(&mut self) {
        if let DetectionState::Detecting(session) = self.state {
            log::info!(
                "detection stopped ({}, {} frames applied)",
                session,
                self.stats.frames_applied
            );
        }
        self.state = DetectionState::Idle;
        self.reset_transient();
        self.publisher.publish(Publication::cleared(None));
    }

    fn reset_transient(&mut self) {
        self.reset_recognition();
        self.last_hands = None;
        self.next_sequence = 0;
    }

    fn reset_recognition(&mut self) {
        self.stabilizer.clear();
        self.history.clear();
        self.stillness.reset();
    }

    /// Reserve a ticket for a frame about to be sent to the landmark source.
    /// Returns `None` while idle.
    pub fn begin_frame(&mut self) -> Option<FrameTicket> {
        let DetectionState::Detecting(session) = self.state else {
            return None;
        };
        self.next_sequence += 1;
        Some(FrameTicket {
            session,
            sequence: self.next_sequence,
        })
    }

    fn is_current(&self, ticket: &FrameTicket) -> bool {
        self.state == DetectionState::Detecting(ticket.session)
    }

    /// Apply a landmark result. `frame` is needed only by image classifiers.
    ///
    /// Returns the new publication, or `None` when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: FrameTicket,
        outcome: FrameOutcome,
        frame: Option<&Frame>,
    ) -> Option<Publication> {
        if !self.is_current(&ticket) {
            self.stats.stale_discarded += 1;
            log::debug!(
                "discarding result for {} frame {} (state {:?})",
                ticket.session,
                ticket.sequence,
                self.state
            );
            return None;
        }

        match outcome {
            FrameOutcome::Hands(hands) => match hands.primary().cloned() {
                Some(hand) => {
                    self.apply_hand(&hand, frame);
                    self.last_hands = Some(hands);
                }
                None => {
                    self.stats.frames_without_hands += 1;
                    self.apply_no_hand();
                    self.last_hands = Some(hands);
                }
            },
            FrameOutcome::Failed(reason) => {
                self.stats.landmark_failures += 1;
                log::debug!("landmark failed for frame {}: {}", ticket.sequence, reason);
                self.apply_no_hand();
                self.last_hands = None;
            }
            FrameOutcome::NotReady => {
                self.apply_no_hand();
                self.last_hands = None;
            }
        }

        self.stats.frames_applied += 1;
        Some(self.publish_current())
    }

    /// Run one frame end to end. Returns `None` while idle.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<Publication> {
        let ticket = self.begin_frame()?;
        let outcome = match (&self.readiness, self.backends.as_mut()) {
            (Readiness::Ready, Some(backends)) => match backends.source.detect(frame) {
                Ok(hands) => FrameOutcome::Hands(hands),
                Err(e) => FrameOutcome::Failed(format!("{:#}", e)),
            },
            _ => FrameOutcome::NotReady,
        };
        self.complete(ticket, outcome, Some(frame))
    }

    fn apply_no_hand(&mut self) {
        self.stabilizer.push_empty();
        self.stillness.reset();
    }

    fn apply_hand(&mut self, hand: &Hand, frame: Option<&Frame>) {
        let prediction = self.classify(hand, frame);
        let allowed = match self.settings.mode {
            RecognitionMode::Alphabet => self.stillness.observe(hand),
            RecognitionMode::Words => {
                self.stillness.remember(hand);
                true
            }
        };
        match prediction {
            Some(p) if allowed => self.stabilizer.push(p),
            Some(_) => {
                self.stats.gated_out += 1;
                self.stabilizer.push_empty();
            }
            None => self.stabilizer.push_empty(),
        }
    }

    fn classify(&mut self, hand: &Hand, frame: Option<&Frame>) -> Option<Prediction> {
        if !self.readiness.is_ready() {
            return None;
        }
        let classifier = &mut self.backends.as_mut()?.classifier;
        let result = match classifier.input_kind() {
            ClassifierInput::Features { .. } => {
                let features = extract_features(hand.landmarks());
                if features.is_empty() {
                    return None;
                }
                classifier.classify_features(&features)
            }
            ClassifierInput::Image { .. } => match frame {
                Some(frame) => classifier.classify_image(frame),
                None => {
                    log::debug!("image classifier needs the frame; skipping");
                    return None;
                }
            },
        };
        match result {
            Ok(prediction) => prediction.map(sanitize),
            Err(e) => {
                self.stats.classifier_failures += 1;
                log::debug!("classification failed: {:#}", e);
                None
            }
        }
    }

    fn publish_current(&mut self) -> Publication {
        let session = self.session();
        let stable = self.stable();
        let smoothed = stable.as_ref().map(|s| self.history.smooth(&s.label));
        let label = smoothed.and_then(|label| match self.settings.mode {
            RecognitionMode::Alphabet => normalize_alphabet_label(&label),
            RecognitionMode::Words => Some(label),
        });

        let publication = match (label, stable) {
            (Some(label), Some(stable)) => {
                let (word, translation) = self.catalog.display(&label);
                Publication {
                    session,
                    label: Some(label),
                    word: Some(word),
                    translation: Some(translation),
                    confidence: stable.confidence,
                }
            }
            _ => Publication::cleared(session),
        };
        self.publisher.publish(publication.clone());
        publication
    }

    /// Release the landmark source and classifier. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut backends) = self.backends.take() {
            backends.source.close();
            backends.classifier.close();
            log::info!(
                "recognition backends released ({} / {})",
                backends.source.name(),
                backends.classifier.name()
            );
        }
        if self.is_detecting() {
            self.stop();
        }
        self.readiness = Readiness::Disabled("translator closed".to_string());
    }
}

impl Drop for Translator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Clamp model scores into [0, 1]; non-finite scores count as zero.
fn sanitize(mut prediction: Prediction) -> Prediction {
    prediction.confidence = if prediction.confidence.is_finite() {
        prediction.confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    prediction
}
