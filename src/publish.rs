//! Published recognition output.
//!
//! The pipeline writes one `Publication` per processed frame; UI observers read
//! the latest value or block until it changes.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::pipeline::SessionId;

/// Current stable label as shown to the learner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Publication {
    pub session: Option<SessionId>,
    /// Stable classifier label, if any.
    pub label: Option<String>,
    pub word: Option<String>,
    pub translation: Option<String>,
    /// Window-average confidence (0 when no label is stable).
    pub confidence: f32,
}

impl Publication {
    pub fn cleared(session: Option<SessionId>) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }
}

struct Slot {
    value: Publication,
    version: u64,
}

/// Latest-value cell shared between the pipeline and its observers.
#[derive(Clone)]
pub struct StablePublisher {
    inner: Arc<(Mutex<Slot>, Condvar)>,
}

impl StablePublisher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(Slot {
                    value: Publication::default(),
                    version: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the published value and wake observers.
    pub fn publish(&self, value: Publication) {
        let mut slot = self.lock();
        slot.value = value;
        slot.version += 1;
        self.inner.1.notify_all();
    }

    pub fn latest(&self) -> Publication {
        self.lock().value.clone()
    }

    /// Incremented on every publish.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Wait until the version moves past `since`. Returns the new value and
    /// version, or `None` on timeout.
    pub fn wait_for_change(&self, since: u64, timeout: Duration) -> Option<(Publication, u64)> {
        let slot = self.lock();
        let (slot, result) = self
            .inner
            .1
            .wait_timeout_while(slot, timeout, |s| s.version <= since)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if result.timed_out() && slot.version <= since {
            return None;
        }
        Some((slot.value.clone(), slot.version))
    }
}

impl Default for StablePublisher {
    fn default() -> Self {
        Self::new()
    }
}
