//! Keep-only-latest frame slot.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::frame::Frame;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotStats {
    pub offered: u64,
    pub taken: u64,
    /// Frames replaced before the consumer picked them up.
    pub dropped: u64,
}

impl SlotStats {
    /// Frames that reached, or are about to reach, the consumer.
    pub fn delivered(&self) -> u64 {
        self.offered - self.dropped
    }
}

struct SlotState {
    frame: Option<Frame>,
    closed: bool,
    stats: SlotStats,
}

/// Single-slot mailbox shared by one producer and one consumer.
pub struct LatestFrame {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                frame: None,
                closed: false,
                stats: SlotStats::default(),
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Offer a frame, replacing any frame not yet taken. Returns false once closed.
    pub fn offer(&self, frame: Frame) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.stats.offered += 1;
        if let Some(old) = state.frame.replace(frame) {
            state.stats.dropped += 1;
            log::trace!("dropping unconsumed frame #{}", old.sequence);
        }
        self.ready.notify_one();
        true
    }

    /// Take the pending frame without waiting.
    pub fn try_take(&self) -> Option<Frame> {
        let mut state = self.lock();
        let frame = state.frame.take();
        if frame.is_some() {
            state.stats.taken += 1;
        }
        frame
    }

    /// Wait up to `timeout` for a frame. Returns `None` on timeout or once closed and drained.
    pub fn take_timeout(&self, timeout: Duration) -> Option<Frame> {
        let state = self.lock();
        let (mut state, _) = self
            .ready
            .wait_timeout_while(state, timeout, |s| s.frame.is_none() && !s.closed)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let frame = state.frame.take();
        if frame.is_some() {
            state.stats.taken += 1;
        }
        frame
    }

    /// Stop accepting frames and wake any waiting consumer.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn stats(&self) -> SlotStats {
        self.lock().stats
    }
}

impl Default for LatestFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn newer_frame_replaces_unconsumed_one() {
        let slot = LatestFrame::new();
        assert!(slot.offer(Frame::blank(2, 2, 1)));
        assert!(slot.offer(Frame::blank(2, 2, 2)));
        assert!(slot.offer(Frame::blank(2, 2, 3)));

        let frame = slot.try_take().expect("pending frame");
        assert_eq!(frame.sequence, 3);
        assert!(slot.try_take().is_none());

        let stats = slot.stats();
        assert_eq!(stats.offered, 3);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.taken, 1);
        assert_eq!(stats.delivered(), 1);
    }

    #[test]
    fn pending_frame_counts_as_delivered() {
        let slot = LatestFrame::new();
        slot.offer(Frame::blank(2, 2, 1));
        slot.try_take().unwrap();
        slot.offer(Frame::blank(2, 2, 2));
        slot.offer(Frame::blank(2, 2, 3));
        let stats = slot.stats();
        assert_eq!(stats.taken, 1);
        assert_eq!(stats.delivered(), 2);
    }

    #[test]
    fn closed_slot_rejects_frames_and_wakes_consumer() {
        let slot = Arc::new(LatestFrame::new());
        let consumer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || slot.take_timeout(Duration::from_secs(5)))
        };
        std::thread::sleep(Duration::from_millis(20));
        slot.close();
        assert!(consumer.join().unwrap().is_none());
        assert!(!slot.offer(Frame::blank(2, 2, 9)));
        assert!(slot.is_closed());
    }

    #[test]
    fn take_timeout_returns_pending_frame() {
        let slot = LatestFrame::new();
        slot.offer(Frame::blank(2, 2, 4));
        let frame = slot.take_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(frame.sequence, 4);
        assert!(slot.take_timeout(Duration::from_millis(10)).is_none());
    }
}
