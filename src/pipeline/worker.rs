//! Background worker that drains a `LatestFrame` slot into a shared translator.
//!
//! The camera thread only ever offers frames; anything the worker is too slow
//! to pick up is replaced in the slot, so the translator always sees the
//! freshest frame and never builds a backlog.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{SharedTranslator, Translator};
use crate::ingest::LatestFrame;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WorkerHandle {
    slot: Arc<LatestFrame>,
    processed: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn frames_processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Close the slot, let the worker drain it, and join the thread.
    pub fn stop(mut self) -> Result<()> {
        self.slot.close();
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("frame worker thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.slot.close();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Lock a shared translator, recovering from a poisoned mutex.
pub fn lock(shared: &SharedTranslator) -> MutexGuard<'_, Translator> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn spawn(translator: SharedTranslator, slot: Arc<LatestFrame>) -> Result<WorkerHandle> {
    let processed = Arc::new(AtomicU64::new(0));
    let worker_slot = slot.clone();
    let worker_processed = processed.clone();
    let join = std::thread::Builder::new()
        .name("sign-worker".to_string())
        .spawn(move || run_worker(translator, worker_slot, worker_processed))?;

    Ok(WorkerHandle {
        slot,
        processed,
        join: Some(join),
    })
}

fn run_worker(translator: SharedTranslator, slot: Arc<LatestFrame>, processed: Arc<AtomicU64>) {
    log::debug!("frame worker started");
    loop {
        let Some(frame) = slot.take_timeout(POLL_INTERVAL) else {
            if slot.is_closed() {
                break;
            }
            continue;
        };
        if frame.age() > Duration::from_secs(1) {
            log::debug!("frame #{} is {:?} old", frame.sequence, frame.age());
        }
        let publication = lock(&translator).process_frame(&frame);
        processed.fetch_add(1, Ordering::SeqCst);
        if let Some(p) = publication {
            log::trace!("frame #{} -> {:?}", frame.sequence, p.label);
        }
    }
    log::debug!(
        "frame worker stopped after {} frames",
        processed.load(Ordering::SeqCst)
    );
}
