// The one cell shared between the capture thread and the game loop.
// Latest value wins: the writer overwrites, the reader copies out, nobody waits
// on anybody else for longer than a single assignment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::types::{Blob, FrameBuffer};

#[derive(Default)]
pub struct TrackerSlot {
    latest: Mutex<Option<Blob>>,
    preview: Mutex<Option<FrameBuffer>>,
    stop: AtomicBool,
    capture_alive: AtomicBool,
}

// A panic while holding the lock cannot leave a half-written Option behind,
// so a poisoned guard is still good data.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TrackerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest detection (None = nothing found this frame).
    pub fn publish(&self, blob: Option<Blob>) {
        *lock(&self.latest) = blob;
    }

    /// Most recent detection; a slot that was never written reads as None.
    pub fn latest(&self) -> Option<Blob> {
        *lock(&self.latest)
    }

    pub fn publish_preview(&self, frame: FrameBuffer) {
        *lock(&self.preview) = Some(frame);
    }

    /// Hand the newest preview to the caller, leaving the slot empty.
    pub fn take_preview(&self) -> Option<FrameBuffer> {
        lock(&self.preview).take()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn set_capture_alive(&self, alive: bool) {
        self.capture_alive.store(alive, Ordering::Relaxed);
    }

    pub fn capture_alive(&self) -> bool {
        self.capture_alive.load(Ordering::Relaxed)
    }
}
