//! The one slot shared between the recognition loop and the render loop.
//!
//! The recognizer [`publish`](DisplayHandle::publish)es a whole
//! [`DisplayState`]; the renderer takes a cloned [`DisplaySnapshot`] once
//! per tick.  Tag and payload travel together under one lock, so a reader
//! can never see a new tag with an old payload.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use led_ring::{DisplaySnapshot, DisplayState};

#[derive(Clone, Debug, Default)]
pub struct DisplayHandle {
    slot: Arc<Mutex<DisplaySnapshot>>,
}

impl DisplayHandle {
    pub fn new() -> Self {
        DisplayHandle::default()
    }

    /// Replace the published state.  Returns the new generation.
    pub fn publish(&self, state: DisplayState) -> u64 {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.state = state;
        slot.generation
    }

    /// Copy of the latest published snapshot.
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.lock().clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    // A panicking writer cannot leave a half-written snapshot behind: the
    // assignment in `publish` is a single move.  Keep rendering.
    fn lock(&self) -> MutexGuard<'_, DisplaySnapshot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
