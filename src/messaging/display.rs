// Display state - What the presentation layer shows while the engine runs
// Written by the engine every sample, read by the UI without locking

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::sequencer::TRACK_COUNT;

/// Shared display state
/// Thread-safe via atomics; a reader may see values one tick stale
#[derive(Debug)]
pub struct SharedDisplayState {
    running: AtomicBool,
    recording: AtomicBool,
    selected_pattern: AtomicUsize,
    selected_track: AtomicUsize,
    selected_step: AtomicUsize,
    current_steps: [AtomicUsize; TRACK_COUNT],
    gates: [AtomicBool; TRACK_COUNT],
}

impl SharedDisplayState {
    /// Create new shared display state
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::Relaxed);
    }

    /// Selected (pattern, track, step)
    pub fn selection(&self) -> (usize, usize, usize) {
        (
            self.selected_pattern.load(Ordering::Relaxed),
            self.selected_track.load(Ordering::Relaxed),
            self.selected_step.load(Ordering::Relaxed),
        )
    }

    pub fn set_selection(&self, pattern: usize, track: usize, step: usize) {
        self.selected_pattern.store(pattern, Ordering::Relaxed);
        self.selected_track.store(track, Ordering::Relaxed);
        self.selected_step.store(step, Ordering::Relaxed);
    }

    /// Step under the play-head of a track
    pub fn current_step(&self, track: usize) -> usize {
        self.current_steps[track.min(TRACK_COUNT - 1)].load(Ordering::Relaxed)
    }

    /// Whether a track's gate output is high
    pub fn gate(&self, track: usize) -> bool {
        self.gates[track.min(TRACK_COUNT - 1)].load(Ordering::Relaxed)
    }

    pub fn set_track(&self, track: usize, current_step: usize, gate: bool) {
        let track = track.min(TRACK_COUNT - 1);
        self.current_steps[track].store(current_step, Ordering::Relaxed);
        self.gates[track].store(gate, Ordering::Relaxed);
    }
}

impl Default for SharedDisplayState {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(false),
            recording: AtomicBool::new(false),
            selected_pattern: AtomicUsize::new(0),
            selected_track: AtomicUsize::new(0),
            selected_step: AtomicUsize::new(0),
            current_steps: std::array::from_fn(|_| AtomicUsize::new(0)),
            gates: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }
}
