// Edit tools - Copy, paste, erase, randomize, rotate and transpose
//
// These run on the edit path, never inside `process()`. All coordinates are
// clamped by the store accessors.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::store::{Pattern, PatternStore, clamp_pattern, clamp_track};
use super::step::{GateSource, OCTAVE_CENTER, ProbabilityStrategy, Step};
use super::track::Track;
use super::{STEP_COUNT, SUBSTEPS_PER_STEP};

/// Granularity of an edit tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditScope {
    Step,
    Track,
    Pattern,
}

/// Content held by the clipboard
#[derive(Debug, Clone)]
pub enum ClipboardContent {
    Step(Step),
    Track(Box<Track>),
    Pattern(Box<Pattern>),
}

/// Single-slot clipboard for the copy/paste tools
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    content: Option<ClipboardContent>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Option<EditScope> {
        self.content.as_ref().map(|content| match content {
            ClipboardContent::Step(_) => EditScope::Step,
            ClipboardContent::Track(_) => EditScope::Track,
            ClipboardContent::Pattern(_) => EditScope::Pattern,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    /// Capture the selected step, track or pattern
    pub fn copy(
        &mut self,
        store: &PatternStore,
        scope: EditScope,
        pattern: usize,
        track: usize,
        step: usize,
    ) {
        self.content = Some(match scope {
            EditScope::Step => ClipboardContent::Step(*store.step(pattern, track, step)),
            EditScope::Track => ClipboardContent::Track(Box::new(store.track(pattern, track).clone())),
            EditScope::Pattern => ClipboardContent::Pattern(Box::new(store.pattern(pattern).clone())),
        });
        debug!("Copied {:?} at {}/{}/{}", scope, pattern, track, step);
    }

    /// Paste onto the selection at the clipboard's own granularity
    ///
    /// Returns false when the clipboard is empty.
    pub fn paste(&self, store: &mut PatternStore, pattern: usize, track: usize, step: usize) -> bool {
        let Some(content) = self.content.as_ref() else {
            return false;
        };
        match content {
            ClipboardContent::Step(source) => {
                store.step_mut(pattern, track, step).copy_content_from(source);
            }
            ClipboardContent::Track(source) => {
                store.track_mut(pattern, track).copy_content_from(source);
            }
            ClipboardContent::Pattern(source) => {
                store.pattern_mut(pattern).copy_content_from(source);
            }
        }
        debug!("Pasted {:?} at {}/{}/{}", self.scope(), pattern, track, step);
        true
    }
}

impl PatternStore {
    /// Copy one track onto another, keeping destination step identities
    ///
    /// Copying a track onto itself does nothing.
    pub fn copy_track(&mut self, from: (usize, usize), to: (usize, usize)) {
        let from = (clamp_pattern(from.0), clamp_track(from.1));
        let to = (clamp_pattern(to.0), clamp_track(to.1));
        if from == to {
            return;
        }
        let source = self.track(from.0, from.1).clone();
        self.track_mut(to.0, to.1).copy_content_from(&source);
    }

    /// Copy a whole pattern onto another; a no-op when both are the same
    pub fn copy_pattern(&mut self, from: usize, to: usize) {
        let (from, to) = (clamp_pattern(from), clamp_pattern(to));
        if from == to {
            return;
        }
        let source = self.pattern(from).clone();
        self.pattern_mut(to).copy_content_from(&source);
    }

    /// Restore defaults at the given granularity
    pub fn erase(&mut self, scope: EditScope, pattern: usize, track: usize, step: usize) {
        match scope {
            EditScope::Step => self.step_mut(pattern, track, step).erase(),
            EditScope::Track => self.track_mut(pattern, track).erase(),
            EditScope::Pattern => {
                for track in self.pattern_mut(pattern).tracks.iter_mut() {
                    track.erase();
                }
            }
        }
        debug!("Erased {:?} at {}/{}/{}", scope, pattern, track, step);
    }

    /// Fill the selection with random step content
    pub fn randomize<R: Rng + ?Sized>(
        &mut self,
        scope: EditScope,
        pattern: usize,
        track: usize,
        step: usize,
        rng: &mut R,
    ) {
        match scope {
            EditScope::Step => randomize_step(self.step_mut(pattern, track, step), rng),
            EditScope::Track => randomize_track(self.track_mut(pattern, track), rng),
            EditScope::Pattern => {
                for track in self.pattern_mut(pattern).tracks.iter_mut() {
                    randomize_track(track, rng);
                }
            }
        }
        debug!("Randomized {:?} at {}/{}/{}", scope, pattern, track, step);
    }

    /// Shift the first `length` steps of a track towards slot 0 by `amount`
    pub fn rotate_left(&mut self, pattern: usize, track: usize, amount: usize) {
        let track = self.track_mut(pattern, track);
        let length = track.effective_length();
        track.steps[..length].rotate_left(amount % length);
        reassign_indices(track);
    }

    /// Shift the first `length` steps of a track away from slot 0 by `amount`
    pub fn rotate_right(&mut self, pattern: usize, track: usize, amount: usize) {
        let track = self.track_mut(pattern, track);
        let length = track.effective_length();
        track.steps[..length].rotate_right(amount % length);
        reassign_indices(track);
    }

    /// Shift the pitch of every step of a track, carrying into the octave
    pub fn transpose_track(&mut self, pattern: usize, track: usize, semitones: i32) {
        for step in self.track_mut(pattern, track).steps.iter_mut() {
            step.transpose(semitones);
        }
    }
}

fn reassign_indices(track: &mut Track) {
    for (slot, step) in track.steps.iter_mut().enumerate() {
        step.set_index(slot);
    }
}

/// Random musical content for one step; the step's identity is kept
pub fn randomize_step<R: Rng + ?Sized>(step: &mut Step, rng: &mut R) {
    step.active = rng.gen_bool(0.5);
    step.gate_source = GateSource::Internal;
    step.octave = rng.gen_range(OCTAVE_CENTER - 1..=OCTAVE_CENTER + 1);
    step.semitone = rng.gen_range(0..12);
    step.length = rng.gen_range(1..=SUBSTEPS_PER_STEP) as f32;
    step.trim = 0.0;

    if rng.gen_bool(0.2) {
        step.pulse_count = rng.gen_range(2..=4);
        step.pulse_distance = (step.length * 2.0).min((SUBSTEPS_PER_STEP * 2) as f32);
    } else {
        step.pulse_count = 1;
        step.pulse_distance = SUBSTEPS_PER_STEP as f32;
    }

    step.probability = ProbabilityStrategy::Dice;
    step.count = rng.gen_range(25..=100);
    step.count_reset = 1;

    if rng.gen_bool(0.25) {
        step.slide_depth = rng.gen_range(0.25..2.0);
        step.slide_fixed_span = rng.gen_bool(0.5);
    } else {
        step.slide_depth = 0.0;
        step.slide_fixed_span = false;
    }

    step.cv1 = rng.gen_range(0.0..5.0);
    step.cv2 = rng.gen_range(0.0..5.0);
}

/// Randomize every step of a track, leaving its settings alone
pub fn randomize_track<R: Rng + ?Sized>(track: &mut Track, rng: &mut R) {
    for step in track.steps.iter_mut().take(STEP_COUNT) {
        randomize_step(step, rng);
    }
}
