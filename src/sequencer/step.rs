// Step - One programmable slot of a track
// Pitch, gate shape and probability configuration, stored as plain typed fields

use serde::{Deserialize, Serialize};

use super::{STEP_COUNT, SUBSTEPS_PER_STEP};

/// Lowest and highest stored octave. Octave 3 is 0 V.
pub const OCTAVE_MIN: u8 = 0;
pub const OCTAVE_MAX: u8 = 6;
pub const OCTAVE_CENTER: u8 = 3;

pub const PULSE_COUNT_MAX: u8 = 64;
pub const TRIM_LIMIT: f32 = (SUBSTEPS_PER_STEP - 1) as f32;
/// Longest gate a single step can emit, in sub-step units
pub const LENGTH_MAX: f32 = (STEP_COUNT as i32 * SUBSTEPS_PER_STEP) as f32;
pub const PULSE_DISTANCE_MAX: f32 = LENGTH_MAX;
pub const COUNT_MAX: u8 = 100;
pub const SLIDE_DEPTH_MAX: f32 = 4.0;
pub const CV_LIMIT: f32 = 10.0;

/// Where a step takes its gate level from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateSource {
    /// Envelope computed by the pulse expander
    #[default]
    Internal,
    /// Pass-through of the first external gate input
    ExternalGate1,
    /// Pass-through of the second external gate input
    ExternalGate2,
}

/// Rule deciding whether an armed step fires or sleeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbabilityStrategy {
    /// Fires with `count` percent chance, biased by the dice modifier
    #[default]
    Dice,
    /// Fires `count` times out of every `count_reset` arrivals
    Count,
    /// Fires only while fill is engaged
    Fill,
    /// Fires only while fill is released
    NotFill,
    /// Fires only if the previous track's pre flag is set
    Pre,
    /// Fires only if the previous track's pre flag is clear
    NotPre,
    /// Fires only if the step played before it on this track fired
    Neighbor,
    /// Fires only if the step played before it on this track slept
    NotNeighbor,
}

impl ProbabilityStrategy {
    pub const ALL: [ProbabilityStrategy; 8] = [
        ProbabilityStrategy::Dice,
        ProbabilityStrategy::Count,
        ProbabilityStrategy::Fill,
        ProbabilityStrategy::NotFill,
        ProbabilityStrategy::Pre,
        ProbabilityStrategy::NotPre,
        ProbabilityStrategy::Neighbor,
        ProbabilityStrategy::NotNeighbor,
    ];

    /// Strategies whose outcome carries chance or counting state.
    /// Only these set the track's pre flag when they fire.
    pub fn is_probabilistic(self) -> bool {
        matches!(self, ProbabilityStrategy::Dice | ProbabilityStrategy::Count)
    }
}

/// A single step of a track
///
/// `index` is the step's identity inside its track and always equals the
/// array slot it lives in. Editing tools move whole steps between slots and
/// then reassign the index, they never copy it from a source step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    index: u8,

    /// Participates in playback
    pub active: bool,
    pub gate_source: GateSource,

    /// Gate width of each pulse, in sub-step units
    pub length: f32,
    /// Start offset relative to the step boundary, in sub-step units
    pub trim: f32,
    /// Number of gates emitted per arrival (1 = no retrigger)
    pub pulse_count: u8,
    /// Spacing between retriggers, in sub-step units
    pub pulse_distance: f32,

    pub octave: u8,
    pub semitone: u8,

    pub probability: ProbabilityStrategy,
    /// Percent chance for `Dice`, play count for `Count`
    pub count: u8,
    /// Cycle length for `Count`; 0 disables counting
    pub count_reset: u8,

    /// Exponent of the glide curve into this step; 0 disables the slide
    pub slide_depth: f32,
    /// Glide over one step scaled by pitch distance instead of the gate span
    pub slide_fixed_span: bool,

    pub cv1: f32,
    pub cv2: f32,

    // Per-arrival state
    pub(crate) sleeping: bool,
    pub(crate) armed: bool,
    pub(crate) in_count: u8,
}

impl Step {
    /// Create a step with default attributes at the given slot
    pub fn new(index: usize) -> Self {
        Self {
            index: index.min(STEP_COUNT - 1) as u8,
            active: false,
            gate_source: GateSource::Internal,
            length: (SUBSTEPS_PER_STEP / 2) as f32,
            trim: 0.0,
            pulse_count: 1,
            pulse_distance: SUBSTEPS_PER_STEP as f32,
            octave: OCTAVE_CENTER,
            semitone: 0,
            probability: ProbabilityStrategy::Dice,
            count: COUNT_MAX,
            count_reset: 1,
            slide_depth: 0.0,
            slide_fixed_span: false,
            cv1: 0.0,
            cv2: 0.0,
            sleeping: false,
            armed: false,
            in_count: 1,
        }
    }

    /// Slot position of this step inside its track
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index.min(STEP_COUNT - 1) as u8;
    }

    /// Outcome of the last probability decision
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Whether the probability decision for the current arrival is already made
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Running counter of the `Count` strategy
    pub fn in_count(&self) -> u8 {
        self.in_count
    }

    /// Pitch in volts (1V/oct), octave 3 semitone 0 = 0 V
    pub fn pitch_volts(&self) -> f32 {
        (self.octave as f32 - OCTAVE_CENTER as f32) + self.semitone as f32 / 12.0
    }

    /// Set octave and semitone from a 1V/oct voltage, rounded to the nearest semitone
    pub fn set_pitch_volts(&mut self, volts: f32) {
        let semitones = if volts.is_finite() {
            (volts * 12.0).round() as i32 + OCTAVE_CENTER as i32 * 12
        } else {
            OCTAVE_CENTER as i32 * 12
        };
        self.set_total_semitones(semitones);
    }

    /// Pitch as a single semitone count from octave 0
    pub fn total_semitones(&self) -> i32 {
        self.octave as i32 * 12 + self.semitone as i32
    }

    /// Set pitch from a semitone count, clamped to the storable range
    pub fn set_total_semitones(&mut self, semitones: i32) {
        let max = OCTAVE_MAX as i32 * 12 + 11;
        let semitones = semitones.clamp(0, max);
        self.octave = (semitones / 12) as u8;
        self.semitone = (semitones % 12) as u8;
    }

    /// Shift pitch by a number of semitones, carrying into the octave
    pub fn transpose(&mut self, semitones: i32) {
        self.set_total_semitones(self.total_semitones() + semitones);
    }

    /// Copy every attribute of `other` while keeping this step's identity
    pub fn copy_content_from(&mut self, other: &Step) {
        let index = self.index;
        *self = *other;
        self.index = index;
        self.clear_arrival();
    }

    /// Restore default attributes, keeping the identity
    pub fn erase(&mut self) {
        *self = Step::new(self.index());
    }

    /// Forget the per-arrival decision so the next resolve recomputes it
    pub(crate) fn clear_arrival(&mut self) {
        self.armed = false;
        self.sleeping = false;
    }

    /// Bring every attribute back into its documented range
    pub fn sanitize(&mut self) {
        self.length = finite_or(self.length, 0.0).clamp(0.0, LENGTH_MAX);
        self.trim = finite_or(self.trim, 0.0).clamp(-TRIM_LIMIT, TRIM_LIMIT);
        self.pulse_count = self.pulse_count.clamp(1, PULSE_COUNT_MAX);
        self.pulse_distance = finite_or(self.pulse_distance, 0.0).clamp(0.0, PULSE_DISTANCE_MAX);
        self.octave = self.octave.min(OCTAVE_MAX);
        self.semitone = self.semitone.min(11);
        self.count = self.count.min(COUNT_MAX);
        self.count_reset = self.count_reset.min(COUNT_MAX);
        self.slide_depth = finite_or(self.slide_depth, 0.0).clamp(0.0, SLIDE_DEPTH_MAX);
        self.cv1 = finite_or(self.cv1, 0.0).clamp(-CV_LIMIT, CV_LIMIT);
        self.cv2 = finite_or(self.cv2, 0.0).clamp(-CV_LIMIT, CV_LIMIT);
        self.in_count = self.in_count.max(1);
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new(0)
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
