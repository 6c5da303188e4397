// Track - One playback lane of a pattern
// Edit-time settings, the 64 steps, and the play-head state driven by the scheduler

use serde::{Deserialize, Serialize};

use super::STEP_COUNT;
use super::step::Step;

pub const SPEED_MIN: u8 = 1;
pub const SPEED_MAX: u8 = 8;
pub const DEFAULT_TRACK_LENGTH: usize = 16;

/// Traversal policy selecting the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadMode {
    #[default]
    Forward,
    Backward,
    /// Bounces between the first and last step
    Pendulum,
    /// Any step, uniformly
    Random,
    /// Random walk: stay, or move one step either way
    Brownian,
}

impl ReadMode {
    pub const ALL: [ReadMode; 5] = [
        ReadMode::Forward,
        ReadMode::Backward,
        ReadMode::Pendulum,
        ReadMode::Random,
        ReadMode::Brownian,
    ];
}

/// A track: settings, steps and play-head
#[derive(Debug, Clone)]
pub struct Track {
    pub active: bool,
    pub solo: bool,
    /// Number of steps in the loop (1..=64)
    pub length: usize,
    pub read_mode: ReadMode,
    /// Sub-step units the head moves per clock sub-tick
    pub speed: u8,

    pub steps: [Step; STEP_COUNT],

    // Play-head state, owned by the scheduler
    pub(crate) forward_direction: bool,
    pub(crate) pre_flag: bool,
    /// Fine position: traversal position * 32 + phase within the step
    pub(crate) head: i32,
    /// Traversal position before rotation is applied
    pub(crate) position: usize,
    pub(crate) current_step: usize,
    pub(crate) played_step: usize,
    pub(crate) prev_step: usize,
    pub(crate) next_step: usize,
    pub(crate) next_position: usize,
    /// Sub-step units since the played step's nominal start
    pub(crate) played_elapsed: i32,
    pub(crate) has_played: bool,
    /// Set when a negative-trim next step started before its arrival
    pub(crate) lookahead_played: bool,
    /// Whether the step at the previous arrival was active and awake
    pub(crate) last_awake: bool,
    /// Arrivals since the last cycle start (Random and Brownian)
    pub(crate) cycle_count: usize,
}

impl Track {
    pub fn new() -> Self {
        Self {
            active: true,
            solo: false,
            length: DEFAULT_TRACK_LENGTH,
            read_mode: ReadMode::Forward,
            speed: SPEED_MIN,
            steps: std::array::from_fn(Step::new),
            forward_direction: true,
            pre_flag: false,
            head: 0,
            position: 0,
            current_step: 0,
            played_step: 0,
            prev_step: 0,
            next_step: 0,
            next_position: 0,
            played_elapsed: 0,
            has_played: false,
            lookahead_played: false,
            last_awake: false,
            cycle_count: 0,
        }
    }

    /// Loop length clamped to the valid range
    pub fn effective_length(&self) -> usize {
        self.length.clamp(1, STEP_COUNT)
    }

    /// Head advance per sub-tick, clamped to the valid range
    pub fn effective_speed(&self) -> i32 {
        self.speed.clamp(SPEED_MIN, SPEED_MAX) as i32
    }

    pub fn head(&self) -> i32 {
        self.head
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn played_step(&self) -> usize {
        self.played_step
    }

    pub fn prev_step(&self) -> usize {
        self.prev_step
    }

    pub fn next_step(&self) -> usize {
        self.next_step
    }

    pub fn is_forward(&self) -> bool {
        self.forward_direction
    }

    pub fn pre_flag(&self) -> bool {
        self.pre_flag
    }

    /// Whether any step has fired since the last reset
    pub fn has_played(&self) -> bool {
        self.has_played
    }

    /// Position of the head relative to the played step's trimmed start
    pub fn relative_position(&self) -> f32 {
        self.played_elapsed as f32 - self.steps[self.played_step].trim
    }

    /// Copy settings and step content from `other`, keeping step identities
    /// and this track's play-head
    pub fn copy_content_from(&mut self, other: &Track) {
        self.active = other.active;
        self.solo = other.solo;
        self.length = other.length;
        self.read_mode = other.read_mode;
        self.speed = other.speed;
        for (step, source) in self.steps.iter_mut().zip(other.steps.iter()) {
            step.copy_content_from(source);
        }
    }

    /// Restore default settings and steps, keeping the play-head
    pub fn erase(&mut self) {
        self.copy_content_from(&Track::new());
    }

    /// Clamp settings and every step into range
    pub fn sanitize(&mut self) {
        self.length = self.effective_length();
        self.speed = self.speed.clamp(SPEED_MIN, SPEED_MAX);
        for step in self.steps.iter_mut() {
            step.sanitize();
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_defaults() {
        let track = Track::new();
        assert!(track.active);
        assert!(!track.solo);
        assert_eq!(track.length, DEFAULT_TRACK_LENGTH);
        assert_eq!(track.read_mode, ReadMode::Forward);
        for (slot, step) in track.steps.iter().enumerate() {
            assert_eq!(step.index(), slot);
        }
    }

    #[test]
    fn test_effective_length_clamps() {
        let mut track = Track::new();
        track.length = 0;
        assert_eq!(track.effective_length(), 1);
        track.length = 500;
        assert_eq!(track.effective_length(), STEP_COUNT);
    }

    #[test]
    fn test_copy_content_keeps_identities_and_head() {
        let mut source = Track::new();
        source.length = 7;
        source.read_mode = ReadMode::Pendulum;
        source.steps[5].active = true;
        source.steps[5].semitone = 9;

        let mut target = Track::new();
        target.head = 77;
        target.copy_content_from(&source);

        assert_eq!(target.length, 7);
        assert_eq!(target.read_mode, ReadMode::Pendulum);
        assert!(target.steps[5].active);
        assert_eq!(target.steps[5].semitone, 9);
        assert_eq!(target.steps[5].index(), 5);
        assert_eq!(target.head, 77);
    }
}
