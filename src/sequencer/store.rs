// PatternStore - Owner of the pattern x track x step grid
// Every accessor clamps its selectors, the fixed grid is never indexed out of range

use super::step::Step;
use super::track::Track;
use super::{PATTERN_COUNT, STEP_COUNT, TRACK_COUNT};

/// Eight tracks played together
#[derive(Debug, Clone)]
pub struct Pattern {
    pub tracks: [Track; TRACK_COUNT],
}

impl Pattern {
    pub fn new() -> Self {
        Self {
            tracks: std::array::from_fn(|_| Track::new()),
        }
    }

    /// Whether any track of this pattern is soloed
    pub fn any_solo(&self) -> bool {
        self.tracks.iter().any(|track| track.solo)
    }

    /// Copy every track's settings and steps, keeping identities and play-heads
    pub fn copy_content_from(&mut self, other: &Pattern) {
        for (track, source) in self.tracks.iter_mut().zip(other.tracks.iter()) {
            track.copy_content_from(source);
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

pub fn clamp_pattern(pattern: usize) -> usize {
    pattern.min(PATTERN_COUNT - 1)
}

pub fn clamp_track(track: usize) -> usize {
    track.min(TRACK_COUNT - 1)
}

pub fn clamp_step(step: usize) -> usize {
    step.min(STEP_COUNT - 1)
}

/// The full bank of patterns, allocated once at construction
#[derive(Debug, Clone)]
pub struct PatternStore {
    patterns: Vec<Pattern>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self {
            patterns: (0..PATTERN_COUNT).map(|_| Pattern::new()).collect(),
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern(&self, pattern: usize) -> &Pattern {
        &self.patterns[clamp_pattern(pattern)]
    }

    pub fn pattern_mut(&mut self, pattern: usize) -> &mut Pattern {
        &mut self.patterns[clamp_pattern(pattern)]
    }

    pub fn track(&self, pattern: usize, track: usize) -> &Track {
        &self.pattern(pattern).tracks[clamp_track(track)]
    }

    pub fn track_mut(&mut self, pattern: usize, track: usize) -> &mut Track {
        &mut self.pattern_mut(pattern).tracks[clamp_track(track)]
    }

    pub fn step(&self, pattern: usize, track: usize, step: usize) -> &Step {
        &self.track(pattern, track).steps[clamp_step(step)]
    }

    pub fn step_mut(&mut self, pattern: usize, track: usize, step: usize) -> &mut Step {
        &mut self.track_mut(pattern, track).steps[clamp_step(step)]
    }

    /// Iterate over every step of the grid
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.patterns
            .iter()
            .flat_map(|pattern| pattern.tracks.iter())
            .flat_map(|track| track.steps.iter())
    }
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new()
    }
}
