// TrackScheduler - Play-head state machine of a single track
//
// The head moves in sub-step units (32 per step). A step arrives when the head
// crosses into the next 32-unit span; the traversal policy then decides which
// position that span maps to. The scheduler keeps a two-slot lookahead: the
// next step is planned and probability-resolved one arrival early, so its
// outcome is known before it becomes current.

use rand::Rng;

use super::gate::{GateContext, ProbabilityGate};
use super::track::{ReadMode, Track};
use super::{STEP_COUNT, SUBSTEPS_PER_STEP};

pub struct TrackScheduler;

impl TrackScheduler {
    /// Map a traversal position to a step slot, applying a rotation offset
    pub fn slot(position: usize, rotation: i32, length: usize) -> usize {
        let length = length.clamp(1, STEP_COUNT) as i32;
        (position as i32 + rotation).rem_euclid(length) as usize
    }

    /// Move the head to the policy's start boundary and re-arm the first step
    ///
    /// Every memoized probability outcome and `Count` counter of the track is
    /// discarded.
    pub fn reset<R: Rng + ?Sized>(
        track: &mut Track,
        context: &GateContext,
        rotation: i32,
        rng: &mut R,
    ) {
        let length = track.effective_length();
        for step in track.steps.iter_mut() {
            step.clear_arrival();
            step.in_count = 1;
        }

        track.forward_direction = true;
        track.cycle_count = 0;
        track.lookahead_played = false;
        track.last_awake = false;
        track.has_played = false;
        track.played_elapsed = 0;
        track.position = match track.read_mode {
            ReadMode::Backward => length - 1,
            _ => 0,
        };
        track.head = track.position as i32 * SUBSTEPS_PER_STEP;
        track.current_step = Self::slot(track.position, rotation, length);
        track.played_step = track.current_step;
        track.prev_step = track.current_step;

        Self::settle(track, context, rotation, rng, 0);
    }

    /// Advance the head by one sub-tick if `tick` is set
    ///
    /// Returns the slot of the step currently sounding.
    pub fn advance<R: Rng + ?Sized>(
        track: &mut Track,
        tick: bool,
        context: &GateContext,
        rotation: i32,
        rng: &mut R,
    ) -> usize {
        if !tick {
            return track.played_step;
        }

        let speed = track.effective_speed();
        track.head += speed;
        track.played_elapsed = track.played_elapsed.saturating_add(speed);

        let phase = track.head - track.position as i32 * SUBSTEPS_PER_STEP;
        Self::start_lookahead(track, phase);

        if track.head.div_euclid(SUBSTEPS_PER_STEP) != track.position as i32 {
            Self::arrive(track, context, rotation, rng, phase - SUBSTEPS_PER_STEP);
        }

        track.played_step
    }

    /// A next step trimmed early starts sounding before its arrival
    fn start_lookahead(track: &mut Track, phase: i32) {
        if track.lookahead_played || track.next_step == track.current_step {
            return;
        }

        let next = &track.steps[track.next_step];
        if next.trim >= 0.0 || !next.active || !next.armed || next.sleeping {
            return;
        }

        if phase as f32 >= SUBSTEPS_PER_STEP as f32 + next.trim {
            track.prev_step = track.played_step;
            track.played_step = track.next_step;
            track.played_elapsed = phase - SUBSTEPS_PER_STEP;
            track.has_played = true;
            track.lookahead_played = true;
        }
    }

    fn arrive<R: Rng + ?Sized>(
        track: &mut Track,
        context: &GateContext,
        rotation: i32,
        rng: &mut R,
        overflow: i32,
    ) {
        let length = track.effective_length();
        let left = track.current_step;
        track.steps[left].clear_arrival();

        track.position = track.next_position.min(length - 1);
        track.head = track.position as i32 * SUBSTEPS_PER_STEP + overflow;
        track.current_step = track.next_step;

        Self::settle(track, context, rotation, rng, overflow);
    }

    /// Resolve the new current step, promote it if it fires, and arm the lookahead
    fn settle<R: Rng + ?Sized>(
        track: &mut Track,
        context: &GateContext,
        rotation: i32,
        rng: &mut R,
        overflow: i32,
    ) {
        let current = track.current_step;
        let current_context = GateContext {
            neighbor: track.last_awake,
            ..*context
        };
        let sleeping = ProbabilityGate::resolve(
            &mut track.steps[current],
            &mut track.pre_flag,
            &current_context,
            rng,
        );
        let fires = track.steps[current].active && !sleeping;

        if track.lookahead_played {
            track.lookahead_played = false;
        } else if fires {
            track.prev_step = track.played_step;
            track.played_step = current;
            track.played_elapsed = overflow;
            track.has_played = true;
        }
        track.last_awake = fires;

        let (next_position, wraps) = Self::plan_next(track, track.position, rng);
        track.next_position = next_position;
        track.next_step = Self::slot(next_position, rotation, track.effective_length());

        if track.next_step != current {
            // The first step of a new cycle is decided from scratch, once
            if wraps {
                track.steps[track.next_step].clear_arrival();
            }
            let next_context = GateContext {
                neighbor: fires,
                ..*context
            };
            let next = track.next_step;
            ProbabilityGate::resolve(
                &mut track.steps[next],
                &mut track.pre_flag,
                &next_context,
                rng,
            );
        }
    }

    /// Pick the position following `from`, and whether reaching it restarts the cycle
    fn plan_next<R: Rng + ?Sized>(track: &mut Track, from: usize, rng: &mut R) -> (usize, bool) {
        let length = track.effective_length();
        let from = from.min(length - 1);

        match track.read_mode {
            ReadMode::Forward => {
                if from + 1 >= length {
                    (0, true)
                } else {
                    (from + 1, false)
                }
            }
            ReadMode::Backward => {
                if from == 0 {
                    (length - 1, true)
                } else {
                    (from - 1, false)
                }
            }
            ReadMode::Pendulum => Self::plan_pendulum(track, from, length),
            ReadMode::Random => {
                let next = rng.gen_range(0..length);
                (next, Self::count_cycle(track, length))
            }
            ReadMode::Brownian => {
                let delta: i32 = rng.gen_range(-1..=1);
                let next = (from as i32 + delta).rem_euclid(length as i32) as usize;
                (next, Self::count_cycle(track, length))
            }
        }
    }

    fn plan_pendulum(track: &mut Track, from: usize, length: usize) -> (usize, bool) {
        if length == 1 {
            return (0, false);
        }

        if track.forward_direction {
            if from + 1 >= length {
                track.forward_direction = false;
                (from - 1, from - 1 == 0)
            } else {
                (from + 1, false)
            }
        } else if from == 0 {
            track.forward_direction = true;
            (1, false)
        } else {
            (from - 1, from - 1 == 0)
        }
    }

    fn count_cycle(track: &mut Track, length: usize) -> bool {
        track.cycle_count += 1;
        if track.cycle_count >= length {
            track.cycle_count = 0;
            true
        } else {
            false
        }
    }
}
