// LiveRecorder - Writes an incoming gate/pitch pair into a track while it plays

use super::clock::EdgeDetector;
use super::step::{GateSource, LENGTH_MAX};
use super::track::Track;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RecordedNote {
    slot: usize,
    semitones: i32,
    /// Head units elapsed since the note started
    elapsed: i32,
}

/// Records notes into the step under the play-head
///
/// A rising gate writes the incoming pitch into the current step. The step's
/// length then grows with the head until the gate falls. A pitch change after
/// the head has moved to another step starts a new note there.
#[derive(Debug, Clone, Default)]
pub struct LiveRecorder {
    gate: EdgeDetector,
    note: Option<RecordedNote>,
}

impl LiveRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.note.is_some()
    }

    /// Slot of the note being recorded
    pub fn recording_slot(&self) -> Option<usize> {
        self.note.map(|note| note.slot)
    }

    /// Drop the note in progress, keeping what was written
    ///
    /// A gate still held afterwards records nothing until it falls and rises again.
    pub fn stop(&mut self) {
        self.note = None;
    }

    /// Feed one sample; `sub_ticks` is the number of sub-ticks the track just advanced
    pub fn process(&mut self, track: &mut Track, gate: f32, pitch: f32, sub_ticks: u32) {
        let rising = self.gate.process(gate);

        if rising {
            self.start_note(track, pitch);
            return;
        }

        if !self.gate.is_high() {
            self.note = None;
            return;
        }

        let Some(mut note) = self.note else {
            return;
        };

        note.elapsed = note
            .elapsed
            .saturating_add(track.effective_speed() * sub_ticks as i32);
        track.steps[note.slot].length = (note.elapsed.max(1) as f32).min(LENGTH_MAX);

        let semitones = Self::semitones(pitch);
        if semitones != note.semitones {
            if track.current_step() != note.slot {
                self.start_note(track, pitch);
                return;
            }
            track.steps[note.slot].set_pitch_volts(pitch);
            note.semitones = semitones;
        }

        self.note = Some(note);
    }

    fn start_note(&mut self, track: &mut Track, pitch: f32) {
        let slot = track.current_step();
        let step = &mut track.steps[slot];
        step.active = true;
        step.gate_source = GateSource::Internal;
        step.trim = 0.0;
        step.pulse_count = 1;
        step.length = 1.0;
        step.set_pitch_volts(pitch);

        self.note = Some(RecordedNote {
            slot,
            semitones: Self::semitones(pitch),
            elapsed: 0,
        });
    }

    fn semitones(volts: f32) -> i32 {
        if volts.is_finite() {
            (volts * 12.0).round() as i32
        } else {
            0
        }
    }
}
