// SequencerEngine - Façade driving all tracks of the selected pattern
//
// `process()` is called once per sample from the real-time callback. It never
// allocates, logs or fails. Edit tools go through `apply()` on the edit path.

use std::sync::Arc;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ringbuf::traits::Consumer;

use super::clock::{EdgeDetector, InternalClock, SubTickClock};
use super::edit::Clipboard;
use super::gate::GateContext;
use super::pulse::PulseExpander;
use super::quantize::{Chromatic, Quantizer};
use super::record::LiveRecorder;
use super::scheduler::TrackScheduler;
use super::slide::SlideEngine;
use super::step::GateSource;
use super::store::{PatternStore, clamp_pattern, clamp_step, clamp_track};
use super::track::{SPEED_MAX, SPEED_MIN, Track};
use super::{STEP_COUNT, TRACK_COUNT};
use crate::config::{ConfigError, EngineConfig, TEMPO_MAX, TEMPO_MIN};
use crate::messaging::channels::CommandConsumer;
use crate::messaging::command::EditCommand;
use crate::messaging::display::SharedDisplayState;
use crate::messaging::expander::{ExpanderConsumer, ModifierFrame, TrackModifiers};

/// Voltages read by the engine for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineInputs {
    /// External clock, or `None` to run from the internal tempo clock
    pub clock: Option<f32>,
    pub reset: f32,
    pub track_resets: [f32; TRACK_COUNT],
    /// Global fill gate
    pub fill: f32,
    pub record_gate: f32,
    /// 1V/oct pitch recorded while `record_gate` is high
    pub record_pitch: f32,
    pub external_gates: [f32; 2],
}

impl Default for EngineInputs {
    fn default() -> Self {
        Self {
            clock: None,
            reset: 0.0,
            track_resets: [0.0; TRACK_COUNT],
            fill: 0.0,
            record_gate: 0.0,
            record_pitch: 0.0,
            external_gates: [0.0; 2],
        }
    }
}

impl EngineInputs {
    /// Inputs driven by an external clock level
    pub fn clocked(clock: f32) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }
}

/// Voltages produced for one track
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackOutput {
    pub gate: f32,
    /// 1V/oct
    pub pitch: f32,
    pub cv1: f32,
    pub cv2: f32,
}

/// Above this voltage the fill input counts as engaged
const FILL_THRESHOLD: f32 = 1.0;

pub struct SequencerEngine {
    config: EngineConfig,
    store: PatternStore,
    rng: StdRng,
    slide: SlideEngine,
    quantizer: Box<dyn Quantizer>,
    clipboard: Clipboard,
    recorder: LiveRecorder,

    clock_edge: EdgeDetector,
    reset_edge: EdgeDetector,
    track_reset_edges: [EdgeDetector; TRACK_COUNT],
    sub_clock: SubTickClock,
    internal_clock: InternalClock,

    selected_pattern: usize,
    selected_track: usize,
    selected_step: usize,
    fill: bool,
    record: bool,
    quantize: bool,

    expander: Option<ExpanderConsumer>,
    commands: Option<CommandConsumer>,
    display: Option<Arc<SharedDisplayState>>,

    outputs: [TrackOutput; TRACK_COUNT],
}

impl SequencerEngine {
    /// Build an engine with every pattern at its defaults
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let internal_clock =
            InternalClock::new(config.sample_rate, config.tempo_bpm, config.steps_per_beat);

        let mut engine = Self {
            config,
            store: PatternStore::new(),
            rng,
            slide: SlideEngine::new(),
            quantizer: Box::new(Chromatic),
            clipboard: Clipboard::new(),
            recorder: LiveRecorder::new(),
            clock_edge: EdgeDetector::new(),
            reset_edge: EdgeDetector::new(),
            track_reset_edges: [EdgeDetector::new(); TRACK_COUNT],
            sub_clock: SubTickClock::new(),
            internal_clock,
            selected_pattern: 0,
            selected_track: 0,
            selected_step: 0,
            fill: false,
            record: false,
            quantize: false,
            expander: None,
            commands: None,
            display: None,
            outputs: [TrackOutput::default(); TRACK_COUNT],
        };
        engine.reset();

        info!(
            "Sequencer engine ready ({} Hz, {} bpm)",
            engine.config.sample_rate, engine.config.tempo_bpm
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &PatternStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PatternStore {
        &mut self.store
    }

    /// Track `track` of the selected pattern
    pub fn track(&self, track: usize) -> &Track {
        self.store.track(self.selected_pattern, track)
    }

    pub fn outputs(&self) -> &[TrackOutput; TRACK_COUNT] {
        &self.outputs
    }

    /// Whether the clock has started since the last reset
    pub fn is_running(&self) -> bool {
        self.sub_clock.is_running()
    }

    pub fn attach_expander(&mut self, consumer: ExpanderConsumer) {
        self.expander = Some(consumer);
    }

    pub fn attach_commands(&mut self, consumer: CommandConsumer) {
        self.commands = Some(consumer);
    }

    pub fn attach_display(&mut self, display: Arc<SharedDisplayState>) {
        let (pattern, track, step) = self.selection();
        display.set_selection(pattern, track, step);
        display.set_recording(self.record);
        self.display = Some(display);
    }

    pub fn set_quantizer(&mut self, quantizer: Box<dyn Quantizer>) {
        self.quantizer = quantizer;
    }

    pub fn set_tempo(&mut self, tempo_bpm: f64) -> Result<(), ConfigError> {
        if !(TEMPO_MIN..=TEMPO_MAX).contains(&tempo_bpm) {
            return Err(ConfigError::InvalidTempo(tempo_bpm));
        }
        self.config.tempo_bpm = tempo_bpm;
        self.internal_clock.set_tempo(tempo_bpm);
        Ok(())
    }

    /// Selected (pattern, track, step)
    pub fn selection(&self) -> (usize, usize, usize) {
        (self.selected_pattern, self.selected_track, self.selected_step)
    }

    /// Change the selection; switching pattern restarts its tracks
    pub fn set_selection(&mut self, pattern: usize, track: usize, step: usize) {
        let pattern = clamp_pattern(pattern);
        let track = clamp_track(track);
        let switched = pattern != self.selected_pattern;
        if switched || track != self.selected_track {
            self.recorder.stop();
        }
        self.selected_pattern = pattern;
        self.selected_track = track;
        self.selected_step = clamp_step(step);
        if switched {
            self.reset_tracks();
        }
        self.publish_selection();
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.fill = fill;
    }

    pub fn is_recording(&self) -> bool {
        self.record
    }

    pub fn set_record(&mut self, record: bool) {
        self.record = record;
        if !record {
            self.recorder.stop();
        }
        if let Some(display) = &self.display {
            display.set_recording(record);
        }
    }

    pub fn quantize(&self) -> bool {
        self.quantize
    }

    pub fn set_quantize(&mut self, quantize: bool) {
        self.quantize = quantize;
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Hard reset: stop until the next clock edge and send every track of
    /// the selected pattern back to its start
    pub fn reset(&mut self) {
        self.sub_clock.stop();
        self.internal_clock.restart();
        self.recorder.stop();
        self.reset_tracks();
        self.outputs = [TrackOutput::default(); TRACK_COUNT];
    }

    fn reset_tracks(&mut self) {
        let modifiers = self.current_modifiers();
        let fill = self.fill;
        let tracks = &mut self.store.pattern_mut(self.selected_pattern).tracks;
        Self::reset_pattern_tracks(tracks, &modifiers, fill, None, &mut self.rng);
    }

    fn current_modifiers(&self) -> ModifierFrame {
        match &self.expander {
            Some(expander) => *expander.latest(),
            None => [TrackModifiers::default(); TRACK_COUNT],
        }
    }

    fn reset_pattern_tracks(
        tracks: &mut [Track; TRACK_COUNT],
        modifiers: &ModifierFrame,
        fill: bool,
        only: Option<usize>,
        rng: &mut StdRng,
    ) {
        for index in 0..TRACK_COUNT {
            if only.is_some_and(|only| only != index) {
                continue;
            }
            let pre = index > 0 && tracks[index - 1].pre_flag;
            let context = gate_context(&modifiers[index], fill, pre);
            TrackScheduler::reset(&mut tracks[index], &context, modifiers[index].rotate, rng);
        }
    }

    /// Run one sample
    pub fn process(&mut self, inputs: &EngineInputs) -> &[TrackOutput; TRACK_COUNT] {
        let modifiers = match self.expander.as_mut() {
            Some(expander) => *expander.poll(),
            None => [TrackModifiers::default(); TRACK_COUNT],
        };
        let fill = self.fill || inputs.fill > FILL_THRESHOLD;

        if self.reset_edge.process(inputs.reset) {
            self.sub_clock.stop();
            self.internal_clock.restart();
            self.recorder.stop();
            let tracks = &mut self.store.pattern_mut(self.selected_pattern).tracks;
            Self::reset_pattern_tracks(tracks, &modifiers, fill, None, &mut self.rng);
        }

        let edge = match inputs.clock {
            Some(level) => self.clock_edge.process(level),
            None => self.internal_clock.process(),
        };
        let tick = self.sub_clock.process(edge);

        let pattern = self.selected_pattern;
        let tracks = &mut self.store.pattern_mut(pattern).tracks;

        if tick.started {
            Self::reset_pattern_tracks(tracks, &modifiers, fill, None, &mut self.rng);
        }

        for index in 0..TRACK_COUNT {
            if self.track_reset_edges[index].process(inputs.track_resets[index]) {
                Self::reset_pattern_tracks(tracks, &modifiers, fill, Some(index), &mut self.rng);
            }
        }

        for _ in 0..tick.sub_ticks {
            for index in 0..TRACK_COUNT {
                let pre = index > 0 && tracks[index - 1].pre_flag;
                let context = gate_context(&modifiers[index], fill, pre);
                TrackScheduler::advance(
                    &mut tracks[index],
                    true,
                    &context,
                    modifiers[index].rotate,
                    &mut self.rng,
                );
            }
        }

        let running = self.sub_clock.is_running();
        if self.record && running {
            self.recorder.process(
                &mut tracks[self.selected_track],
                inputs.record_gate,
                inputs.record_pitch,
                tick.sub_ticks,
            );
        }

        let played_pattern = self.store.pattern(pattern);
        let any_solo = played_pattern.any_solo();
        let quantizer: Option<&dyn Quantizer> = if self.quantize {
            Some(&*self.quantizer)
        } else {
            None
        };

        for (index, track) in played_pattern.tracks.iter().enumerate() {
            let played = &track.steps[track.played_step()];
            let prev = &track.steps[track.prev_step()];
            let relative = track.relative_position();

            let audible = running
                && track.active
                && track.has_played()
                && played.active
                && (!any_solo || track.solo);
            let gate = if audible {
                let level = PulseExpander::gate_level(played, relative, &inputs.external_gates);
                if played.gate_source == GateSource::Internal && level > 0.0 {
                    self.config.gate_voltage
                } else {
                    level
                }
            } else {
                0.0
            };

            let pitch = self.slide.pitch(
                played,
                prev,
                modifiers[index].transpose,
                relative,
                quantizer,
            );

            let (cv1, cv2) = if gate > 0.0 {
                match quantizer {
                    Some(quantizer) => (quantizer.quantize(played.cv1), quantizer.quantize(played.cv2)),
                    None => (played.cv1, played.cv2),
                }
            } else {
                (0.0, 0.0)
            };

            self.outputs[index] = TrackOutput {
                gate,
                pitch,
                cv1,
                cv2,
            };

            if let Some(display) = &self.display {
                display.set_track(index, track.current_step(), gate > 0.0);
            }
        }

        if let Some(display) = &self.display {
            display.set_running(running);
        }

        &self.outputs
    }

    /// Apply every queued edit command; returns how many were applied
    pub fn drain_commands(&mut self) -> usize {
        let Some(mut commands) = self.commands.take() else {
            return 0;
        };
        let mut applied = 0;
        while let Some(command) = commands.try_pop() {
            self.apply(command);
            applied += 1;
        }
        self.commands = Some(commands);
        applied
    }

    /// Run an edit command against the current selection
    pub fn apply(&mut self, command: EditCommand) {
        debug!("Applying {:?}", command);
        let (pattern, track, step) = self.selection();

        match command {
            EditCommand::SelectPattern(pattern) => self.set_selection(pattern, track, step),
            EditCommand::SelectTrack(track) => self.set_selection(pattern, track, step),
            EditCommand::SelectStep(step) => self.set_selection(pattern, track, step),

            EditCommand::ToggleStepActive => {
                let step = self.store.step_mut(pattern, track, step);
                step.active = !step.active;
            }
            EditCommand::ToggleTrackActive => {
                let track = self.store.track_mut(pattern, track);
                track.active = !track.active;
            }
            EditCommand::ToggleTrackSolo => {
                let track = self.store.track_mut(pattern, track);
                track.solo = !track.solo;
            }

            EditCommand::SetReadMode(mode) => self.store.track_mut(pattern, track).read_mode = mode,
            EditCommand::SetTrackLength(length) => {
                self.store.track_mut(pattern, track).length = length.clamp(1, STEP_COUNT);
            }
            EditCommand::SetTrackSpeed(speed) => {
                self.store.track_mut(pattern, track).speed = speed.clamp(SPEED_MIN, SPEED_MAX);
            }

            EditCommand::Copy(scope) => self.clipboard.copy(&self.store, scope, pattern, track, step),
            EditCommand::Paste => {
                self.clipboard.paste(&mut self.store, pattern, track, step);
            }
            EditCommand::Erase(scope) => self.store.erase(scope, pattern, track, step),
            EditCommand::Randomize(scope) => {
                self.store.randomize(scope, pattern, track, step, &mut self.rng)
            }

            EditCommand::RotateLeft => self.store.rotate_left(pattern, track, 1),
            EditCommand::RotateRight => self.store.rotate_right(pattern, track, 1),
            EditCommand::TransposeUp => self.store.transpose_track(pattern, track, 1),
            EditCommand::TransposeDown => self.store.transpose_track(pattern, track, -1),

            EditCommand::ToggleRecord => self.set_record(!self.record),
            EditCommand::ToggleQuantize => self.quantize = !self.quantize,
            EditCommand::ToggleFill => self.fill = !self.fill,
        }
    }

    fn publish_selection(&self) {
        if let Some(display) = &self.display {
            display.set_selection(self.selected_pattern, self.selected_track, self.selected_step);
        }
    }
}

fn gate_context(modifiers: &TrackModifiers, fill: bool, pre: bool) -> GateContext {
    GateContext {
        fill: fill || modifiers.fill,
        pre,
        neighbor: false,
        force: modifiers.force,
        kill: modifiers.kill,
        dice: modifiers.dice_offset(),
    }
}
