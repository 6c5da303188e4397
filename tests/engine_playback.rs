//! End-to-end playback tests
//!
//! Drive the engine with a square-wave clock and check the per-track
//! outputs sample by sample.

use probseq::messaging::create_expander_channel;
use probseq::sequencer::{GATE_HIGH, SUBSTEPS_PER_STEP, TRACK_COUNT};
use probseq::{
    EditCommand, EngineConfig, EngineInputs, ProbabilityStrategy, ReadMode, SequencerEngine,
    TrackModifiers, TrackOutput,
};

/// Samples per clock period; with one measured period each sample is one sub-tick
const PERIOD: usize = SUBSTEPS_PER_STEP as usize;

fn engine() -> SequencerEngine {
    SequencerEngine::new(EngineConfig {
        seed: Some(1234),
        ..EngineConfig::default()
    })
    .unwrap()
}

fn clock_level(sample: usize) -> f32 {
    if sample % PERIOD < PERIOD / 2 { 10.0 } else { 0.0 }
}

fn run(engine: &mut SequencerEngine, samples: usize) -> Vec<[TrackOutput; TRACK_COUNT]> {
    run_with(engine, samples, |_, inputs| inputs)
}

fn run_with(
    engine: &mut SequencerEngine,
    samples: usize,
    inputs: impl Fn(usize, EngineInputs) -> EngineInputs,
) -> Vec<[TrackOutput; TRACK_COUNT]> {
    (0..samples)
        .map(|sample| {
            let frame = inputs(sample, EngineInputs::clocked(clock_level(sample)));
            *engine.process(&frame)
        })
        .collect()
}

#[test]
fn test_pulse_train_through_engine() {
    let mut engine = engine();
    let step = engine.store_mut().step_mut(0, 0, 1);
    step.active = true;
    step.length = 4.0;
    step.pulse_count = 3;
    step.pulse_distance = 10.0;

    let frames = run(&mut engine, 2 * PERIOD + PERIOD);
    let high: Vec<usize> = (0..PERIOD)
        .filter(|n| frames[PERIOD + n][0].gate > 0.0)
        .collect();
    assert_eq!(high, vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
}

#[test]
fn test_pendulum_playback_order() {
    let mut engine = engine();
    let track = engine.store_mut().track_mut(0, 0);
    track.read_mode = ReadMode::Pendulum;
    track.length = 3;

    let mut visited = Vec::new();
    for period in 0..7 {
        let start = period * PERIOD;
        run_with(&mut engine, PERIOD, |sample, _| {
            EngineInputs::clocked(clock_level(start + sample))
        });
        visited.push(engine.track(0).current_step());
    }
    assert_eq!(visited, vec![0, 1, 2, 1, 0, 1, 2]);
}

#[test]
fn test_fill_input_selects_fill_steps() {
    let mut engine = engine();
    for (slot, strategy) in [(0, ProbabilityStrategy::Fill), (1, ProbabilityStrategy::NotFill)] {
        let step = engine.store_mut().step_mut(0, 0, slot);
        step.active = true;
        step.probability = strategy;
    }

    // End on a low clock level so the next run starts with a rising edge
    let filled = run_with(&mut engine, 3 * PERIOD - 1, |_, mut inputs| {
        inputs.fill = 10.0;
        inputs
    });
    assert_eq!(filled[0][0].gate, GATE_HIGH, "Fill step plays while filling");
    assert_eq!(filled[PERIOD][0].gate, 0.0, "NotFill step sleeps while filling");

    engine.reset();
    let plain = run(&mut engine, 2 * PERIOD + 1);
    assert_eq!(plain[0][0].gate, 0.0);
    assert_eq!(plain[PERIOD][0].gate, GATE_HIGH);
}

#[test]
fn test_pre_chains_across_tracks() {
    let mut engine = engine();
    engine.store_mut().step_mut(0, 0, 0).active = true;
    let follower = engine.store_mut().step_mut(0, 1, 0);
    follower.active = true;
    follower.probability = ProbabilityStrategy::Pre;
    let inverse = engine.store_mut().step_mut(0, 2, 0);
    inverse.active = true;
    inverse.probability = ProbabilityStrategy::NotPre;

    let frames = run(&mut engine, 1);
    assert_eq!(frames[0][1].gate, GATE_HIGH, "track 0 fired a Dice step");
    // Track 1 fired a Pre step, which does not set its own pre flag
    assert_eq!(frames[0][2].gate, GATE_HIGH);
}

#[test]
fn test_slide_between_steps() {
    let mut engine = engine();
    engine.store_mut().step_mut(0, 0, 0).active = true;
    let step = engine.store_mut().step_mut(0, 0, 1);
    step.active = true;
    step.octave = 4;
    step.slide_depth = 1.0;
    step.length = 16.0;

    let frames = run(&mut engine, 2 * PERIOD);
    assert_eq!(frames[0][0].pitch, 0.0);
    assert_eq!(frames[PERIOD][0].pitch, 0.0, "glide starts from the previous pitch");
    assert!((frames[PERIOD + 8][0].pitch - 0.5).abs() < 0.02);
    assert_eq!(frames[PERIOD + 16][0].pitch, 1.0);
    assert_eq!(frames[PERIOD + 20][0].pitch, 1.0);
}

#[test]
fn test_negative_trim_starts_early() {
    let mut engine = engine();
    engine.store_mut().step_mut(0, 0, 1).active = true;
    let step = engine.store_mut().step_mut(0, 0, 2);
    step.active = true;
    step.trim = -8.0;

    let frames = run(&mut engine, 3 * PERIOD);
    // Step 2 begins 8 sub-steps before the clock edge that reaches it
    assert_eq!(frames[2 * PERIOD - 9][0].gate, 0.0);
    assert_eq!(frames[2 * PERIOD - 8][0].gate, GATE_HIGH);
    assert_eq!(engine.track(0).played_step(), 2);
}

#[test]
fn test_force_modifier_wakes_sleeping_steps() {
    let mut engine = engine();
    let (mut tx, rx) = create_expander_channel();
    engine.attach_expander(rx);
    let step = engine.store_mut().step_mut(0, 0, 0);
    step.active = true;
    step.count = 0;

    let silent = run(&mut engine, PERIOD);
    assert_eq!(silent[0][0].gate, 0.0);

    let mut frame = [TrackModifiers::default(); TRACK_COUNT];
    frame[0].force = true;
    tx.publish(frame);
    engine.reset();
    let forced = run(&mut engine, 1);
    assert_eq!(forced[0][0].gate, GATE_HIGH);
}

#[test]
fn test_rotate_modifier_offsets_reading() {
    let mut engine = engine();
    let (mut tx, rx) = create_expander_channel();
    engine.attach_expander(rx);
    engine.store_mut().step_mut(0, 0, 2).active = true;

    let mut frame = [TrackModifiers::default(); TRACK_COUNT];
    frame[0].rotate = 2;
    tx.publish(frame);

    let frames = run(&mut engine, 1);
    assert_eq!(frames[0][0].gate, GATE_HIGH);
    assert_eq!(engine.track(0).current_step(), 2);
}

#[test]
fn test_live_record_writes_steps() {
    let mut engine = engine();
    engine.apply(EditCommand::ToggleRecord);
    assert!(engine.is_recording());

    run_with(&mut engine, 2 * PERIOD, |sample, mut inputs| {
        if sample >= 1 && sample < 10 {
            inputs.record_gate = 10.0;
            inputs.record_pitch = 7.0 / 12.0;
        }
        inputs
    });

    let step = engine.store().step(0, 0, 0);
    assert!(step.active);
    assert_eq!(step.semitone, 7);
    assert!(!engine.store().step(0, 0, 1).active);
}

#[test]
fn test_pattern_switch_restarts_tracks() {
    let mut engine = engine();
    engine.store_mut().step_mut(1, 0, 0).active = true;
    run(&mut engine, 3 * PERIOD);
    assert_eq!(engine.track(0).current_step(), 2);

    engine.apply(EditCommand::SelectPattern(1));
    assert_eq!(engine.track(0).current_step(), 0);
    let frames = run_with(&mut engine, PERIOD, |sample, _| {
        EngineInputs::clocked(clock_level(3 * PERIOD + sample))
    });
    assert_eq!(frames[0][0].gate, GATE_HIGH);
}

#[test]
fn test_inactive_track_is_silent_but_advances() {
    let mut engine = engine();
    engine.store_mut().step_mut(0, 0, 0).active = true;
    engine.store_mut().step_mut(0, 0, 1).active = true;
    engine.apply(EditCommand::ToggleTrackActive);

    let frames = run(&mut engine, 2 * PERIOD);
    assert!(frames.iter().all(|frame| frame[0].gate == 0.0));
    assert_eq!(engine.track(0).current_step(), 1);
}
