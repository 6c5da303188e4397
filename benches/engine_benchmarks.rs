use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use probseq::sequencer::edit::EditScope;
use probseq::sequencer::{ReadMode, SubTickClock};
use probseq::{EngineConfig, EngineInputs, SequencerEngine};

fn busy_engine(read_mode: ReadMode) -> SequencerEngine {
    let config = EngineConfig {
        seed: Some(42),
        ..EngineConfig::default()
    };
    let mut engine = SequencerEngine::new(config).unwrap();
    for track in 0..8 {
        engine
            .store_mut()
            .randomize(EditScope::Track, 0, track, 0, &mut rand::thread_rng());
        let track = engine.store_mut().track_mut(0, track);
        track.read_mode = read_mode;
        track.length = 64;
        for step in track.steps.iter_mut() {
            step.active = true;
        }
    }
    engine
}

/// Benchmark one buffer of engine processing with all eight tracks busy
fn bench_engine_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_process");
    let buffer_size = 512;

    for read_mode in ReadMode::ALL {
        let mut engine = busy_engine(read_mode);
        // A fast clock so every buffer crosses several step boundaries
        let period = 64;
        let mut sample = 0usize;

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", read_mode)),
            &buffer_size,
            |b, &size| {
                b.iter(|| {
                    for _ in 0..size {
                        let level = if sample % period < period / 2 { 10.0 } else { 0.0 };
                        sample += 1;
                        black_box(engine.process(&EngineInputs::clocked(level)));
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark the sub-tick clock alone
fn bench_sub_tick_clock(c: &mut Criterion) {
    c.bench_function("sub_tick_clock", |b| {
        let mut clock = SubTickClock::new();
        let mut sample = 0u64;
        b.iter(|| {
            for _ in 0..512 {
                sample += 1;
                black_box(clock.process(sample % 6000 == 0));
            }
        });
    });
}

criterion_group!(benches, bench_engine_process, bench_sub_tick_clock);
criterion_main!(benches);
