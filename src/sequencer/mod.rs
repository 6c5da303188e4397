// Sequencer module
// Pattern storage, per-track playback, probability gating and output shaping

pub mod clock;
pub mod edit;
pub mod engine;
pub mod gate;
pub mod pulse;
pub mod quantize;
pub mod record;
pub mod scheduler;
pub mod slide;
pub mod step;
pub mod store;
pub mod track;

/// Patterns held by one engine
pub const PATTERN_COUNT: usize = 8;
/// Tracks per pattern
pub const TRACK_COUNT: usize = 8;
/// Steps per track
pub const STEP_COUNT: usize = 64;
/// Head units per step; fractional trims are expressed in these units
pub const SUBSTEPS_PER_STEP: i32 = 32;
/// Level of a high gate, in volts
pub const GATE_HIGH: f32 = 10.0;

pub use clock::{ClockTick, EdgeDetector, InternalClock, SubTickClock};
pub use edit::{Clipboard, ClipboardContent, EditScope};
pub use engine::{EngineInputs, SequencerEngine, TrackOutput};
pub use gate::{GateContext, ProbabilityGate};
pub use pulse::PulseExpander;
pub use quantize::{Chromatic, Quantizer, ScaleQuantizer};
pub use record::LiveRecorder;
pub use scheduler::TrackScheduler;
pub use slide::SlideEngine;
pub use step::{GateSource, ProbabilityStrategy, Step};
pub use store::{Pattern, PatternStore};
pub use track::{ReadMode, Track};
