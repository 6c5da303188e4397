// probseq - Multi-track probabilistic step sequencer engine
//
// Eight patterns of eight tracks of 64 steps. Each track walks its steps with
// its own traversal policy and speed, decides per arrival whether a step fires,
// and shapes the result into gate, pitch and CV outputs.

pub mod config;
pub mod messaging;
pub mod persistence;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use config::{ConfigError, EngineConfig};
pub use messaging::{
    EditCommand, ExpanderProducer, SharedDisplayState, TrackModifiers, create_command_channel,
    create_expander_channel,
};
pub use persistence::{PersistenceError, load_from_file, save_to_file};
pub use sequencer::{
    EditScope, EngineInputs, GateSource, PatternStore, ProbabilityStrategy, ReadMode,
    SequencerEngine, Step, Track, TrackOutput,
};
