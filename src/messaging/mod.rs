// Messaging - Lock-free hand-offs between the edit/UI side and the engine

pub mod channels;
pub mod command;
pub mod display;
pub mod expander;

pub use channels::{CommandConsumer, CommandProducer, create_command_channel};
pub use command::EditCommand;
pub use display::SharedDisplayState;
pub use expander::{
    ExpanderConsumer, ExpanderProducer, ModifierFrame, TrackModifiers, create_expander_channel,
};
