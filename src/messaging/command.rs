// Edit commands - Communication UI → Engine
// Every command acts on the engine's current selection

use serde::{Deserialize, Serialize};

use crate::sequencer::edit::EditScope;
use crate::sequencer::track::ReadMode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EditCommand {
    SelectPattern(usize),
    SelectTrack(usize),
    SelectStep(usize),

    ToggleStepActive,
    ToggleTrackActive,
    ToggleTrackSolo,

    SetReadMode(ReadMode),
    SetTrackLength(usize),
    SetTrackSpeed(u8),

    Copy(EditScope),
    /// Paste at the granularity of the clipboard content
    Paste,
    Erase(EditScope),
    Randomize(EditScope),

    /// Rotate the selected track by one step
    RotateLeft,
    RotateRight,
    /// Transpose the selected track by one semitone
    TransposeUp,
    TransposeDown,

    ToggleRecord,
    ToggleQuantize,
    ToggleFill,
}
