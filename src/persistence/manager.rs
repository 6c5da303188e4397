// Persistence manager for saving and loading engine state

use std::path::Path;

use log::info;

use crate::persistence::serialization::*;
use crate::sequencer::engine::SequencerEngine;

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),
}

/// Serialize the engine state to a JSON string
pub fn save_to_string(engine: &SequencerEngine) -> Result<String, PersistenceError> {
    serialize_to_json(&engine_to_document(engine))
}

/// Replace the engine state with a JSON document
pub fn load_from_str(engine: &mut SequencerEngine, json_data: &str) -> Result<(), PersistenceError> {
    let document = deserialize_from_json(json_data)?;
    apply_document(engine, &document);
    Ok(())
}

/// Save the engine state to a file
pub fn save_to_file<P: AsRef<Path>>(engine: &SequencerEngine, path: P) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let json = save_to_string(engine)?;
    std::fs::write(path, json)?;
    info!("Saved sequencer state to {:?}", path);
    Ok(())
}

/// Load the engine state from a file
///
/// On error the engine is left untouched.
pub fn load_from_file<P: AsRef<Path>>(engine: &mut SequencerEngine, path: P) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    load_from_str(engine, &json)?;
    info!("Loaded sequencer state from {:?}", path);
    Ok(())
}
