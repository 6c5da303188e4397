// Serialization utilities for engine persistence
// Conversion between the live engine and its document form

use log::{debug, warn};

use crate::persistence::PersistenceError;
use crate::persistence::types::*;
use crate::sequencer::engine::SequencerEngine;
use crate::sequencer::step::Step;
use crate::sequencer::store::{Pattern, PatternStore};
use crate::sequencer::track::Track;
use crate::sequencer::{PATTERN_COUNT, STEP_COUNT, TRACK_COUNT};

/// Serialize a document to pretty JSON
pub fn serialize_to_json(document: &EngineDocument) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse a JSON document. Only text that is not a JSON object at all is an
/// error; malformed fields inside it are dropped.
pub fn deserialize_from_json(json_data: &str) -> Result<EngineDocument, PersistenceError> {
    let document: EngineDocument = serde_json::from_str(json_data)?;
    match document.metadata.as_ref().and_then(|metadata| metadata.version) {
        Some(0) => return Err(PersistenceError::UnsupportedVersion(0)),
        Some(version) if version > DOCUMENT_VERSION => {
            warn!(
                "Document version {} is newer than {}, loading known fields only",
                version, DOCUMENT_VERSION
            );
        }
        _ => {}
    }
    Ok(document)
}

pub fn step_to_document(step: &Step) -> StepDocument {
    StepDocument {
        active: Some(step.active),
        gate_source: Some(step.gate_source),
        length: Some(step.length),
        trim: Some(step.trim),
        pulse_count: Some(step.pulse_count),
        pulse_distance: Some(step.pulse_distance),
        octave: Some(step.octave),
        semitone: Some(step.semitone),
        probability: Some(step.probability),
        count: Some(step.count),
        count_reset: Some(step.count_reset),
        slide_depth: Some(step.slide_depth),
        slide_fixed_span: Some(step.slide_fixed_span),
        cv1: Some(step.cv1),
        cv2: Some(step.cv2),
    }
}

pub fn track_to_document(track: &Track) -> TrackDocument {
    TrackDocument {
        active: Some(track.active),
        solo: Some(track.solo),
        speed: Some(track.speed),
        read_mode: Some(track.read_mode),
        length: Some(track.length),
        steps: track
            .steps
            .iter()
            .map(|step| Some(step_to_document(step)))
            .collect(),
    }
}

pub fn pattern_to_document(pattern: &Pattern) -> PatternDocument {
    PatternDocument {
        tracks: pattern
            .tracks
            .iter()
            .map(|track| Some(track_to_document(track)))
            .collect(),
    }
}

/// Snapshot the engine into a document
pub fn engine_to_document(engine: &SequencerEngine) -> EngineDocument {
    let (pattern, track, step) = engine.selection();
    EngineDocument {
        metadata: Some(DocumentMetadata {
            version: Some(DOCUMENT_VERSION),
            modified: Some(chrono::Utc::now().to_rfc3339()),
            application: Some(format!("probseq {}", env!("CARGO_PKG_VERSION"))),
        }),
        selected_pattern: Some(pattern),
        selected_track: Some(track),
        selected_step: Some(step),
        fill: Some(engine.fill()),
        record: Some(engine.is_recording()),
        quantize: Some(engine.quantize()),
        patterns: engine
            .store()
            .patterns()
            .iter()
            .map(|pattern| Some(pattern_to_document(pattern)))
            .collect(),
    }
}

/// Write the fields present in `document` over `step`
pub fn apply_step_document(step: &mut Step, document: &StepDocument) {
    fn set<T: Copy>(field: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *field = value;
        }
    }

    set(&mut step.active, document.active);
    set(&mut step.gate_source, document.gate_source);
    set(&mut step.length, document.length);
    set(&mut step.trim, document.trim);
    set(&mut step.pulse_count, document.pulse_count);
    set(&mut step.pulse_distance, document.pulse_distance);
    set(&mut step.octave, document.octave);
    set(&mut step.semitone, document.semitone);
    set(&mut step.probability, document.probability);
    set(&mut step.count, document.count);
    set(&mut step.count_reset, document.count_reset);
    set(&mut step.slide_depth, document.slide_depth);
    set(&mut step.slide_fixed_span, document.slide_fixed_span);
    set(&mut step.cv1, document.cv1);
    set(&mut step.cv2, document.cv2);
    step.sanitize();
}

pub fn apply_track_document(track: &mut Track, document: &TrackDocument) {
    if let Some(active) = document.active {
        track.active = active;
    }
    if let Some(solo) = document.solo {
        track.solo = solo;
    }
    if let Some(speed) = document.speed {
        track.speed = speed;
    }
    if let Some(read_mode) = document.read_mode {
        track.read_mode = read_mode;
    }
    if let Some(length) = document.length {
        track.length = length;
    }
    if document.steps.len() > STEP_COUNT {
        debug!("Ignoring {} extra steps", document.steps.len() - STEP_COUNT);
    }
    for (step, step_document) in track.steps.iter_mut().zip(document.steps.iter()) {
        if let Some(step_document) = step_document {
            apply_step_document(step, step_document);
        }
    }
    track.sanitize();
}

/// Apply the patterns of a document onto a store
pub fn apply_patterns(store: &mut PatternStore, patterns: &[Option<PatternDocument>]) {
    if patterns.len() > PATTERN_COUNT {
        debug!("Ignoring {} extra patterns", patterns.len() - PATTERN_COUNT);
    }
    for (index, pattern) in patterns.iter().enumerate().take(PATTERN_COUNT) {
        let Some(pattern) = pattern else {
            continue;
        };
        for (track_index, track) in pattern.tracks.iter().enumerate().take(TRACK_COUNT) {
            if let Some(track) = track {
                apply_track_document(store.track_mut(index, track_index), track);
            }
        }
    }
}

/// Replace the engine state with the document's
///
/// Everything the document does not carry is at its construction default
/// afterwards. Playback restarts from the first step on the next clock edge.
pub fn apply_document(engine: &mut SequencerEngine, document: &EngineDocument) {
    *engine.store_mut() = PatternStore::new();
    apply_patterns(engine.store_mut(), &document.patterns);

    engine.set_fill(document.fill.unwrap_or(false));
    engine.set_record(document.record.unwrap_or(false));
    engine.set_quantize(document.quantize.unwrap_or(false));
    engine.set_selection(
        document.selected_pattern.unwrap_or(0),
        document.selected_track.unwrap_or(0),
        document.selected_step.unwrap_or(0),
    );
    engine.reset();
}
