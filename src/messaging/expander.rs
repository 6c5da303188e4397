// Expander - Per-track modifiers published by a companion module
//
// Whole frames travel over a two-slot SPSC ring. The consumer always keeps the
// newest frame it has seen, so a missed publication only makes the modifiers
// one tick stale.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::sequencer::TRACK_COUNT;

/// Modifiers applied to one track for the duration of a tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackModifiers {
    pub fill: bool,
    pub force: bool,
    pub kill: bool,
    /// Pitch offset in semitones
    pub transpose: i32,
    /// Offset added to Dice probabilities, -1..1
    pub dice: f32,
    /// Slot offset applied when reading steps
    pub rotate: i32,
}

impl TrackModifiers {
    /// Dice offset clamped to its range, 0 if not a number
    pub fn dice_offset(&self) -> f32 {
        if self.dice.is_finite() {
            self.dice.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

pub type ModifierFrame = [TrackModifiers; TRACK_COUNT];

const FRAME_SLOTS: usize = 2;

/// Publishing side, owned by the companion module
pub struct ExpanderProducer {
    tx: HeapProd<ModifierFrame>,
    dropped: u64,
}

impl ExpanderProducer {
    /// Publish a frame; returns false if it was dropped because the
    /// consumer has not caught up yet
    pub fn publish(&mut self, frame: ModifierFrame) -> bool {
        if self.tx.try_push(frame).is_err() {
            self.dropped += 1;
            return false;
        }
        true
    }

    /// Frames dropped since creation
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }
}

/// Receiving side, owned by the engine
pub struct ExpanderConsumer {
    rx: HeapCons<ModifierFrame>,
    latest: ModifierFrame,
}

impl ExpanderConsumer {
    /// Take the newest published frame, or keep the last one
    pub fn poll(&mut self) -> &ModifierFrame {
        while let Some(frame) = self.rx.try_pop() {
            self.latest = frame;
        }
        &self.latest
    }

    pub fn latest(&self) -> &ModifierFrame {
        &self.latest
    }
}

pub fn create_expander_channel() -> (ExpanderProducer, ExpanderConsumer) {
    let rb = HeapRb::<ModifierFrame>::new(FRAME_SLOTS);
    let (tx, rx) = rb.split();
    (
        ExpanderProducer { tx, dropped: 0 },
        ExpanderConsumer {
            rx,
            latest: [TrackModifiers::default(); TRACK_COUNT],
        },
    )
}
