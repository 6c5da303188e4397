// Clock - Edge detection and sub-step timing
//
// Step arrivals are driven by sub-ticks (32 per clock period). External clock
// edges are measured and subdivided; the internal clock generates the edges
// itself from a tempo.

use super::SUBSTEPS_PER_STEP;

/// Input must rise above this to count as high
pub const EDGE_HIGH_THRESHOLD: f32 = 1.0;
/// Input must fall below this to count as low again
pub const EDGE_LOW_THRESHOLD: f32 = 0.1;

/// Rising-edge detector with hysteresis
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    high: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self { high: false }
    }

    /// Feed one sample, returns true on a low to high transition
    pub fn process(&mut self, input: f32) -> bool {
        if self.high {
            if input < EDGE_LOW_THRESHOLD || input.is_nan() {
                self.high = false;
            }
            false
        } else if input > EDGE_HIGH_THRESHOLD {
            self.high = true;
            true
        } else {
            false
        }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn reset(&mut self) {
        self.high = false;
    }
}

/// What the sub-tick clock produced for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockTick {
    /// The transport was started by this sample's edge
    pub started: bool,
    /// Sub-ticks to apply during this sample
    pub sub_ticks: u32,
}

/// Spreads 32 sub-ticks over each measured clock period
///
/// The last sub-tick of a period is held back until the next edge, so step
/// boundaries always land on clock edges even when the tempo drifts.
#[derive(Debug, Clone, Default)]
pub struct SubTickClock {
    running: bool,
    /// Length of the last full period in samples, 0 until one was measured
    period: u64,
    samples_since_edge: u64,
    emitted: u32,
}

impl SubTickClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn period(&self) -> Option<u64> {
        if self.period > 0 { Some(self.period) } else { None }
    }

    /// Stop until the next edge. The measured period is kept.
    pub fn stop(&mut self) {
        self.running = false;
        self.samples_since_edge = 0;
        self.emitted = 0;
    }

    /// Advance one sample; `edge` is a detected clock rising edge
    pub fn process(&mut self, edge: bool) -> ClockTick {
        let per_period = SUBSTEPS_PER_STEP as u32;

        if edge {
            if !self.running {
                self.running = true;
                self.samples_since_edge = 0;
                self.emitted = 0;
                return ClockTick {
                    started: true,
                    sub_ticks: 0,
                };
            }

            let sub_ticks = per_period.saturating_sub(self.emitted);
            self.period = self.samples_since_edge.saturating_add(1);
            self.samples_since_edge = 0;
            self.emitted = 0;
            return ClockTick {
                started: false,
                sub_ticks,
            };
        }

        if !self.running {
            return ClockTick::default();
        }

        self.samples_since_edge = self.samples_since_edge.saturating_add(1);
        if self.period == 0 {
            return ClockTick::default();
        }

        let target = (self.samples_since_edge * per_period as u64 / self.period)
            .min(per_period as u64 - 1) as u32;
        let sub_ticks = target.saturating_sub(self.emitted);
        self.emitted = self.emitted.max(target);
        ClockTick {
            started: false,
            sub_ticks,
        }
    }
}

/// Free-running clock generating one edge per step at a tempo
#[derive(Debug, Clone)]
pub struct InternalClock {
    sample_rate: f32,
    steps_per_beat: u32,
    phase: f64,
    increment: f64,
}

impl InternalClock {
    pub fn new(sample_rate: f32, tempo_bpm: f64, steps_per_beat: u32) -> Self {
        let mut clock = Self {
            sample_rate,
            steps_per_beat: steps_per_beat.max(1),
            // Emit an edge on the very first sample
            phase: 1.0,
            increment: 0.0,
        };
        clock.set_tempo(tempo_bpm);
        clock
    }

    pub fn set_tempo(&mut self, tempo_bpm: f64) {
        let steps_per_second = tempo_bpm / 60.0 * self.steps_per_beat as f64;
        self.increment = if self.sample_rate > 0.0 && steps_per_second.is_finite() {
            (steps_per_second / self.sample_rate as f64).max(0.0)
        } else {
            0.0
        };
    }

    /// Samples between two edges (may be fractional)
    pub fn samples_per_step(&self) -> f64 {
        if self.increment > 0.0 {
            1.0 / self.increment
        } else {
            f64::INFINITY
        }
    }

    /// Emit an edge on the next sample
    pub fn restart(&mut self) {
        self.phase = 1.0;
    }

    /// Advance one sample, returns true when an edge occurs
    pub fn process(&mut self) -> bool {
        let edge = self.phase >= 1.0;
        if edge {
            self.phase -= self.phase.floor();
        }
        self.phase += self.increment;
        edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_detector_hysteresis() {
        let mut detector = EdgeDetector::new();
        assert!(!detector.process(0.5));
        assert!(detector.process(5.0));
        assert!(!detector.process(5.0));
        // Dropping to 0.5 V is not low enough to re-arm
        assert!(!detector.process(0.5));
        assert!(!detector.process(5.0));
        assert!(!detector.process(0.0));
        assert!(detector.process(2.0));
    }

    #[test]
    fn test_first_edge_only_starts() {
        let mut clock = SubTickClock::new();
        assert_eq!(clock.process(false), ClockTick::default());
        let tick = clock.process(true);
        assert!(tick.started);
        assert_eq!(tick.sub_ticks, 0);
        assert!(clock.is_running());
        assert_eq!(clock.period(), None);
    }

    #[test]
    fn test_sub_ticks_per_period() {
        let mut clock = SubTickClock::new();
        let period = 100;
        clock.process(true);
        for _ in 0..period - 1 {
            assert_eq!(clock.process(false).sub_ticks, 0);
        }
        // Period unknown during the first one: everything comes on the edge
        assert_eq!(clock.process(true).sub_ticks, 32);
        assert_eq!(clock.period(), Some(period));

        let mut total = 0;
        for _ in 0..period - 1 {
            total += clock.process(false).sub_ticks;
        }
        assert_eq!(total, 31);
        assert_eq!(clock.process(true).sub_ticks, 1);
    }

    #[test]
    fn test_early_edge_catches_up() {
        let mut clock = SubTickClock::new();
        clock.process(true);
        for _ in 0..63 {
            clock.process(false);
        }
        clock.process(true);

        let mut total = 0;
        for _ in 0..10 {
            total += clock.process(false).sub_ticks;
        }
        let on_edge = clock.process(true).sub_ticks;
        assert_eq!(total + on_edge, 32);
    }

    #[test]
    fn test_stop_waits_for_next_edge() {
        let mut clock = SubTickClock::new();
        clock.process(true);
        for _ in 0..31 {
            clock.process(false);
        }
        clock.process(true);
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.process(false).sub_ticks, 0);
        assert!(clock.process(true).started);
        assert_eq!(clock.period(), Some(32));
    }

    #[test]
    fn test_internal_clock_rate() {
        // 120 bpm, 4 steps per beat at 48 kHz: one edge every 6000 samples
        let mut clock = InternalClock::new(48000.0, 120.0, 4);
        assert!((clock.samples_per_step() - 6000.0).abs() < 1e-6);

        let edges: Vec<usize> = (0..18100).filter(|_| clock.process()).collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], 0);
    }

    #[test]
    fn test_internal_clock_restart() {
        let mut clock = InternalClock::new(1000.0, 60.0, 1);
        assert!(clock.process());
        assert!(!clock.process());
        clock.restart();
        assert!(clock.process());
    }
}
