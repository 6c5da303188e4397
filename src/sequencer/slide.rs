// SlideEngine - Pitch glide between the previous and the played step
//
// The glide curve is phase^depth. It is tabulated once at construction so the
// per-sample path only does table lookups and linear interpolation.

use super::SUBSTEPS_PER_STEP;
use super::pulse::PulseExpander;
use super::quantize::Quantizer;
use super::step::{SLIDE_DEPTH_MAX, Step};

const DEPTH_ROWS: usize = 64;
const PHASE_COLUMNS: usize = 128;

pub struct SlideEngine {
    /// (DEPTH_ROWS + 1) x (PHASE_COLUMNS + 1) samples of phase^depth
    curve: Vec<f32>,
}

impl SlideEngine {
    pub fn new() -> Self {
        let mut curve = Vec::with_capacity((DEPTH_ROWS + 1) * (PHASE_COLUMNS + 1));
        for row in 0..=DEPTH_ROWS {
            let depth = row as f32 / DEPTH_ROWS as f32 * SLIDE_DEPTH_MAX;
            for column in 0..=PHASE_COLUMNS {
                let phase = column as f32 / PHASE_COLUMNS as f32;
                curve.push(phase.powf(depth));
            }
        }
        Self { curve }
    }

    /// Curve value for a depth in (0, 4] and a phase in [0, 1]
    pub fn curve(&self, depth: f32, phase: f32) -> f32 {
        if phase <= 0.0 {
            return 0.0;
        }
        if phase >= 1.0 {
            return 1.0;
        }

        let depth = depth.clamp(0.0, SLIDE_DEPTH_MAX) / SLIDE_DEPTH_MAX * DEPTH_ROWS as f32;
        let phase = phase * PHASE_COLUMNS as f32;

        let row = (depth as usize).min(DEPTH_ROWS - 1);
        let column = (phase as usize).min(PHASE_COLUMNS - 1);
        let row_frac = depth - row as f32;
        let column_frac = phase - column as f32;

        let lower = self.lerp_row(row, column, column_frac);
        let upper = self.lerp_row(row + 1, column, column_frac);
        lower + (upper - lower) * row_frac
    }

    fn lerp_row(&self, row: usize, column: usize, frac: f32) -> f32 {
        let base = row * (PHASE_COLUMNS + 1) + column;
        let a = self.curve[base];
        let b = self.curve[base + 1];
        a + (b - a) * frac
    }

    /// Output pitch in volts while `played` sounds after `prev`
    ///
    /// `transpose` is in semitones and applies to both ends of the glide.
    /// The quantizer only applies when the played step does not slide.
    pub fn pitch(
        &self,
        played: &Step,
        prev: &Step,
        transpose: i32,
        relative: f32,
        quantizer: Option<&dyn Quantizer>,
    ) -> f32 {
        let offset = transpose as f32 / 12.0;
        let target = played.pitch_volts() + offset;

        if played.slide_depth <= 0.0 || !played.slide_depth.is_finite() {
            return match quantizer {
                Some(quantizer) => quantizer.quantize(target),
                None => target,
            };
        }

        let start = prev.pitch_volts() + offset;
        let delta = target - start;
        let phase = Self::phase(played, delta, relative);
        if phase <= 0.0 {
            return start;
        }
        if phase >= 1.0 {
            return target;
        }
        start + delta * self.curve(played.slide_depth, phase)
    }

    fn phase(played: &Step, delta: f32, relative: f32) -> f32 {
        if !relative.is_finite() {
            return 1.0;
        }
        if played.slide_fixed_span {
            relative / SUBSTEPS_PER_STEP as f32 / delta.abs().max(1.0)
        } else {
            let span = PulseExpander::span(played);
            if span <= 0.0 { 1.0 } else { relative / span }
        }
    }
}

impl Default for SlideEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::quantize::Chromatic;

    fn pitched(octave: u8, semitone: u8) -> Step {
        let mut step = Step::new(0);
        step.active = true;
        step.octave = octave;
        step.semitone = semitone;
        step
    }

    #[test]
    fn test_curve_matches_power() {
        let slide = SlideEngine::new();
        for depth in [0.5f32, 1.0, 2.0, 3.3, 4.0] {
            for phase in [0.1f32, 0.25, 0.5, 0.77, 0.9] {
                let expected = phase.powf(depth);
                let actual = slide.curve(depth, phase);
                assert!((actual - expected).abs() < 0.02, "{} {} {}", depth, phase, actual);
            }
        }
    }

    #[test]
    fn test_curve_endpoints() {
        let slide = SlideEngine::new();
        assert_eq!(slide.curve(2.0, 0.0), 0.0);
        assert_eq!(slide.curve(2.0, 1.0), 1.0);
        assert_eq!(slide.curve(2.0, 3.0), 1.0);
    }

    #[test]
    fn test_no_slide_returns_step_pitch() {
        let slide = SlideEngine::new();
        let played = pitched(4, 7);
        let prev = pitched(2, 0);
        let volts = slide.pitch(&played, &prev, 0, 3.0, None);
        assert!((volts - (1.0 + 7.0 / 12.0)).abs() < 1e-6);

        let transposed = slide.pitch(&played, &prev, 5, 3.0, None);
        assert!((transposed - (1.0 + 12.0 / 12.0)).abs() < 1e-6);
    }

    #[test]
    fn test_slide_boundaries_for_any_depth() {
        let slide = SlideEngine::new();
        let prev = pitched(2, 0);
        for depth in [0.1f32, 1.0, 2.5, 4.0] {
            let mut played = pitched(4, 0);
            played.slide_depth = depth;
            let span = PulseExpander::span(&played);

            assert_eq!(slide.pitch(&played, &prev, 0, 0.0, None), prev.pitch_volts());
            assert_eq!(slide.pitch(&played, &prev, 0, span, None), played.pitch_volts());
            assert_eq!(slide.pitch(&played, &prev, 0, span * 4.0, None), played.pitch_volts());

            let middle = slide.pitch(&played, &prev, 0, span / 2.0, None);
            assert!(middle > prev.pitch_volts() && middle < played.pitch_volts());
        }
    }

    #[test]
    fn test_fixed_span_scales_with_pitch_distance() {
        let slide = SlideEngine::new();
        let prev = pitched(1, 0);
        let mut played = pitched(4, 0);
        played.slide_depth = 1.0;
        played.slide_fixed_span = true;

        // Three volts apart: the glide takes three steps
        let after_one_step = slide.pitch(&played, &prev, 0, SUBSTEPS_PER_STEP as f32, None);
        assert!((after_one_step - (-2.0 + 1.0)).abs() < 0.02);
        let done = slide.pitch(&played, &prev, 0, 3.0 * SUBSTEPS_PER_STEP as f32, None);
        assert_eq!(done, played.pitch_volts());
    }

    #[test]
    fn test_quantizer_applies_without_slide() {
        let slide = SlideEngine::new();
        let played = pitched(3, 4);
        let chromatic = Chromatic;
        let volts = slide.pitch(&played, &played, 0, 0.0, Some(&chromatic));
        assert!((volts - 4.0 / 12.0).abs() < 1e-6);
    }
}
