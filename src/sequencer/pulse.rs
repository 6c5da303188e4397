// PulseExpander - Gate envelope of a played step
// Turns length, pulse count and pulse distance into a gate level at a relative position

use super::GATE_HIGH;
use super::step::{CV_LIMIT, GateSource, Step};

pub struct PulseExpander;

impl PulseExpander {
    /// Whether the internal pulse train is high at `relative`
    pub fn envelope(step: &Step, relative: f32) -> bool {
        if !relative.is_finite() || relative < 0.0 {
            return false;
        }
        if relative < step.length {
            return true;
        }

        let distance = step.pulse_distance;
        if distance <= 0.0 || step.pulse_count <= 1 {
            return false;
        }

        // The latest pulse already started is the one ending last
        let pulse = (relative / distance)
            .floor()
            .min((step.pulse_count - 1) as f32);
        relative - pulse * distance < step.length
    }

    /// Span from the first rise to the end of the last pulse
    pub fn span(step: &Step) -> f32 {
        if step.pulse_count <= 1 || step.pulse_distance <= 0.0 {
            step.length
        } else {
            (step.pulse_count - 1) as f32 * step.pulse_distance + step.length
        }
    }

    /// Gate voltage of `step` at `relative`
    ///
    /// `external` holds the two external gate inputs, passed through while the
    /// step's span lasts when the step takes its gate from one of them.
    pub fn gate_level(step: &Step, relative: f32, external: &[f32; 2]) -> f32 {
        match step.gate_source {
            GateSource::Internal => {
                if Self::envelope(step, relative) {
                    GATE_HIGH
                } else {
                    0.0
                }
            }
            GateSource::ExternalGate1 => Self::pass_through(step, relative, external[0]),
            GateSource::ExternalGate2 => Self::pass_through(step, relative, external[1]),
        }
    }

    fn pass_through(step: &Step, relative: f32, input: f32) -> f32 {
        if relative.is_finite() && relative >= 0.0 && relative < Self::span(step) {
            if input.is_finite() { input.clamp(0.0, CV_LIMIT) } else { 0.0 }
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_step(length: f32, count: u8, distance: f32) -> Step {
        let mut step = Step::new(0);
        step.active = true;
        step.length = length;
        step.pulse_count = count;
        step.pulse_distance = distance;
        step
    }

    #[test]
    fn test_single_gate() {
        let step = pulse_step(16.0, 1, 32.0);
        assert!(!PulseExpander::envelope(&step, -0.5));
        assert!(PulseExpander::envelope(&step, 0.0));
        assert!(PulseExpander::envelope(&step, 15.9));
        assert!(!PulseExpander::envelope(&step, 16.0));
        assert!(!PulseExpander::envelope(&step, 40.0));
        assert_eq!(PulseExpander::span(&step), 16.0);
    }

    #[test]
    fn test_pulse_train() {
        // Three 4-unit pulses, 10 units apart
        let step = pulse_step(4.0, 3, 10.0);
        let high: Vec<u32> = (0..40)
            .filter(|&rel| PulseExpander::envelope(&step, rel as f32))
            .collect();
        assert_eq!(high, vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
        assert_eq!(PulseExpander::span(&step), 24.0);
    }

    #[test]
    fn test_overlapping_pulses_merge() {
        let step = pulse_step(12.0, 2, 8.0);
        assert!((0..20).all(|rel| PulseExpander::envelope(&step, rel as f32)));
        assert!(!PulseExpander::envelope(&step, 20.0));
    }

    #[test]
    fn test_zero_distance_emits_single_gate() {
        let step = pulse_step(4.0, 8, 0.0);
        assert!(PulseExpander::envelope(&step, 3.0));
        assert!(!PulseExpander::envelope(&step, 4.0));
        assert_eq!(PulseExpander::span(&step), 4.0);
    }

    #[test]
    fn test_gate_level_internal() {
        let step = pulse_step(4.0, 1, 32.0);
        assert_eq!(PulseExpander::gate_level(&step, 1.0, &[0.0, 0.0]), GATE_HIGH);
        assert_eq!(PulseExpander::gate_level(&step, 5.0, &[10.0, 10.0]), 0.0);
    }

    #[test]
    fn test_gate_level_external_pass_through() {
        let mut step = pulse_step(4.0, 2, 10.0);
        step.gate_source = GateSource::ExternalGate2;
        let inputs = [1.0, 7.5];

        assert_eq!(PulseExpander::gate_level(&step, 6.0, &inputs), 7.5);
        assert_eq!(PulseExpander::gate_level(&step, 13.9, &inputs), 7.5);
        assert_eq!(PulseExpander::gate_level(&step, 14.0, &inputs), 0.0);
        assert_eq!(PulseExpander::gate_level(&step, -1.0, &inputs), 0.0);
        assert_eq!(PulseExpander::gate_level(&step, 2.0, &[0.0, 25.0]), CV_LIMIT);
    }
}
