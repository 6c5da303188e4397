// Quantizer - Pitch quantization applied to outputs when quantize is enabled

/// Snaps a 1V/oct voltage onto a set of allowed notes
pub trait Quantizer: Send {
    fn quantize(&self, volts: f32) -> f32;
}

/// Nearest semitone
#[derive(Debug, Clone, Copy, Default)]
pub struct Chromatic;

impl Quantizer for Chromatic {
    fn quantize(&self, volts: f32) -> f32 {
        if !volts.is_finite() {
            return 0.0;
        }
        (volts * 12.0).round() / 12.0
    }
}

/// Nearest note of a scale given as pitch classes relative to a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleQuantizer {
    /// Allowed pitch classes, indexed from C
    allowed: [bool; 12],
}

impl ScaleQuantizer {
    pub const MAJOR: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
    pub const NATURAL_MINOR: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
    pub const PENTATONIC: [u8; 5] = [0, 2, 4, 7, 9];

    /// Build from scale degrees (semitones above the root) and a root pitch class.
    /// An empty degree list falls back to the root alone.
    pub fn new(root: u8, degrees: &[u8]) -> Self {
        let mut allowed = [false; 12];
        for degree in degrees {
            allowed[((root as usize) + (*degree as usize)) % 12] = true;
        }
        if !allowed.iter().any(|&note| note) {
            allowed[(root % 12) as usize] = true;
        }
        Self { allowed }
    }

    pub fn major(root: u8) -> Self {
        Self::new(root, &Self::MAJOR)
    }

    pub fn minor(root: u8) -> Self {
        Self::new(root, &Self::NATURAL_MINOR)
    }

    pub fn is_allowed(&self, semitone: i32) -> bool {
        self.allowed[semitone.rem_euclid(12) as usize]
    }
}

impl Quantizer for ScaleQuantizer {
    fn quantize(&self, volts: f32) -> f32 {
        if !volts.is_finite() {
            return 0.0;
        }
        let exact = volts * 12.0;
        let nearest = exact.round() as i32;

        // Search outwards, preferring the lower note on ties
        for distance in 0..=6 {
            let below = nearest - distance;
            let above = nearest + distance;
            let below_ok = self.is_allowed(below);
            let above_ok = self.is_allowed(above);
            let pick = match (below_ok, above_ok) {
                (true, true) => {
                    if (exact - below as f32).abs() <= (above as f32 - exact).abs() {
                        below
                    } else {
                        above
                    }
                }
                (true, false) => below,
                (false, true) => above,
                (false, false) => continue,
            };
            return pick as f32 / 12.0;
        }
        nearest as f32 / 12.0
    }
}
