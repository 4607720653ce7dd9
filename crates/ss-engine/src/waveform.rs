//! Stateless waveform generators.
//!
//! A generator maps `(frequency, sample_rate, phase)` to one sample and
//! advances the caller-owned phase. Phase is normalized to [0, 1).

use core::f32::consts::TAU;

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    Sine,
    #[default]
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Look up a waveform by case-insensitive name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sine" => Some(Waveform::Sine),
            "square" => Some(Waveform::Square),
            "sawtooth" | "saw" => Some(Waveform::Sawtooth),
            "triangle" | "tri" => Some(Waveform::Triangle),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Render the sample at the current phase, then advance the phase by
    /// `frequency / sample_rate`, wrapping into [0, 1).
    #[inline]
    pub fn generate(self, frequency: f32, sample_rate: f32, phase: &mut f32) -> f32 {
        let value = self.value_at(*phase);
        *phase += frequency / sample_rate;
        if *phase >= 1.0 {
            *phase -= phase.floor();
        }
        value
    }

    /// Closed-form shape at a given phase, in [-1, 1].
    #[inline]
    pub fn value_at(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            // -1 -> +1 over the first half, +1 -> -1 over the second
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}
