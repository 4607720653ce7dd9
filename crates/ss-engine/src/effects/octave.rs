//! Octave-flavoured harmonic shaper.
//!
//! This is not a pitch shifter. The higher mode blends in a soft-clipped
//! copy of the signal, which adds odd harmonics; the lower mode blends in
//! a one-pole low-passed copy, which weights the low end.

use super::{EffectParams, Processor};
use crate::frame::Frame;
use crate::frequency::MAX_TRIGGER_FREQUENCY;

const SHAPER_DRIVE: f32 = 2.0;
const SHAPER_GAIN: f32 = 0.8;
const SMOOTHING_POLE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OctaveMode {
    #[default]
    Higher,
    Lower,
}

/// Harmonic shaper with a dry/processed blend.
#[derive(Debug, Clone)]
pub struct Octave {
    mode: OctaveMode,
    blend: f32,
    // Note context from the engine. The shaping math does not read these
    // yet; they are kept current for a future pitch-tracking mode.
    frequency: f32,
    sample_rate: f32,
    state_l: f32,
    state_r: f32,
}

impl Octave {
    pub fn new(mode: OctaveMode, blend: f32) -> Self {
        let mut octave = Self {
            mode,
            blend: 0.5,
            frequency: 0.0,
            sample_rate: 44100.0,
            state_l: 0.0,
            state_r: 0.0,
        };
        octave.set_blend(blend);
        octave
    }

    pub fn mode(&self) -> OctaveMode {
        self.mode
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Last note frequency received, or 0 before the first note.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_mode(&mut self, mode: OctaveMode) {
        self.mode = mode;
    }

    /// Clamped to [0, 1]. Non-finite values are ignored.
    pub fn set_blend(&mut self, blend: f32) {
        if !blend.is_finite() {
            return;
        }
        self.blend = blend.clamp(0.0, 1.0);
    }

    /// Frequencies outside (0, 20 kHz] are ignored.
    pub fn set_frequency(&mut self, frequency: f32) {
        if frequency > 0.0 && frequency <= MAX_TRIGGER_FREQUENCY {
            self.frequency = frequency;
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate > 0.0 && sample_rate.is_finite() {
            self.sample_rate = sample_rate;
        }
    }
}

impl Default for Octave {
    fn default() -> Self {
        Self::new(OctaveMode::Higher, 0.5)
    }
}

impl Processor for Octave {
    #[inline]
    fn process(&mut self, frame: Frame) -> Frame {
        if self.blend <= 0.0 {
            return frame;
        }

        let (shaped_l, shaped_r) = match self.mode {
            OctaveMode::Higher => (
                (frame.left * SHAPER_DRIVE).tanh() * SHAPER_GAIN,
                (frame.right * SHAPER_DRIVE).tanh() * SHAPER_GAIN,
            ),
            OctaveMode::Lower => {
                self.state_l = self.state_l * SMOOTHING_POLE + frame.left * (1.0 - SMOOTHING_POLE);
                self.state_r = self.state_r * SMOOTHING_POLE + frame.right * (1.0 - SMOOTHING_POLE);
                (self.state_l, self.state_r)
            }
        };

        let dry = 1.0 - self.blend;
        Frame {
            left: dry * frame.left + self.blend * shaped_l,
            right: dry * frame.right + self.blend * shaped_r,
        }
    }

    fn reset(&mut self) {
        self.state_l = 0.0;
        self.state_r = 0.0;
    }

    fn apply_note_context(&mut self, frequency: f32, sample_rate: f32) {
        self.set_frequency(frequency);
        self.set_sample_rate(sample_rate);
    }

    fn apply_params(&mut self, params: &EffectParams) -> bool {
        match *params {
            EffectParams::Octave { shift, mix } => {
                self.set_mode(if shift > 1.0 {
                    OctaveMode::Higher
                } else {
                    OctaveMode::Lower
                });
                self.set_blend(mix);
                true
            }
            _ => false,
        }
    }
}
