//! Resonant low-pass biquad filter.
//!
//! 2nd-order (12 dB/oct) low-pass with coefficients from the Audio EQ
//! Cookbook (Robert Bristow-Johnson), processed per channel in Direct
//! Form II Transposed.

use core::f32::consts::PI;

use super::{EffectParams, Processor};
use crate::frame::Frame;

const DEFAULT_CUTOFF: f32 = 1200.0;
const DEFAULT_Q: f32 = 0.9;
const MIN_CUTOFF: f32 = 20.0;
/// Highest cutoff, relative to Nyquist.
const MAX_CUTOFF_RATIO: f32 = 0.45;
const MIN_SAMPLE_RATE: f32 = 100.0;
const MIN_Q: f32 = 0.1;
const MAX_Q: f32 = 10.0;

/// Parameter changes below this are ignored.
const EPSILON: f32 = 1e-3;

/// Per-channel filter history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct State {
    z1: f32,
    z2: f32,
}

/// A stereo resonant low-pass filter with dry/wet mix.
#[derive(Debug, Clone)]
pub struct LowPass {
    cutoff: f32,
    q: f32,
    mix: f32,
    sample_rate: f32,

    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    left: State,
    right: State,
}

impl LowPass {
    /// Create a filter with the default resonance (0.9) and a fully wet mix.
    /// A non-finite cutoff falls back to 1200 Hz.
    pub fn new(cutoff: f32, sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() {
            sample_rate.max(MIN_SAMPLE_RATE)
        } else {
            44100.0
        };
        let cutoff = if cutoff.is_finite() { cutoff } else { DEFAULT_CUTOFF };
        let mut lp = Self {
            cutoff: clamp_cutoff(cutoff, sample_rate),
            q: DEFAULT_Q,
            mix: 1.0,
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            left: State::default(),
            right: State::default(),
        };
        lp.update_coefficients();
        lp
    }

    pub fn with_resonance(mut self, q: f32) -> Self {
        self.set_resonance(q);
        self
    }

    pub fn with_mix(mut self, mix: f32) -> Self {
        self.set_mix(mix);
        self
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn resonance(&self) -> f32 {
        self.q
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Normalized coefficients `(b0, b1, b2, a1, a2)`.
    pub fn coefficients(&self) -> (f32, f32, f32, f32, f32) {
        (self.b0, self.b1, self.b2, self.a1, self.a2)
    }

    /// Set the cutoff, clamped to [20 Hz, 0.45 × Nyquist]. Non-finite
    /// values are ignored.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if !cutoff.is_finite() {
            return;
        }
        let clamped = clamp_cutoff(cutoff, self.sample_rate);
        if (clamped - self.cutoff).abs() < EPSILON {
            return;
        }
        self.cutoff = clamped;
        self.update_coefficients();
    }

    /// Set Q, clamped to [0.1, 10].
    pub fn set_resonance(&mut self, q: f32) {
        if !q.is_finite() {
            return;
        }
        let clamped = q.clamp(MIN_Q, MAX_Q);
        if (clamped - self.q).abs() < EPSILON {
            return;
        }
        self.q = clamped;
        self.update_coefficients();
    }

    pub fn set_mix(&mut self, mix: f32) {
        if !mix.is_finite() {
            return;
        }
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !sample_rate.is_finite() {
            return;
        }
        let rate = sample_rate.max(MIN_SAMPLE_RATE);
        if (rate - self.sample_rate).abs() < EPSILON {
            return;
        }
        self.sample_rate = rate;
        self.cutoff = clamp_cutoff(self.cutoff, rate);
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.cutoff / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * self.q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 * 0.5;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        let inv_a0 = 1.0 / a0;
        self.b0 = b0 * inv_a0;
        self.b1 = b1 * inv_a0;
        self.b2 = b2 * inv_a0;
        self.a1 = a1 * inv_a0;
        self.a2 = a2 * inv_a0;
    }

    #[inline]
    fn tick(&self, state: &mut State, input: f32) -> f32 {
        let wet = self.b0 * input + state.z1;
        state.z1 = self.b1 * input - self.a1 * wet + state.z2;
        state.z2 = self.b2 * input - self.a2 * wet;
        (1.0 - self.mix) * input + self.mix * wet
    }
}

fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * 0.5 * MAX_CUTOFF_RATIO).max(MIN_CUTOFF);
    cutoff.clamp(MIN_CUTOFF, max)
}

impl Default for LowPass {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF, 44100.0)
    }
}

impl Processor for LowPass {
    #[inline]
    fn process(&mut self, frame: Frame) -> Frame {
        let mut left = self.left;
        let mut right = self.right;
        let out = Frame {
            left: self.tick(&mut left, frame.left),
            right: self.tick(&mut right, frame.right),
        };
        self.left = left;
        self.right = right;
        out
    }

    fn reset(&mut self) {
        self.left = State::default();
        self.right = State::default();
    }

    fn apply_note_context(&mut self, _frequency: f32, sample_rate: f32) {
        self.set_sample_rate(sample_rate);
    }

    fn apply_params(&mut self, params: &EffectParams) -> bool {
        match *params {
            EffectParams::LowPass {
                cutoff_hz,
                resonance,
            } => {
                self.set_cutoff(cutoff_hz);
                self.set_resonance(resonance);
                true
            }
            _ => false,
        }
    }
}
