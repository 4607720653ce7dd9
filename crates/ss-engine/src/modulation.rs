//! Pitch modulation state: slow LFO drift, per-note jitter and the
//! secondary oscillator settings.

use core::f32::consts::TAU;

use crate::waveform::Waveform;

/// Largest octave shift of the secondary oscillator, in either direction.
pub const MAX_OCTAVE_OFFSET: i32 = 2;

/// LFO drift plus the jitter range used when notes are triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    /// LFO rate in Hz.
    pub rate_hz: f32,
    /// LFO depth in cents.
    pub amount_cents: f32,
    /// Per-note random detune range in cents (symmetric).
    pub jitter_cents: f32,
    /// Normalized LFO phase in [0, 1).
    phase: f32,
}

impl Drift {
    pub fn new(rate_hz: f32, amount_cents: f32, jitter_cents: f32) -> Self {
        let mut drift = Self {
            rate_hz: 0.0,
            amount_cents: 0.0,
            jitter_cents: 0.0,
            phase: 0.0,
        };
        drift.set_parameters(rate_hz, amount_cents, jitter_cents);
        drift
    }

    /// Update the rates. Negative values clamp to zero.
    pub fn set_parameters(&mut self, rate_hz: f32, amount_cents: f32, jitter_cents: f32) {
        self.rate_hz = non_negative(rate_hz);
        self.amount_cents = non_negative(amount_cents);
        self.jitter_cents = non_negative(jitter_cents);
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restart the LFO at `phase`, wrapped into [0, 1).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
    }

    /// Current LFO offset in cents, then advance one sample.
    #[inline]
    pub fn tick(&mut self, sample_rate: f32) -> f32 {
        let cents = (TAU * self.phase).sin() * self.amount_cents;
        self.phase += self.rate_hz / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        cents
    }
}

impl Default for Drift {
    fn default() -> Self {
        Self::new(0.35, 4.0, 3.0)
    }
}

/// Second oscillator layered on top of the primary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryOscillator {
    pub enabled: bool,
    /// Blend weight in [0, 1].
    pub mix: f32,
    /// Upward detune in cents, never negative.
    pub detune_cents: f32,
    /// Octave shift in [-2, 2].
    pub octave_offset: i32,
    pub waveform: Waveform,
    pub(crate) phase: f32,
}

impl SecondaryOscillator {
    /// Apply settings with clamping. Disabling zeroes every setting and the
    /// phase accumulator; the waveform is kept.
    pub fn configure(&mut self, enabled: bool, mix: f32, detune_cents: f32, octave_offset: i32) {
        self.enabled = enabled;
        if enabled {
            self.mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 0.0 };
            self.detune_cents = non_negative(detune_cents);
            self.octave_offset = octave_offset.clamp(-MAX_OCTAVE_OFFSET, MAX_OCTAVE_OFFSET);
        } else {
            self.mix = 0.0;
            self.detune_cents = 0.0;
            self.octave_offset = 0;
            self.phase = 0.0;
        }
    }

    /// Whether the oscillator contributes to the output.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.enabled && self.mix > 0.0
    }

    /// Frequency multiplier relative to the modulated primary frequency.
    #[inline]
    pub fn ratio(&self) -> f32 {
        crate::frequency::cents_to_ratio(self.detune_cents) * (2.0f32).powi(self.octave_offset)
    }
}

impl Default for SecondaryOscillator {
    fn default() -> Self {
        Self {
            enabled: false,
            mix: 0.0,
            detune_cents: 0.0,
            octave_offset: 0,
            waveform: Waveform::default(),
            phase: 0.0,
        }
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
