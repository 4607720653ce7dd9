//! Stereo effects and the chain element type.
//!
//! Every effect implements [`Processor`]. The chain itself stores the
//! closed [`Effect`] enum so per-note context and parameter updates are
//! dispatched by variant rather than by downcasting.

mod delay;
mod low_pass;
mod octave;

pub use delay::Delay;
pub use low_pass::LowPass;
pub use octave::{Octave, OctaveMode};

use crate::frame::Frame;

/// Core trait for stereo effects.
pub trait Processor: Send {
    /// Transform one stereo frame, updating internal state.
    fn process(&mut self, frame: Frame) -> Frame;

    /// Clear internal buffers and filter history. Configuration is kept.
    fn reset(&mut self);

    /// Receive the frequency of a newly triggered note and the engine
    /// sample rate. Most effects ignore it.
    fn apply_note_context(&mut self, _frequency: f32, _sample_rate: f32) {}

    /// Apply a parameter set. Returns false if the set targets another kind.
    fn apply_params(&mut self, _params: &EffectParams) -> bool {
        false
    }
}

/// Effect kinds, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Delay,
    LowPass,
    Octave,
}

impl EffectKind {
    /// Look up a kind by case-insensitive name or alias.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "delay" | "echo" => Some(EffectKind::Delay),
            "lowpass" | "lpf" | "filter" => Some(EffectKind::LowPass),
            "octave" => Some(EffectKind::Octave),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Delay => "delay",
            EffectKind::LowPass => "lowpass",
            EffectKind::Octave => "octave",
        }
    }
}

/// Parameter updates addressed to one effect kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectParams {
    Delay {
        time_secs: f32,
        feedback: f32,
        mix: f32,
    },
    LowPass {
        cutoff_hz: f32,
        resonance: f32,
    },
    Octave {
        /// Values above 1.0 select the higher mode, anything else the lower.
        shift: f32,
        mix: f32,
    },
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParams::Delay { .. } => EffectKind::Delay,
            EffectParams::LowPass { .. } => EffectKind::LowPass,
            EffectParams::Octave { .. } => EffectKind::Octave,
        }
    }
}

/// One element of the engine's effect chain.
#[derive(Debug)]
pub enum Effect {
    Delay(Delay),
    LowPass(LowPass),
    Octave(Octave),
}

impl Effect {
    /// Build an effect with the defaults used by `Engine::configure`.
    pub fn with_defaults(kind: EffectKind, sample_rate: f32) -> Self {
        match kind {
            EffectKind::Delay => Effect::Delay(Delay::new(0.3, 0.5, 0.5, sample_rate)),
            EffectKind::LowPass => Effect::LowPass(LowPass::new(1000.0, sample_rate)),
            EffectKind::Octave => Effect::Octave(Octave::default()),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Delay(_) => EffectKind::Delay,
            Effect::LowPass(_) => EffectKind::LowPass,
            Effect::Octave(_) => EffectKind::Octave,
        }
    }

    pub fn as_low_pass(&self) -> Option<&LowPass> {
        match self {
            Effect::LowPass(lp) => Some(lp),
            _ => None,
        }
    }

    pub fn as_low_pass_mut(&mut self) -> Option<&mut LowPass> {
        match self {
            Effect::LowPass(lp) => Some(lp),
            _ => None,
        }
    }

    fn processor(&mut self) -> &mut dyn Processor {
        match self {
            Effect::Delay(d) => d,
            Effect::LowPass(lp) => lp,
            Effect::Octave(o) => o,
        }
    }
}

impl Processor for Effect {
    #[inline]
    fn process(&mut self, frame: Frame) -> Frame {
        match self {
            Effect::Delay(d) => d.process(frame),
            Effect::LowPass(lp) => lp.process(frame),
            Effect::Octave(o) => o.process(frame),
        }
    }

    fn reset(&mut self) {
        self.processor().reset();
    }

    fn apply_note_context(&mut self, frequency: f32, sample_rate: f32) {
        self.processor().apply_note_context(frequency, sample_rate);
    }

    fn apply_params(&mut self, params: &EffectParams) -> bool {
        self.processor().apply_params(params)
    }
}

impl From<Delay> for Effect {
    fn from(d: Delay) -> Self {
        Effect::Delay(d)
    }
}

impl From<LowPass> for Effect {
    fn from(lp: LowPass) -> Self {
        Effect::LowPass(lp)
    }
}

impl From<Octave> for Effect {
    fn from(o: Octave) -> Self {
        Effect::Octave(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_aliases() {
        assert_eq!(EffectKind::from_name("Echo"), Some(EffectKind::Delay));
        assert_eq!(EffectKind::from_name("LPF"), Some(EffectKind::LowPass));
        assert_eq!(EffectKind::from_name("filter"), Some(EffectKind::LowPass));
        assert_eq!(EffectKind::from_name("octave"), Some(EffectKind::Octave));
        assert_eq!(EffectKind::from_name("reverb"), None);
    }

    #[test]
    fn params_only_apply_to_matching_kind() {
        let mut effect = Effect::with_defaults(EffectKind::Delay, 44100.0);
        let lp = EffectParams::LowPass {
            cutoff_hz: 500.0,
            resonance: 1.0,
        };
        assert!(!effect.apply_params(&lp));
        let delay = EffectParams::Delay {
            time_secs: 0.1,
            feedback: 0.2,
            mix: 0.3,
        };
        assert!(effect.apply_params(&delay));
        match effect {
            Effect::Delay(d) => assert!((d.delay_time() - 0.1).abs() < 1e-6),
            _ => unreachable!(),
        }
    }

    #[test]
    fn configure_defaults() {
        let lp = Effect::with_defaults(EffectKind::LowPass, 44100.0);
        assert_eq!(lp.as_low_pass().map(|lp| lp.cutoff()), Some(1000.0));
        assert_eq!(Effect::with_defaults(EffectKind::Octave, 44100.0).kind(), EffectKind::Octave);
    }
}
