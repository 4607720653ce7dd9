//! Control messages for the engine.
//!
//! Control threads never touch the engine directly; they send `Command`s
//! that the render thread applies between samples with `Engine::apply`.

use crate::config::EngineConfig;
use crate::effects::{Effect, EffectParams};
use crate::envelope::AdsrParams;
use crate::waveform::Waveform;

/// Which held notes a release applies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseTarget {
    /// The most recently held note at this frequency.
    Frequency(f32),
    /// Only the top of the note stack.
    MostRecent,
    /// Every held note.
    All,
}

/// One engine operation.
#[derive(Debug)]
pub enum Command {
    Trigger(f32),
    Release(ReleaseTarget),
    /// Raw 14-bit pitch bend, centred on zero.
    SetPitchBend(i32),
    ConfigureSecondary {
        enabled: bool,
        mix: f32,
        detune_cents: f32,
        octave_offset: i32,
    },
    SetSecondaryWaveform(Waveform),
    SetLowPassCutoff(f32),
    SetDrift {
        rate_hz: f32,
        amount_cents: f32,
        jitter_cents: f32,
    },
    UpdateAdsr(AdsrParams),
    AddEffect(Effect),
    UpdateEffectParams(EffectParams),
    ResetEffects,
    ClearEffects,
    SetWaveform(Waveform),
    Configure(Box<EngineConfig>),
}
