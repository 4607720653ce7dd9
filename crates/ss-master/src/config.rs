//! Synth configuration file.
//!
//! ```toml
//! waveform = "saw"
//! effects = ["lowpass", "delay"]
//! sample_rate = 48000
//! buffer_frames = 256
//! midi_port = 1
//!
//! [envelope]
//! attack = 0.01
//! release = 0.5
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};
use ss_engine::{AdsrParams, Engine, EngineConfig, Waveform, DEFAULT_SAMPLE_RATE};
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub waveform: String,
    /// Effect names in chain order.
    pub effects: Vec<String>,
    pub sample_rate: u32,
    /// Device buffer size in frames; 0 lets the driver choose.
    pub buffer_frames: u32,
    /// MIDI input port index. Unset picks the first hardware port.
    pub midi_port: Option<usize>,
    pub envelope: EnvelopeConfig,
    pub drift: DriftConfig,
    pub secondary: SecondaryConfig,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            waveform: "sine".to_string(),
            effects: Vec::new(),
            sample_rate: 44_100,
            buffer_frames: 512,
            midi_port: None,
            envelope: EnvelopeConfig::default(),
            drift: DriftConfig::default(),
            secondary: SecondaryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        let p = AdsrParams::default();
        Self {
            attack: p.attack,
            decay: p.decay,
            sustain: p.sustain,
            release: p.release,
        }
    }
}

impl From<EnvelopeConfig> for AdsrParams {
    fn from(c: EnvelopeConfig) -> Self {
        AdsrParams::new(c.attack, c.decay, c.sustain, c.release)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub rate_hz: f32,
    pub amount_cents: f32,
    pub jitter_cents: f32,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            rate_hz: 0.35,
            amount_cents: 4.0,
            jitter_cents: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub enabled: bool,
    pub mix: f32,
    pub detune_cents: f32,
    pub octave_offset: i32,
    /// Shape of the secondary oscillator; defaults to the primary's.
    pub waveform: Option<String>,
}

impl SynthConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The rate the engine actually runs at. A rate of 0 means the default.
    pub fn effective_sample_rate(&self) -> u32 {
        if self.sample_rate == 0 {
            DEFAULT_SAMPLE_RATE as u32
        } else {
            self.sample_rate
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The part of the configuration `Engine::configure` consumes.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            waveform: self.waveform.clone(),
            effects: self.effects.clone(),
            envelope: self.envelope.into(),
        }
    }

    /// Configure `engine` completely: waveform, chain, envelope, drift and
    /// the secondary oscillator.
    pub fn apply_to(&self, engine: &mut Engine) {
        engine.configure(&self.engine_config());
        engine.set_drift_parameters(
            self.drift.rate_hz,
            self.drift.amount_cents,
            self.drift.jitter_cents,
        );

        let s = &self.secondary;
        engine.configure_secondary_oscillator(s.enabled, s.mix, s.detune_cents, s.octave_offset);
        if let Some(name) = &s.waveform {
            match Waveform::from_name(name) {
                Some(waveform) => engine.set_secondary_waveform(waveform),
                None => warn!(name = %name, "unknown secondary waveform, keeping primary"),
            }
        }
    }
}
