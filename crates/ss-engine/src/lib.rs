//! Sample generation and effects engine for stacksynth.
//!
//! A monophonic synthesizer with a legato note stack: oscillators, an ADSR
//! envelope, pitch drift, an ordered effect chain and a lock-free tap for
//! visualizing the rendered output. Nothing here performs device, MIDI or
//! file I/O.

mod command;
mod config;
pub mod effects;
mod engine;
mod envelope;
mod frame;
pub mod frequency;
mod modulation;
mod notes;
mod tap;
mod waveform;

pub use command::{Command, ReleaseTarget};
pub use config::EngineConfig;
pub use effects::{Delay, Effect, EffectKind, EffectParams, LowPass, Octave, OctaveMode, Processor};
pub use engine::{Engine, DEFAULT_SAMPLE_RATE, EFFECT_CHAIN_CAPACITY};
pub use envelope::{AdsrParams, Envelope, Stage};
pub use frame::Frame;
pub use frequency::{cents_to_ratio, note_to_frequency, pitch_bend_to_cents};
pub use modulation::{Drift, SecondaryOscillator, MAX_OCTAVE_OFFSET};
pub use notes::{ActiveNote, NoteStack, NOTE_STACK_CAPACITY};
pub use tap::{TapBuffer, MIN_TAP_FRAMES};
pub use waveform::Waveform;
