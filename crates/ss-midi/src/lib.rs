//! MIDI input for stacksynth.
//!
//! Raw bytes from a midir connection are parsed into [`MidiMessage`]s and
//! translated into engine [`Command`](ss_engine::Command)s by the
//! [`MidiAdapter`].

mod adapter;
mod error;
mod input;
mod message;

pub use adapter::MidiAdapter;
pub use error::MidiError;
pub use input::{is_virtual_port, list_ports, select_port, MidiInput, MidiPortInfo};
pub use message::MidiMessage;
