//! Channel voice message parsing.

/// The MIDI messages the synth reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Centred on zero: -8192 (full down) to 8191 (full up).
    PitchBend { channel: u8, value: i16 },
}

impl MidiMessage {
    /// Parse one raw message. Running status, system messages and
    /// truncated messages yield `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;
        let channel = status & 0x0F;

        let message = match (status & 0xF0, rest) {
            (0x80, [note, _, ..]) => MidiMessage::NoteOff {
                channel,
                note: *note,
            },
            // Note on with zero velocity is a note off.
            (0x90, [note, 0, ..]) => MidiMessage::NoteOff {
                channel,
                note: *note,
            },
            (0x90, [note, velocity, ..]) => MidiMessage::NoteOn {
                channel,
                note: *note,
                velocity: *velocity,
            },
            (0xB0, [controller, value, ..]) => MidiMessage::ControlChange {
                channel,
                controller: *controller,
                value: *value,
            },
            (0xE0, [lsb, msb, ..]) => {
                let raw = ((*msb as i16 & 0x7F) << 7) | (*lsb as i16 & 0x7F);
                MidiMessage::PitchBend {
                    channel,
                    value: raw - 8192,
                }
            }
            _ => return None,
        };
        Some(message)
    }
}
