//! Translation from MIDI messages to engine commands.

use ss_engine::{note_to_frequency, Command, ReleaseTarget};

use crate::message::MidiMessage;

/// Maps incoming MIDI to engine control.
///
/// Notes trigger and release by frequency, pitch bend passes through, and
/// one controller (channel volume by default) sweeps the low-pass cutoff
/// exponentially between `min_cutoff` and `max_cutoff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiAdapter {
    pub cutoff_controller: u8,
    pub min_cutoff: f32,
    pub max_cutoff: f32,
}

impl Default for MidiAdapter {
    fn default() -> Self {
        Self {
            cutoff_controller: 7,
            min_cutoff: 80.0,
            max_cutoff: 12_000.0,
        }
    }
}

impl MidiAdapter {
    pub fn translate(&self, message: &MidiMessage) -> Option<Command> {
        match *message {
            MidiMessage::NoteOn { note, .. } if note <= 127 => {
                Some(Command::Trigger(note_to_frequency(note)))
            }
            MidiMessage::NoteOn { .. } => None,
            MidiMessage::NoteOff { note, .. } if note <= 127 => Some(Command::Release(
                ReleaseTarget::Frequency(note_to_frequency(note)),
            )),
            MidiMessage::NoteOff { .. } => Some(Command::Release(ReleaseTarget::All)),
            MidiMessage::PitchBend { value, .. } => Some(Command::SetPitchBend(value as i32)),
            MidiMessage::ControlChange {
                controller, value, ..
            } if controller == self.cutoff_controller => {
                Some(Command::SetLowPassCutoff(self.cutoff_for(value)))
            }
            MidiMessage::ControlChange { .. } => None,
        }
    }

    /// Exponential controller-to-cutoff curve.
    pub fn cutoff_for(&self, value: u8) -> f32 {
        let normalized = value.min(127) as f32 / 127.0;
        self.min_cutoff * (self.max_cutoff / self.min_cutoff).powf(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MidiAdapter {
        MidiAdapter::default()
    }

    #[test]
    fn note_on_triggers_frequency() {
        let cmd = adapter().translate(&MidiMessage::NoteOn {
            channel: 0,
            note: 69,
            velocity: 90,
        });
        match cmd {
            Some(Command::Trigger(f)) => assert!((f - 440.0).abs() < 1e-3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn note_off_releases_frequency() {
        let cmd = adapter().translate(&MidiMessage::NoteOff {
            channel: 0,
            note: 57,
        });
        match cmd {
            Some(Command::Release(ReleaseTarget::Frequency(f))) => {
                assert!((f - 220.0).abs() < 1e-3)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn out_of_range_note_off_releases_all() {
        let cmd = adapter().translate(&MidiMessage::NoteOff {
            channel: 0,
            note: 200,
        });
        assert!(matches!(cmd, Some(Command::Release(ReleaseTarget::All))));
    }

    #[test]
    fn pitch_bend_passes_through() {
        let cmd = adapter().translate(&MidiMessage::PitchBend {
            channel: 0,
            value: -8192,
        });
        assert!(matches!(cmd, Some(Command::SetPitchBend(-8192))));
    }

    #[test]
    fn volume_cc_sweeps_cutoff() {
        let a = adapter();
        assert!((a.cutoff_for(0) - 80.0).abs() < 1e-3);
        assert!((a.cutoff_for(127) - 12_000.0).abs() < 0.5);
        assert!(a.cutoff_for(64) > 80.0 && a.cutoff_for(64) < 12_000.0);

        let cmd = a.translate(&MidiMessage::ControlChange {
            channel: 0,
            controller: 7,
            value: 127,
        });
        assert!(matches!(cmd, Some(Command::SetLowPassCutoff(c)) if (c - 12_000.0).abs() < 0.5));
    }

    #[test]
    fn other_controllers_are_ignored() {
        let cmd = adapter().translate(&MidiMessage::ControlChange {
            channel: 0,
            controller: 1,
            value: 64,
        });
        assert!(cmd.is_none());
    }
}
