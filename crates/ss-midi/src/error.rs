/// Errors from MIDI port discovery and connection.
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("failed to initialize MIDI input: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI input ports available")]
    NoPorts,
    #[error("MIDI port {requested} does not exist ({available} ports available)")]
    InvalidPort { requested: usize, available: usize },
    #[error("failed to connect to MIDI port '{port}': {reason}")]
    Connect { port: String, reason: String },
}
