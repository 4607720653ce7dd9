//! MIDI input port discovery and connection via midir.

use midir::{MidiInput as MidirInput, MidiInputConnection};
use tracing::{debug, info};

use crate::error::MidiError;
use crate::message::MidiMessage;

const CLIENT_NAME: &str = "stacksynth";

/// Substrings that mark system or virtual ports rather than controllers.
const VIRTUAL_PORT_MARKERS: [&str; 4] = ["Midi Through", "Announce", "Timer", "PipeWire"];

/// An available input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

pub fn is_virtual_port(name: &str) -> bool {
    VIRTUAL_PORT_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}

/// List input ports in system order.
pub fn list_ports() -> Result<Vec<MidiPortInfo>, MidiError> {
    let midi_in = MidirInput::new(CLIENT_NAME)?;
    Ok(port_infos(&midi_in))
}

fn port_infos(midi_in: &MidirInput) -> Vec<MidiPortInfo> {
    midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index, name })
        })
        .collect()
}

/// Pick the port to open.
///
/// An explicit index must exist. Otherwise the first port that does not
/// look like a system or virtual port wins, falling back to the first port.
pub fn select_port(
    ports: &[MidiPortInfo],
    requested: Option<usize>,
) -> Result<&MidiPortInfo, MidiError> {
    if ports.is_empty() {
        return Err(MidiError::NoPorts);
    }
    match requested {
        Some(index) => ports
            .iter()
            .find(|port| port.index == index)
            .ok_or(MidiError::InvalidPort {
                requested: index,
                available: ports.len(),
            }),
        None => Ok(ports
            .iter()
            .find(|port| !is_virtual_port(&port.name))
            .unwrap_or(&ports[0])),
    }
}

/// An open MIDI input. The connection closes when this is dropped.
pub struct MidiInput {
    connection: Option<MidiInputConnection<()>>,
    port_name: String,
}

impl MidiInput {
    /// Open the selected port and deliver each parsed message to `on_message`
    /// on midir's callback thread.
    pub fn connect<F>(requested: Option<usize>, mut on_message: F) -> Result<Self, MidiError>
    where
        F: FnMut(MidiMessage) + Send + 'static,
    {
        let midi_in = MidirInput::new(CLIENT_NAME)?;
        let infos = port_infos(&midi_in);
        for info in &infos {
            debug!(index = info.index, name = %info.name, "found MIDI port");
        }

        let selected = select_port(&infos, requested)?.clone();
        let ports = midi_in.ports();
        let port = ports.get(selected.index).ok_or(MidiError::InvalidPort {
            requested: selected.index,
            available: ports.len(),
        })?;

        let connection = midi_in
            .connect(
                port,
                "stacksynth-input",
                move |_timestamp, bytes, _| {
                    if let Some(message) = MidiMessage::parse(bytes) {
                        on_message(message);
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect {
                port: selected.name.clone(),
                reason: e.to_string(),
            })?;

        info!(port = %selected.name, index = selected.index, "connected MIDI input");
        Ok(Self {
            connection: Some(connection),
            port_name: selected.name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn close(mut self) {
        self.disconnect();
    }

    fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            debug!(port = %self.port_name, "closed MIDI input");
        }
    }
}

impl Drop for MidiInput {
    fn drop(&mut self) {
        self.disconnect();
    }
}
