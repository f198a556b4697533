//! Where the bytes go: a `midir` output connection, or anything else that
//! accepts raw MIDI messages.
//!
//! # Where to hear it
//!
//! With the default virtual port, connect the player to a synthesizer:
//! ```sh
//! aconnect -l                # find 'scale-player'
//! aconnect 128:0 129:0       # player -> synth (adjust numbers)
//! ```
//! or pass `--port <name>` to open an existing port directly.

use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use crate::error::{Error, Result};

/// Receiver of raw MIDI messages. Playback calls it from its own thread.
pub trait MidiSink: Send {
  fn send(&mut self, message: &[u8]) -> Result<()>;
}

impl MidiSink for MidiOutputConnection {
  fn send(&mut self, message: &[u8]) -> Result<()> {
    MidiOutputConnection::send(self, message)
      .map_err(|source| Error::SendFailed { source })
  }
}

/// Which output port to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortTarget {
  /// Create a new port that other clients connect to (Unix only).
  Virtual(String),
  /// The first port whose name contains this text, ignoring case.
  Named(String),
  /// Whatever port the system lists first.
  First,
}

pub fn list_ports(client_name: &str) -> Result<Vec<String>> {
  let midi_out: MidiOutput = open_client(client_name)?;
  midi_out
    .ports()
    .iter()
    .map(|port| midi_out.port_name(port).map_err(|source| Error::PortInfo { source }))
    .collect()
}

pub fn connect(client_name: &str, target: &PortTarget) -> Result<MidiOutputConnection> {
  let midi_out: MidiOutput = open_client(client_name)?;
  match target {
    PortTarget::Virtual(name) => connect_virtual(midi_out, name),
    PortTarget::Named(pattern) => {
      let (port, port_name): (MidiOutputPort, String) =
        find_port(&midi_out, Some(pattern.as_str()))?;
      info!("Connecting to MIDI output '{}'", port_name);
      midi_out
        .connect(&port, client_name)
        .map_err(|source| Error::Connect { port: port_name, source })
    }
    PortTarget::First => {
      let (port, port_name): (MidiOutputPort, String) = find_port(&midi_out, None)?;
      info!("Connecting to MIDI output '{}'", port_name);
      midi_out
        .connect(&port, client_name)
        .map_err(|source| Error::Connect { port: port_name, source })
    }
  }
}

fn open_client(client_name: &str) -> Result<MidiOutput> {
  MidiOutput::new(client_name).map_err(|source| Error::BackendUnavailable { source })
}

#[cfg(unix)]
fn connect_virtual(midi_out: MidiOutput, name: &str) -> Result<MidiOutputConnection> {
  use midir::os::unix::VirtualOutput;

  let conn: MidiOutputConnection =
    midi_out.create_virtual(name).map_err(|source| Error::Connect {
      port: name.to_string(),
      source,
    })?;
  info!("Created virtual MIDI port '{}'", name);
  Ok(conn)
}

#[cfg(not(unix))]
fn connect_virtual(_midi_out: MidiOutput, _name: &str) -> Result<MidiOutputConnection> {
  Err(Error::VirtualUnsupported)
}

fn find_port(midi_out: &MidiOutput, pattern: Option<&str>) -> Result<(MidiOutputPort, String)> {
  for port in midi_out.ports() {
    let name: String = midi_out
      .port_name(&port)
      .map_err(|source| Error::PortInfo { source })?;
    debug!("Found MIDI output '{}'", name);
    if pattern.map_or(true, |p| name_matches(&name, p)) {
      return Ok((port, name));
    }
  }
  Err(Error::NoSuchPort {
    pattern: pattern.unwrap_or("<any>").to_string(),
  })
}

fn name_matches(port_name: &str, pattern: &str) -> bool {
  port_name.to_lowercase().contains(&pattern.to_lowercase())
}
