//! Errors shared by every part of the player.

use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
  #[snafu(display("MIDI backend unavailable: {}", source))]
  BackendUnavailable { source: midir::InitError },

  #[snafu(display("Could not query MIDI output port: {}", source))]
  PortInfo { source: midir::PortInfoError },

  #[snafu(display("Could not connect to MIDI output {:?}: {}", port, source))]
  Connect {
    port: String,
    source: midir::ConnectError<midir::MidiOutput>,
  },

  #[snafu(display("No MIDI output port matches {:?}", pattern))]
  NoSuchPort { pattern: String },

  #[snafu(display("Virtual MIDI ports are not supported on this platform"))]
  VirtualUnsupported,

  #[snafu(display("Failed to send MIDI message: {}", source))]
  SendFailed { source: midir::SendError },

  #[snafu(display("Invalid sequence: {}", reason))]
  InvalidSequence { reason: String },

  #[snafu(display("Invalid MIDI data: {}", reason))]
  InvalidMidiData { reason: String },

  #[snafu(display("Track index {} out of range (sequence has {} tracks)", index, count))]
  NoSuchTrack { index: usize, count: usize },

  #[snafu(display("Starting note {:?} is not an integer: {}", input, source))]
  ParseNote {
    input: String,
    source: std::num::ParseIntError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
