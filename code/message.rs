//! Short MIDI messages: one status byte followed by up to two data bytes.
//!
//! Only the byte layout is checked here. Whether a note-on makes musical
//! sense is left to whoever schedules it.

use crate::error::{Error, Result};

pub const NOTE_OFF         : u8 = 0x80;
pub const NOTE_ON          : u8 = 0x90;
pub const PROGRAM_CHANGE   : u8 = 0xC0;
pub const CHANNEL_PRESSURE : u8 = 0xD0;
pub const SYSTEM           : u8 = 0xF0;
pub const SYSEX_START      : u8 = 0xF0;
pub const SYSEX_END        : u8 = 0xF7;

/// A validated status byte plus its data bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShortMessage {
  bytes: [u8; 3],
  len: usize,
}

impl ShortMessage {
  /// Build a message from raw integer values, as a caller juggling
  /// `NOTE_ON + channel` arithmetic would hand them over.
  ///
  /// Data bytes the status does not use are ignored.
  ///
  /// ```
  /// use scale_player::message::*;
  ///
  /// let on = ShortMessage::new(NOTE_ON as i32 + 2, 60, 100).unwrap();
  /// assert_eq!(on.as_bytes(), &[0x92, 60, 100]);
  ///
  /// let program = ShortMessage::new(PROGRAM_CHANGE as i32, 5, 999).unwrap();
  /// assert_eq!(program.as_bytes(), &[0xC0, 5]);
  ///
  /// assert!(ShortMessage::new(0x90, 128, 100).is_err());
  /// ```
  pub fn new(status: i32, data1: i32, data2: i32) -> Result<ShortMessage> {
    if status < 0x80 || status > 0xFF {
      return Err(Error::InvalidMidiData {
        reason: format!("status byte {:#x} outside 0x80..=0xFF", status),
      });
    }
    let status: u8 = status as u8;
    if status == SYSEX_START || status == SYSEX_END {
      return Err(Error::InvalidMidiData {
        reason: format!("status byte {:#x} starts or ends a system exclusive message", status),
      });
    }
    let len: usize = 1 + data_length(status);
    let mut bytes: [u8; 3] = [status, 0, 0];
    for (slot, value) in [data1, data2].iter().enumerate().take(len - 1) {
      bytes[slot + 1] = data_byte(*value)?;
    }
    Ok(ShortMessage { bytes, len })
  }

  pub fn note_on(channel: i32, pitch: i32, velocity: i32) -> Result<ShortMessage> {
    ShortMessage::new(NOTE_ON as i32 + channel, pitch, velocity)
  }

  pub fn note_off(channel: i32, pitch: i32, velocity: i32) -> Result<ShortMessage> {
    ShortMessage::new(NOTE_OFF as i32 + channel, pitch, velocity)
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes[..self.len]
  }

  pub fn status(&self) -> u8 {
    self.bytes[0]
  }

  /// The command nibble, i.e. the status with the channel masked out.
  pub fn command(&self) -> u8 {
    self.bytes[0] & 0xF0
  }

  pub fn channel(&self) -> u8 {
    self.bytes[0] & 0x0F
  }

  pub fn data1(&self) -> u8 {
    self.bytes[1]
  }

  pub fn data2(&self) -> u8 {
    self.bytes[2]
  }

  /// Note-on with a zero velocity counts as a release, as most synths treat it.
  pub fn is_note_on(&self) -> bool {
    self.command() == NOTE_ON && self.data2() > 0
  }

  pub fn is_note_off(&self) -> bool {
    self.command() == NOTE_OFF || (self.command() == NOTE_ON && self.data2() == 0)
  }
}

/// How many data bytes follow `status`.
fn data_length(status: u8) -> usize {
  match status & 0xF0 {
    PROGRAM_CHANGE | CHANNEL_PRESSURE => 1,
    SYSTEM => match status {
      0xF1 | 0xF3 => 1,
      0xF2 => 2,
      _ => 0,
    },
    _ => 2,
  }
}

fn data_byte(value: i32) -> Result<u8> {
  if value < 0 || value > 127 {
    return Err(Error::InvalidMidiData {
      reason: format!("data byte {} outside 0..=127", value),
    });
  }
  Ok(value as u8)
}
