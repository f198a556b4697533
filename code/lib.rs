//! Scale player - plays an octave up and down through a MIDI output.
//!
//! The pieces, from the bottom up:
//! - `message`: validated short MIDI messages
//! - `sequence`: tracks of tick-stamped messages
//! - `sequencer`: real-time playback of a sequence on a background thread
//! - `output`: `midir` ports and the `MidiSink` seam
//! - `player`: the note-scheduling facade
//! - `scale`: the run itself
//! - `controller`: play / stop / exit and the terminal loop

pub mod controller;
pub mod error;
pub mod message;
pub mod output;
pub mod player;
pub mod scale;
pub mod sequence;
pub mod sequencer;
