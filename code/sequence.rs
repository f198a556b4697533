//! The timeline: a fixed set of tracks holding tick-stamped messages.

use crate::error::{Error, Result};
use crate::message::ShortMessage;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MidiEvent {
  pub message: ShortMessage,
  pub tick: u64,
}

/// Events of one lane, kept sorted by tick.
#[derive(Clone, Debug, Default)]
pub struct Track {
  events: Vec<MidiEvent>,
}

impl Track {
  /// Insert `event` after every event with the same or an earlier tick.
  pub fn add(&mut self, event: MidiEvent) {
    let at: usize = self.events.partition_point(|e| e.tick <= event.tick);
    self.events.insert(at, event);
  }

  pub fn events(&self) -> &[MidiEvent] {
    &self.events
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }
}

#[derive(Clone, Debug)]
pub struct Sequence {
  resolution: u32,
  tracks: Vec<Track>,
}

impl Sequence {
  /// A sequence with `track_count` empty tracks and `resolution` ticks per beat.
  pub fn new(resolution: u32, track_count: usize) -> Result<Sequence> {
    if resolution == 0 {
      return Err(Error::InvalidSequence {
        reason: "resolution must be at least one tick per beat".to_string(),
      });
    }
    Ok(Sequence {
      resolution,
      tracks: vec![Track::default(); track_count],
    })
  }

  /// Ticks per beat.
  pub fn resolution(&self) -> u32 {
    self.resolution
  }

  pub fn tracks(&self) -> &[Track] {
    &self.tracks
  }

  pub fn track_mut(&mut self, index: usize) -> Result<&mut Track> {
    let count: usize = self.tracks.len();
    self.tracks
      .get_mut(index)
      .ok_or(Error::NoSuchTrack { index, count })
  }

  pub fn event_count(&self) -> usize {
    self.tracks.iter().map(Track::len).sum()
  }

  /// Tick of the last event across all tracks.
  pub fn tick_length(&self) -> u64 {
    self.tracks
      .iter()
      .filter_map(|t| t.events.last())
      .map(|e| e.tick)
      .max()
      .unwrap_or(0)
  }

  /// All events merged into playback order. Events on the same tick keep
  /// their per-track order, lower tracks first.
  pub fn merged_events(&self) -> Vec<MidiEvent> {
    let mut merged: Vec<MidiEvent> = self.tracks
      .iter()
      .flat_map(|t| t.events.iter().copied())
      .collect();
    // stable, so insertion order on equal ticks survives
    merged.sort_by_key(|e| e.tick);
    merged
  }
}
