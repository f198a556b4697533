//! `MidiPlayer` - a small facade for scheduling notes and playing them back.
//!
//! ```
//! # fn main() -> scale_player::error::Result<()> {
//! use scale_player::output::MidiSink;
//! use scale_player::player::MidiPlayer;
//!
//! struct Silent;
//! impl MidiSink for Silent {
//!   fn send(&mut self, _message: &[u8]) -> scale_player::error::Result<()> { Ok(()) }
//! }
//!
//! let mut player = MidiPlayer::new(8, 60, Box::new(Silent))?;
//! player.add_note(60, 100, 0, 1, 0, 0);
//! player.add_note(64, 100, 2, 1, 0, 0);
//! assert_eq!(player.event_count(), 4);
//! player.clear();
//! assert_eq!(player.event_count(), 0);
//! assert!(!player.is_running());
//! # Ok(())
//! # }
//! ```

use log::{debug, error};

use crate::error::Result;
use crate::message::{ShortMessage, NOTE_OFF, NOTE_ON};
use crate::output::MidiSink;
use crate::sequence::{MidiEvent, Sequence};
use crate::sequencer::Sequencer;

pub const NUM_TRACKS: usize = 8;

pub struct MidiPlayer {
  /// Tempo re-applied on every `play`.
  beats_per_minute: u32,
  sequencer: Sequencer,
}

impl MidiPlayer {
  /// `resolution` is in ticks per beat.
  pub fn new(resolution: u32, beats_per_minute: u32, sink: Box<dyn MidiSink>) -> Result<MidiPlayer> {
    let sequence: Sequence = Sequence::new(resolution, NUM_TRACKS)?;
    let sequencer: Sequencer = Sequencer::open(sink, sequence, beats_per_minute as f64)?;
    debug!(
      "Player ready: {} tracks, {} ticks per beat, {} bpm",
      NUM_TRACKS, resolution, beats_per_minute
    );
    Ok(MidiPlayer { beats_per_minute, sequencer })
  }

  /// Ticks per beat.
  pub fn resolution(&self) -> u32 {
    self.sequencer.sequence().resolution()
  }

  pub fn beats_per_minute(&self) -> u32 {
    self.beats_per_minute
  }

  /// Number of low-level events scheduled across all tracks.
  pub fn event_count(&self) -> usize {
    self.sequencer.sequence().event_count()
  }

  pub fn sequence(&self) -> &Sequence {
    self.sequencer.sequence()
  }

  /// Add a raw message at `start_tick` on track `track_index`.
  /// Bad bytes or an unknown track are logged and the event is dropped.
  pub fn add_midi_event(&mut self, status: i32, data1: i32, data2: i32, start_tick: u64, track_index: usize) {
    if let Err(e) = self.try_add_midi_event(status, data1, data2, start_tick, track_index) {
      error!("Dropping MIDI event at tick {}: {}", start_tick, e);
    }
  }

  pub fn try_add_midi_event(
    &mut self,
    status: i32,
    data1: i32,
    data2: i32,
    start_tick: u64,
    track_index: usize,
  ) -> Result<()> {
    let message: ShortMessage = ShortMessage::new(status, data1, data2)?;
    self.sequencer
      .sequence_mut()
      .track_mut(track_index)?
      .add(MidiEvent { message, tick: start_tick });
    Ok(())
  }

  /// Schedule `pitch` (0-127) at `volume` (0-127) on `channel` (0-15) of
  /// track `track_index` (0-7), sounding for `duration` ticks.
  pub fn add_note(
    &mut self,
    pitch: i32,
    volume: i32,
    start_tick: u64,
    duration: u64,
    channel: i32,
    track_index: usize,
  ) {
    self.add_midi_event(
      NOTE_ON as i32 + channel,
      pitch,
      volume,
      start_tick,
      track_index,
    );
    self.add_midi_event(
      NOTE_OFF as i32 + channel,
      pitch,
      volume,
      start_tick + duration,
      track_index,
    );
  }

  /// Play everything scheduled, from the start.
  pub fn play(&mut self) {
    // already checked in `new`
    if let Err(e) = self.sequencer.set_tempo_bpm(self.beats_per_minute as f64) {
      error!("{}", e);
    }
    self.sequencer.start();
  }

  pub fn is_running(&self) -> bool {
    self.sequencer.is_running()
  }

  /// Stop everything currently playing or yet to be played.
  pub fn stop(&mut self) {
    self.sequencer.stop();
  }

  /// Remove every scheduled event, stopping playback first.
  pub fn clear(&mut self) {
    self.sequencer.stop();
    match Sequence::new(self.resolution(), NUM_TRACKS) {
      Ok(sequence) => self.sequencer.set_sequence(sequence),
      Err(e) => error!("{}", e),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::thread;
  use std::time::{Duration, Instant};

  use super::*;
  use crate::output::testing::RecordingSink;

  fn player(sink: &RecordingSink) -> MidiPlayer {
    MidiPlayer::new(10, 6000, Box::new(sink.clone())).unwrap()
  }

  fn wait_for_messages(sink: &RecordingSink, count: usize) {
    let deadline: Instant = Instant::now() + Duration::from_secs(5);
    while sink.messages().len() < count {
      assert!(Instant::now() < deadline, "only {:?} sent", sink.messages());
      thread::sleep(Duration::from_millis(1));
    }
  }

  fn bytes_and_ticks(player: &MidiPlayer, track: usize) -> Vec<(Vec<u8>, u64)> {
    player.sequence().tracks()[track]
      .events()
      .iter()
      .map(|e| (e.message.as_bytes().to_vec(), e.tick))
      .collect()
  }

  #[test]
  fn construction_rejects_zero_resolution_and_tempo() {
    let sink: RecordingSink = RecordingSink::default();
    assert!(MidiPlayer::new(0, 60, Box::new(sink.clone())).is_err());
    assert!(MidiPlayer::new(8, 0, Box::new(sink)).is_err());
  }

  #[test]
  fn add_note_schedules_on_and_off() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.add_note(60, 100, 3, 4, 2, 5);

    assert_eq!(p.event_count(), 2);
    assert_eq!(
      bytes_and_ticks(&p, 5),
      vec![(vec![0x92, 60, 100], 3), (vec![0x82, 60, 100], 7)]
    );
  }

  #[test]
  fn malformed_events_are_dropped() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.add_note(200, 100, 0, 1, 0, 0);
    p.add_note(60, 100, 0, 1, 0, NUM_TRACKS);
    p.add_midi_event(0x10, 60, 100, 0, 0);
    assert_eq!(p.event_count(), 0);
    assert!(p.try_add_midi_event(0x90, 60, 100, 0, NUM_TRACKS).is_err());
  }

  #[test]
  fn clear_keeps_resolution_and_stays_idle() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.add_note(60, 100, 0, 1, 0, 0);
    p.clear();
    assert_eq!(p.event_count(), 0);
    assert_eq!(p.resolution(), 10);
    assert_eq!(p.sequence().tracks().len(), NUM_TRACKS);
    assert!(!p.is_running());
  }

  #[test]
  fn play_after_clear_sends_nothing() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.clear();
    p.play();
    let deadline: Instant = Instant::now() + Duration::from_secs(5);
    while p.is_running() {
      assert!(Instant::now() < deadline);
      thread::sleep(Duration::from_millis(1));
    }
    assert!(sink.messages().is_empty());
  }

  #[test]
  fn clear_during_playback_returns_to_idle() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.add_note(60, 100, 0, 5000, 0, 0);
    p.play();
    wait_for_messages(&sink, 1);
    p.clear();

    assert!(!p.is_running());
    assert_eq!(p.event_count(), 0);
    assert_eq!(sink.messages(), vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]);
  }

  #[test]
  fn play_while_playing_does_not_restart() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.add_note(60, 100, 0, 5000, 0, 0);
    p.play();
    wait_for_messages(&sink, 1);
    p.play();
    thread::sleep(Duration::from_millis(20));
    assert!(p.is_running());
    p.stop();

    // a second playback would have sent a second note-on
    assert_eq!(sink.messages(), vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]);
  }

  #[test]
  fn stop_without_play_is_harmless() {
    let sink: RecordingSink = RecordingSink::default();
    let mut p: MidiPlayer = player(&sink);
    p.stop();
    p.stop();
    assert!(!p.is_running());
  }
}
