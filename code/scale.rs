//! The one tune this player knows: an octave up and back down.
//!
//! Starting from any note, the run climbs a major scale one step every two
//! ticks, rests for two ticks at the top, and walks back down the same steps.

use log::debug;

use crate::player::MidiPlayer;

/// Semitones above the starting note for each step of the run.
pub const DELTAS       : [i32; 8] = [0, 2, 4, 5, 7, 9, 11, 12];
pub const STEP_TICKS   : u64 = 2; // from one note to the next
pub const PAUSE_TICKS  : u64 = 2; // extra rest between the climb and the descent

pub const VOLUME         : i32 = 100;
pub const NOTE_DURATION  : u64 = 1;
pub const CHANNEL        : i32 = 0;
pub const TRACK          : usize = 0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScaleNote {
  pub pitch: i32,
  pub start_tick: u64,
}

/// The sixteen notes of the run starting at `start_note`.
///
/// The start note is not range checked; anything above 115 climbs past the
/// last MIDI note. Pitches wrap on overflow and are left for message
/// validation to reject.
///
/// ```
/// use scale_player::scale::generate;
///
/// let run = generate(60);
/// assert_eq!(run.len(), 16);
/// assert_eq!((run[7].pitch, run[7].start_tick), (72, 14));
/// assert_eq!((run[8].pitch, run[8].start_tick), (72, 18));
/// ```
pub fn generate(start_note: i32) -> Vec<ScaleNote> {
  let mut notes: Vec<ScaleNote> = Vec::with_capacity(2 * DELTAS.len());
  let mut tick: u64 = 0;

  for delta in DELTAS.iter() {
    notes.push(ScaleNote { pitch: start_note.wrapping_add(*delta), start_tick: tick });
    tick += STEP_TICKS;
  }

  tick += PAUSE_TICKS;

  for delta in DELTAS.iter().rev() {
    notes.push(ScaleNote { pitch: start_note.wrapping_add(*delta), start_tick: tick });
    tick += STEP_TICKS;
  }
  notes
}

/// Schedule the run starting at `start_note` on `player`.
pub fn add_scale(player: &mut MidiPlayer, start_note: i32) {
  debug!("Scheduling scale from note {}", start_note);
  for note in generate(start_note) {
    player.add_note(note.pitch, VOLUME, note.start_tick, NOTE_DURATION, CHANNEL, TRACK);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::testing::RecordingSink;

  fn pitches(notes: &[ScaleNote]) -> Vec<i32> {
    notes.iter().map(|n| n.pitch).collect()
  }

  fn ticks(notes: &[ScaleNote]) -> Vec<u64> {
    notes.iter().map(|n| n.start_tick).collect()
  }

  #[test]
  fn middle_c_run() {
    let run: Vec<ScaleNote> = generate(60);
    assert_eq!(pitches(&run[..8]), vec![60, 62, 64, 65, 67, 69, 71, 72]);
    assert_eq!(ticks(&run[..8]), vec![0, 2, 4, 6, 8, 10, 12, 14]);
    assert_eq!(pitches(&run[8..]), vec![72, 71, 69, 67, 65, 64, 62, 60]);
    assert_eq!(ticks(&run[8..]), vec![18, 20, 22, 24, 26, 28, 30, 32]);
  }

  #[test]
  fn any_start_note_gives_the_same_shape() {
    for start in [-12, 0, 37, 115, 300].iter() {
      let run: Vec<ScaleNote> = generate(*start);
      assert_eq!(run.len(), 16);
      let expected: Vec<u64> = (0..=14).step_by(2).chain((18..=32).step_by(2)).collect();
      assert_eq!(ticks(&run), expected);
      for (i, delta) in DELTAS.iter().enumerate() {
        assert_eq!(run[i].pitch, start + delta);
        assert_eq!(run[15 - i].pitch, start + delta);
      }
    }
  }

  #[test]
  fn huge_start_note_wraps_instead_of_panicking() {
    let run: Vec<ScaleNote> = generate(i32::MAX);
    assert_eq!(run.len(), 16);
    assert_eq!(run[0].pitch, i32::MAX);
    assert_eq!(run[1].pitch, i32::MIN + 1);

    let sink: RecordingSink = RecordingSink::default();
    let mut player: MidiPlayer = MidiPlayer::new(8, 60, Box::new(sink)).unwrap();
    add_scale(&mut player, i32::MAX);
    assert_eq!(player.event_count(), 0);
  }

  #[test]
  fn add_scale_schedules_thirty_two_events_on_track_zero() {
    let sink: RecordingSink = RecordingSink::default();
    let mut player: MidiPlayer = MidiPlayer::new(8, 60, Box::new(sink)).unwrap();
    add_scale(&mut player, 60);

    assert_eq!(player.event_count(), 32);
    let track = &player.sequence().tracks()[TRACK];
    assert_eq!(track.len(), 32);
    let first: Vec<(Vec<u8>, u64)> = track.events()[..4]
      .iter()
      .map(|e| (e.message.as_bytes().to_vec(), e.tick))
      .collect();
    assert_eq!(
      first,
      vec![
        (vec![0x90, 60, 100], 0),
        (vec![0x80, 60, 100], 1),
        (vec![0x90, 62, 100], 2),
        (vec![0x80, 62, 100], 3),
      ]
    );
    let last = track.events().last().unwrap();
    assert_eq!((last.message.as_bytes().to_vec(), last.tick), (vec![0x80, 60, 100], 33));
  }

  #[test]
  fn out_of_range_notes_are_dropped_not_fatal() {
    let sink: RecordingSink = RecordingSink::default();
    let mut player: MidiPlayer = MidiPlayer::new(8, 60, Box::new(sink)).unwrap();
    // 120 + 12 = 132 is past the last MIDI note, so the top of the run goes missing
    add_scale(&mut player, 120);
    let valid: usize = generate(120).iter().filter(|n| n.pitch <= 127).count();
    assert_eq!(player.event_count(), valid * 2);
  }
}
