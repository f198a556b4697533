//! Sequencer - plays a `Sequence` to a `MidiSink` in real time
//!
//! Playback runs on a background thread that works from an owned snapshot of
//! the events, so the sequence can be edited or replaced while it plays.
//! Stopping bumps a generation counter. The thread notices it between short
//! sleeps, silences whatever is still sounding, and exits.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::message::{ShortMessage, NOTE_OFF};
use crate::output::MidiSink;
use crate::sequence::{MidiEvent, Sequence};

const STOP_POLL_MS: u64 = 3; // longest sleep before checking for a stop

type SharedSink = Arc<Mutex<Box<dyn MidiSink>>>;

pub struct Sequencer {
  sink: SharedSink,
  sequence: Sequence,
  tempo_bpm: f64,
  running: Arc<AtomicBool>,
  generation: Arc<AtomicU64>,
  playback: Option<thread::JoinHandle<()>>,
}

impl Sequencer {
  /// Open a sequencer writing to `sink`, starting with `sequence` at `tempo_bpm`.
  pub fn open(sink: Box<dyn MidiSink>, sequence: Sequence, tempo_bpm: f64) -> Result<Sequencer> {
    check_tempo(tempo_bpm)?;
    Ok(Sequencer {
      sink: Arc::new(Mutex::new(sink)),
      sequence,
      tempo_bpm,
      running: Arc::new(AtomicBool::new(false)),
      generation: Arc::new(AtomicU64::new(0)),
      playback: None,
    })
  }

  pub fn sequence(&self) -> &Sequence {
    &self.sequence
  }

  pub fn sequence_mut(&mut self) -> &mut Sequence {
    &mut self.sequence
  }

  /// Replace the sequence. A playback already in progress keeps its snapshot.
  pub fn set_sequence(&mut self, sequence: Sequence) {
    self.sequence = sequence;
  }

  pub fn tempo_bpm(&self) -> f64 {
    self.tempo_bpm
  }

  /// Takes effect at the next `start`.
  pub fn set_tempo_bpm(&mut self, tempo_bpm: f64) -> Result<()> {
    check_tempo(tempo_bpm)?;
    self.tempo_bpm = tempo_bpm;
    Ok(())
  }

  /// Real time covered by one tick at the current tempo and resolution.
  pub fn tick_duration(&self) -> Duration {
    Duration::from_secs_f64(60.0 / (self.tempo_bpm * self.sequence.resolution() as f64))
  }

  pub fn is_running(&self) -> bool {
    self.running.load(Ordering::SeqCst)
  }

  /// Start playing the sequence from tick 0. Does nothing if already playing.
  pub fn start(&mut self) {
    if self.is_running() {
      return;
    }
    // a previous playback that ran to its end still needs reaping
    self.join_playback();

    let events: Vec<MidiEvent> = self.sequence.merged_events();
    let tick: Duration = self.tick_duration();
    debug!(
      "Starting playback of {} events ({} ticks at {:?} per tick)",
      events.len(),
      self.sequence.tick_length(),
      tick
    );

    let my_gen: u64 = self.generation.load(Ordering::SeqCst);
    let sink: SharedSink = Arc::clone(&self.sink);
    let generation: Arc<AtomicU64> = Arc::clone(&self.generation);
    let running: Arc<AtomicBool> = Arc::clone(&self.running);
    running.store(true, Ordering::SeqCst);
    self.playback = Some(thread::spawn(move || {
      let _idle_on_exit: IdleOnExit = IdleOnExit(running);
      run_playback(&events, tick, &sink, &generation, my_gen);
    }));
  }

  /// Stop playback and silence sounding notes. Does nothing when idle.
  pub fn stop(&mut self) {
    if self.playback.is_none() {
      return;
    }
    self.generation.fetch_add(1, Ordering::SeqCst);
    self.join_playback();
    self.running.store(false, Ordering::SeqCst);
    debug!("Playback stopped");
  }

  fn join_playback(&mut self) {
    if let Some(handle) = self.playback.take() {
      if handle.join().is_err() {
        warn!("Playback thread panicked");
      }
    }
  }
}

impl Drop for Sequencer {
  fn drop(&mut self) {
    self.stop();
  }
}

/// Clears the running flag when the playback thread ends, even by panic.
struct IdleOnExit(Arc<AtomicBool>);

impl Drop for IdleOnExit {
  fn drop(&mut self) {
    self.0.store(false, Ordering::SeqCst);
  }
}

fn check_tempo(tempo_bpm: f64) -> Result<()> {
  if !(tempo_bpm.is_finite() && tempo_bpm > 0.0) {
    return Err(Error::InvalidSequence {
      reason: format!("tempo {} bpm must be positive", tempo_bpm),
    });
  }
  Ok(())
}

fn run_playback(
  events: &[MidiEvent],
  tick: Duration,
  sink: &SharedSink,
  generation: &AtomicU64,
  my_gen: u64,
) {
  let mut active_notes: HashSet<(u8, u8)> = HashSet::new();
  let start: Instant = Instant::now();

  for event in events {
    let target_time: Instant = start + tick_offset(tick, event.tick);
    let now: Instant = Instant::now();
    if target_time > now && interruptible_sleep(target_time - now, generation, my_gen) {
      send_all_notes_off(sink, &active_notes);
      return;
    }
    if generation.load(Ordering::SeqCst) != my_gen {
      send_all_notes_off(sink, &active_notes);
      return;
    }

    track_active(&mut active_notes, &event.message);
    trace!("{:5}: send {:02X?}", event.tick, event.message.as_bytes());
    send(sink, event.message.as_bytes());
  }
  debug!("Playback reached the end of the sequence");
}

fn tick_offset(tick: Duration, ticks: u64) -> Duration {
  Duration::from_secs_f64(tick.as_secs_f64() * ticks as f64)
}

fn track_active(active_notes: &mut HashSet<(u8, u8)>, message: &ShortMessage) {
  if message.is_note_on() {
    active_notes.insert((message.channel(), message.data1()));
  } else if message.is_note_off() {
    active_notes.remove(&(message.channel(), message.data1()));
  }
}

/// Sleep for `duration`, waking every few milliseconds to check for a stop.
/// Returns true when interrupted.
fn interruptible_sleep(duration: Duration, generation: &AtomicU64, my_gen: u64) -> bool {
  let chunk: Duration = Duration::from_millis(STOP_POLL_MS);
  let mut remaining: Duration = duration;
  while remaining > Duration::ZERO {
    if generation.load(Ordering::SeqCst) != my_gen {
      return true;
    }
    let to_sleep: Duration = remaining.min(chunk);
    thread::sleep(to_sleep);
    remaining = remaining.saturating_sub(to_sleep);
  }
  false
}

fn send_all_notes_off(sink: &SharedSink, active_notes: &HashSet<(u8, u8)>) {
  for &(channel, note) in active_notes.iter() {
    send(sink, &[NOTE_OFF | channel, note, 0]);
  }
}

fn send(sink: &SharedSink, message: &[u8]) {
  match sink.lock() {
    Ok(mut sink) => {
      if let Err(e) = sink.send(message) {
        warn!("{}", e);
      }
    }
    Err(_) => warn!("MIDI output is poisoned, dropping {:02X?}", message),
  }
}
