//! Controller - the play / stop / exit actions and the terminal loop that
//! drives them.

use std::io::{self, BufRead, Write};

use log::{error, info};

use crate::error::{Error, Result};
use crate::player::MidiPlayer;
use crate::scale;

pub const DEFAULT_START_NOTE: &str = "60";
pub const NOTE_PROMPT: &str = "Give me a starting note (0-115)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  /// Play the scale; carries the note when typed on the same line.
  Play(Option<String>),
  Stop,
  Exit,
}

impl Command {
  /// ```
  /// use scale_player::controller::Command;
  ///
  /// assert_eq!(Command::parse("play"), Some(Command::Play(None)));
  /// assert_eq!(Command::parse(" P 64 "), Some(Command::Play(Some("64".to_string()))));
  /// assert_eq!(Command::parse("quit"), Some(Command::Exit));
  /// assert_eq!(Command::parse("louder"), None);
  /// ```
  pub fn parse(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let command: String = words.next()?.to_lowercase();
    let argument: Option<String> = words.next().map(str::to_string);
    match command.as_str() {
      "play" | "p" => Some(Command::Play(argument)),
      "stop" | "s" => Some(Command::Stop),
      "exit" | "quit" | "q" => Some(Command::Exit),
      _ => None,
    }
  }
}

/// Owns the player for the whole session.
pub struct Controller {
  player: MidiPlayer,
}

impl Controller {
  pub fn new(player: MidiPlayer) -> Controller {
    Controller { player }
  }

  pub fn player(&self) -> &MidiPlayer {
    &self.player
  }

  /// React to the starting-note prompt. `None` means it was cancelled.
  /// An empty answer takes the prompt's default.
  pub fn handle_play(&mut self, answer: Option<&str>) -> Result<()> {
    let answer: &str = match answer {
      Some(answer) => answer.trim(),
      None => return Ok(()),
    };
    let answer: &str = if answer.is_empty() { DEFAULT_START_NOTE } else { answer };
    let start_note: i32 = answer.parse::<i32>().map_err(|source| Error::ParseNote {
      input: answer.to_string(),
      source,
    })?;

    if self.player.is_running() {
      self.player.stop();
    }
    self.player.clear();
    scale::add_scale(&mut self.player, start_note);
    self.player.play();
    info!("Playing scale from note {}", start_note);
    Ok(())
  }

  pub fn handle_stop(&mut self) {
    self.player.stop();
  }

  /// Silence the output before the process goes away.
  pub fn handle_exit(&mut self) {
    self.player.stop();
  }
}

/// Read commands from `input` until `exit` or end of input.
pub fn run_shell<R: BufRead, W: Write>(
  controller: &mut Controller,
  mut input: R,
  mut output: W,
) -> io::Result<()> {
  loop {
    write!(output, "> ")?;
    output.flush()?;
    let line: String = match read_line(&mut input)? {
      Some(line) => line,
      None => break,
    };
    if line.trim().is_empty() {
      continue;
    }
    match Command::parse(&line) {
      Some(Command::Play(argument)) => {
        let answer: Option<String> = match argument {
          Some(note) => Some(note),
          None => {
            write!(output, "{} [{}]: ", NOTE_PROMPT, DEFAULT_START_NOTE)?;
            output.flush()?;
            read_line(&mut input)?
          }
        };
        if let Err(e) = controller.handle_play(answer.as_deref()) {
          error!("{}", e);
        }
      }
      Some(Command::Stop) => controller.handle_stop(),
      Some(Command::Exit) => break,
      None => writeln!(output, "Commands: play [note], stop, exit")?,
    }
  }
  controller.handle_exit();
  Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
  let mut line: String = String::new();
  if input.read_line(&mut line)? == 0 {
    return Ok(None);
  }
  Ok(Some(line))
}
