//! Scale Player - plays an octave up and down on a MIDI output
//!
//! # How to run
//!
//! ```sh
//! cargo run --bin scale_player                 # virtual port 'scale-player:scale-out'
//! cargo run --bin scale_player -- --list-ports
//! cargo run --bin scale_player -- --port fluid
//! ```
//!
//! Then type `play` (you'll be asked for a starting note), `stop`, or `exit`.

use std::io;

use log::{error, info};
use midir::MidiOutputConnection;
use structopt::StructOpt;

use scale_player::controller::{self, Controller};
use scale_player::output::{self, PortTarget};
use scale_player::player::MidiPlayer;

const CLIENT_NAME: &str = "scale-player";

#[derive(Debug, StructOpt)]
#[structopt(name = "scale_player", about = "Plays a scale on a MIDI output")]
struct Opt {
  #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
  verbose: usize,

  /// Open the output port whose name contains this text.
  #[structopt(short, long)]
  port: Option<String>,

  /// Name of the virtual output port created when no --port is given (Unix only).
  #[structopt(long = "virtual", default_value = "scale-out")]
  virtual_name: String,

  /// List the available output ports and exit.
  #[structopt(long)]
  list_ports: bool,

  /// Beats per minute.
  #[structopt(long, default_value = "60")]
  tempo: u32,

  /// Ticks per beat.
  #[structopt(long, default_value = "8")]
  resolution: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let opt: Opt = Opt::from_args();

  let level: log::Level = match opt.verbose {
    0 => log::Level::Info,
    1 => log::Level::Debug,
    _ => log::Level::Trace,
  };
  simple_logger::init_with_level(level)?;

  if opt.list_ports {
    for name in output::list_ports(CLIENT_NAME)? {
      println!("{}", name);
    }
    return Ok(());
  }

  let target: PortTarget = port_target(&opt);
  let mut controller: Controller = match open_player(&opt, &target) {
    Ok(player) => Controller::new(player),
    Err(e) => {
      error!("{}", e);
      std::process::exit(1);
    }
  };

  print_startup_message(&opt, &target);
  let stdin: io::Stdin = io::stdin();
  controller::run_shell(&mut controller, stdin.lock(), io::stdout())?;
  info!("Bye");
  Ok(())
}

fn port_target(opt: &Opt) -> PortTarget {
  match &opt.port {
    Some(pattern) => PortTarget::Named(pattern.clone()),
    None if cfg!(unix) => PortTarget::Virtual(opt.virtual_name.clone()),
    None => PortTarget::First,
  }
}

fn open_player(opt: &Opt, target: &PortTarget) -> scale_player::error::Result<MidiPlayer> {
  let conn: MidiOutputConnection = output::connect(CLIENT_NAME, target)?;
  MidiPlayer::new(opt.resolution, opt.tempo, Box::new(conn))
}

fn print_startup_message(opt: &Opt, target: &PortTarget) {
  println!("Scale player started!");
  println!();
  if let PortTarget::Virtual(name) = target {
    println!("Virtual port created: '{}:{}'", CLIENT_NAME, name);
    println!("Use 'aconnect -l' to see ports, 'aconnect <src> <dst>' to connect a synth.");
    println!();
  }
  println!("Config:");
  println!("  - tempo: {} bpm", opt.tempo);
  println!("  - resolution: {} ticks per beat", opt.resolution);
  println!();
  println!("Commands: play [note], stop, exit");
}
