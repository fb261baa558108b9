//! # Scribe - Pitch-to-Notation Front End
//!
//! Drives the scribe core from a frame source and shows the results in the
//! terminal.
//!
//! ## Architecture
//! - **Source thread**: replays a recorded frame stream (file or stdin) or,
//!   with the `live` feature, captures the microphone
//! - **Command thread**: reads UI commands from the terminal
//! - **Main thread**: owns the session and `select!`s over both channels

#[cfg(feature = "live")]
mod audio;
mod display;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender, never};
use log::{debug, info, warn};
use scribe_core::{Frame, ScribeConfig, Session};
use source::{Control, SourceEvent, SourceKind};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;

/// Transcribe a monophonic pitch stream into a quantized score.
#[derive(Debug, Parser)]
#[command(name = "scribe", version)]
struct Args {
    /// JSON config file; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tempo in beats per minute, overriding the config.
    #[arg(long)]
    tempo: Option<f64>,

    /// Recorded frame stream (`<ms> <hz|->` per line). Reads stdin if omitted.
    #[arg(long, conflicts_with = "live")]
    frames: Option<PathBuf>,

    /// Pace a recorded stream to its timestamps.
    #[arg(long)]
    realtime: bool,

    /// Capture from the default microphone.
    #[arg(long)]
    live: bool,

    /// Print the final score and measures as JSON.
    #[arg(long)]
    json: bool,
}

/// Commands accepted from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    ClearScore,
    Listen(bool),
    ShowScore,
    ShowMeasures,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let words: Vec<_> = line.split_whitespace().collect();
    match words.as_slice() {
        ["clear"] => Some(Command::ClearScore),
        ["listen", "on"] | ["resume"] => Some(Command::Listen(true)),
        ["listen", "off"] | ["pause"] => Some(Command::Listen(false)),
        ["score"] => Some(Command::ShowScore),
        ["measures"] => Some(Command::ShowMeasures),
        ["quit"] | ["exit"] => Some(Command::Quit),
        _ => None,
    }
}

fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => warn!(
                    "unknown command `{}` (try: clear, listen on|off, score, measures, quit)",
                    line.trim()
                ),
            }
        }
    });
    rx
}

fn load_config(args: &Args) -> Result<ScribeConfig> {
    let mut config = match &args.config {
        Some(path) => ScribeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScribeConfig::default(),
    };
    if let Some(tempo) = args.tempo {
        config.tempo_bpm = tempo;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn source_kind(args: &Args, config: &ScribeConfig) -> Result<SourceKind> {
    if args.live {
        #[cfg(feature = "live")]
        return Ok(SourceKind::Live(config.clone()));
        #[cfg(not(feature = "live"))]
        {
            let _ = config;
            anyhow::bail!("--live requires building with the `live` feature");
        }
    }
    Ok(SourceKind::Recorded {
        path: args.frames.clone(),
        realtime: args.realtime,
    })
}

fn print_score(session: &Session) {
    print!("{}", display::score_text(&session.snapshot()));
}

fn print_measures(session: &Session) {
    println!("{}", display::measures_text(&session.quantize()));
}

/// Main-loop state: the session behind the listen gate.
struct Frontend {
    session: Session,
    listening: bool,
    last_readout: String,
}

impl Frontend {
    fn new(session: Session) -> Self {
        Self {
            session,
            listening: true,
            last_readout: String::new(),
        }
    }

    /// Feeds `frame` to the tracker unless listening is off.
    ///
    /// Returns the readout line when it differs from the last one shown.
    fn on_frame(&mut self, frame: Frame) -> Option<String> {
        if !self.listening {
            return None;
        }
        let readout = display::readout(self.session.push_frame(frame).as_ref());
        if readout == self.last_readout {
            return None;
        }
        self.last_readout.clone_from(&readout);
        Some(readout)
    }

    /// Applies a terminal command, forwarding listen changes to the source.
    /// Returns `false` once the user asks to quit.
    fn on_command(&mut self, command: Command, control: &Sender<Control>) -> bool {
        match command {
            Command::ClearScore => {
                self.session.clear_score();
                info!("Score cleared");
            }
            Command::Listen(on) => {
                self.listening = on;
                let _ = control.send(Control::Listen(on));
                info!("Listening {}", if on { "on" } else { "off" });
            }
            Command::ShowScore => print_score(&self.session),
            Command::ShowMeasures => print_measures(&self.session),
            Command::Quit => return false,
        }
        true
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let session = Session::new(config.quantizer()?);
    let kind = source_kind(&args, &config)?;

    // Stdin carries commands unless it is the frame source.
    let interactive = args.live || args.frames.is_some();
    let mut commands = if interactive {
        spawn_command_reader()
    } else {
        never()
    };

    info!(
        "Starting scribe at {} bpm ({} ms per half-beat)",
        config.tempo_bpm,
        session.quantizer().half_beat_ms()
    );

    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let worker = source::spawn(kind, events_tx);

    let mut frontend = Frontend::new(session);

    loop {
        let mut commands_closed = false;
        crossbeam_channel::select! {
            recv(events_rx) -> msg => match msg {
                Ok(SourceEvent::Frame(frame)) => {
                    if let Some(readout) = frontend.on_frame(frame) {
                        println!("{readout}");
                    }
                }
                Ok(SourceEvent::Failed(e)) => {
                    worker.shutdown();
                    return Err(e);
                }
                Err(_) => {
                    debug!("frame source finished");
                    break;
                }
            },
            recv(commands) -> msg => match msg {
                Ok(command) => {
                    if !frontend.on_command(command, &worker.control) {
                        break;
                    }
                }
                Err(_) => commands_closed = true,
            },
        }
        if commands_closed {
            commands = never();
        }
    }

    worker.shutdown();
    let session = frontend.session;

    if args.json {
        let score = session.snapshot();
        let measures = session.quantize();
        let transcript = display::Transcript {
            tempo_bpm: config.tempo_bpm,
            half_beat_ms: session.quantizer().half_beat_ms(),
            score: &score,
            measures: &measures,
        };
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    } else {
        print_score(&session);
        print_measures(&session);
    }
    Ok(())
}
