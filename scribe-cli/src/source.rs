//! Frame sources. Each runs on its own thread and feeds the main loop over a
//! channel, so the tracker is only ever touched from one place.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};
use scribe_core::Frame;
use scribe_core::frames::parse_line;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Messages from a source to the main loop.
#[derive(Debug)]
pub enum SourceEvent {
    Frame(Frame),
    Failed(anyhow::Error),
}

/// Messages from the main loop to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Listen(bool),
    Shutdown,
}

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// A recorded frame stream; `None` reads standard input.
    Recorded { path: Option<PathBuf>, realtime: bool },
    #[cfg(feature = "live")]
    Live(scribe_core::ScribeConfig),
}

/// Handle used to steer and stop a running source.
pub struct SourceWorker {
    pub control: Sender<Control>,
    pub handle: Option<JoinHandle<()>>,
}

impl SourceWorker {
    pub fn shutdown(mut self) {
        let _ = self.control.send(Control::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn spawn(kind: SourceKind, events: Sender<SourceEvent>) -> SourceWorker {
    let (control_tx, control_rx) = crossbeam_channel::unbounded();
    let handle = thread::spawn(move || match kind {
        SourceKind::Recorded { path, realtime } => {
            if let Err(e) = replay(path, realtime, &events, &control_rx) {
                let _ = events.send(SourceEvent::Failed(e));
            }
        }
        #[cfg(feature = "live")]
        SourceKind::Live(config) => crate::audio::run_live(config, events, control_rx),
    });
    SourceWorker {
        control: control_tx,
        handle: Some(handle),
    }
}

fn open(path: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

/// Streams a recorded frame file, optionally paced to its timestamps.
fn replay(
    path: Option<PathBuf>,
    realtime: bool,
    events: &Sender<SourceEvent>,
    control: &Receiver<Control>,
) -> Result<()> {
    let reader = open(&path)?;
    let started = Instant::now();
    let mut last = Duration::ZERO;
    let mut count = 0usize;

    for (i, line) in reader.lines().enumerate() {
        if matches!(control.try_recv(), Ok(Control::Shutdown)) {
            debug!("replay stopped after {count} frames");
            return Ok(());
        }

        let Some(frame) = parse_line(&line?, i + 1)? else {
            continue;
        };
        if frame.timestamp < last {
            anyhow::bail!("frame stream line {}: timestamp goes backwards", i + 1);
        }
        last = frame.timestamp;

        if realtime {
            if let Some(wait) = frame.timestamp.checked_sub(started.elapsed()) {
                thread::sleep(wait);
            }
        }
        if events.send(SourceEvent::Frame(frame)).is_err() {
            break;
        }
        count += 1;
    }
    info!("replayed {count} frames");
    Ok(())
}
