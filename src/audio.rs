use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink};

use crate::driver::Soundtrack;

const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a track playing on a background thread.
///
/// Dropping the handle detaches: the track plays to the end on its own.
#[derive(Debug)]
pub struct PlaybackHandle {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Silence the track and wait for the playback thread to exit.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Decode and play `path` on a new thread. `speed` rescales the playback rate,
/// which shifts pitch along with tempo.
pub fn spawn<P: AsRef<Path>>(path: P, speed: f64) -> PlaybackHandle {
    let path = path.as_ref().to_path_buf();
    let (stop_tx, stop_rx) = mpsc::channel();

    let thread = thread::spawn(move || {
        if let Err(e) = play(&path, speed, stop_rx) {
            tracing::warn!(path = %path.display(), error = %e, "audio playback failed");
        }
    });

    PlaybackHandle {
        stop_tx,
        thread: Some(thread),
    }
}

fn play(path: &Path, speed: f64, stop_rx: Receiver<()>) -> Result<(), Box<dyn std::error::Error>> {
    // the stream must outlive the sink
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    let source = Decoder::new(BufReader::new(File::open(path)?))?;

    sink.set_speed(speed as f32);
    sink.append(source);
    tracing::debug!(path = %path.display(), speed, "audio started");

    loop {
        match stop_rx.recv_timeout(STOP_CHECK_INTERVAL) {
            Ok(()) => {
                sink.stop();
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                if sink.empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                sink.sleep_until_end();
                break;
            }
        }
    }

    Ok(())
}

/// Plays a level's audio file through the default output device.
#[derive(Debug)]
pub struct FileSoundtrack {
    path: PathBuf,
    playback: Option<PlaybackHandle>,
}

impl FileSoundtrack {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            playback: None,
        }
    }

    pub fn stop(&mut self) {
        if let Some(playback) = self.playback.take() {
            playback.stop();
        }
    }
}

impl Soundtrack for FileSoundtrack {
    fn start(&mut self, speed: f64) {
        self.stop();
        self.playback = Some(spawn(&self.path, speed));
    }
}
