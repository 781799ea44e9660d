//! Deterministic stand-ins for the terminal and the audio device, for headless runs.
//!
//! Time only moves when the session polls or the driver sleeps, so a whole
//! playthrough runs instantly and reproducibly.

use std::collections::VecDeque;
use std::time::Duration;

use crate::driver::{Soundtrack, Stage};
use crate::session::{LineEvent, LineFrame, LineIo};

/// The parts of a rendered frame worth asserting on.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedFrame {
    pub remaining: f64,
    pub score: u64,
    pub combo: u64,
    pub cursor: usize,
    pub pulse: bool,
}

#[derive(Debug, Default)]
pub struct ScriptedIo {
    clock: f64,
    events: VecDeque<(f64, LineEvent)>,
    frames: Vec<RecordedFrame>,
    sleeps: Vec<f64>,
    upcoming: Vec<Option<String>>,
    clears: usize,
}

impl ScriptedIo {
    /// `events` are `(seconds, event)` pairs in arrival order.
    pub fn new<I: IntoIterator<Item = (f64, LineEvent)>>(events: I) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn sleeps(&self) -> &[f64] {
        &self.sleeps
    }

    pub fn upcoming(&self) -> &[Option<String>] {
        &self.upcoming
    }

    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl LineIo for ScriptedIo {
    fn now(&self) -> f64 {
        self.clock
    }

    fn poll_event(&mut self, timeout: Duration) -> Option<LineEvent> {
        let timeout = timeout.as_secs_f64();
        match self.events.front() {
            Some(&(at, _)) if at <= self.clock + timeout => {
                self.clock = self.clock.max(at);
                self.events.pop_front().map(|(_, event)| event)
            }
            _ => {
                self.clock += timeout;
                None
            }
        }
    }

    fn render(&mut self, frame: &LineFrame) {
        self.frames.push(RecordedFrame {
            remaining: frame.remaining,
            score: frame.score,
            combo: frame.combo,
            cursor: frame.cursor(),
            pulse: frame.pulse,
        });
    }
}

impl Stage for ScriptedIo {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration.as_secs_f64());
        self.clock += duration.as_secs_f64();
    }

    fn show_upcoming(&mut self, next: Option<&str>) {
        self.upcoming.push(next.map(str::to_string));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Remembers the speed of every `start` call instead of playing anything.
#[derive(Debug, Default)]
pub struct RecordingSoundtrack {
    pub starts: Vec<f64>,
}

impl Soundtrack for RecordingSoundtrack {
    fn start(&mut self, speed: f64) {
        self.starts.push(speed);
    }
}
