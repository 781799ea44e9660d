use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::{Duration, Instant};

use ratatui::{backend::Backend, Terminal};

use crate::driver::Stage;
use crate::runtime::{line_event, EventSource, GameEvent};
use crate::session::{LineEvent, LineFrame, LineIo};
use crate::theme::Theme;
use crate::ui::LineView;

/// Plays lines on a real (or test) terminal.
pub struct TerminalIo<'a, B: Backend, E: EventSource> {
    terminal: &'a mut Terminal<B>,
    events: &'a E,
    theme: Theme,
    origin: Instant,
    upcoming: Option<String>,
}

impl<'a, B: Backend, E: EventSource> TerminalIo<'a, B, E> {
    pub fn new(terminal: &'a mut Terminal<B>, events: &'a E, theme: Theme) -> Self {
        Self {
            terminal,
            events,
            theme,
            origin: Instant::now(),
            upcoming: None,
        }
    }
}

impl<B: Backend, E: EventSource> LineIo for TerminalIo<'_, B, E> {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn poll_event(&mut self, timeout: Duration) -> Option<LineEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(GameEvent::Key(key)) => Some(line_event(&key)),
            // redrawn on the next iteration anyway
            Ok(GameEvent::Resize) => None,
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                None
            }
        }
    }

    fn render(&mut self, frame: &LineFrame) {
        let view = LineView {
            frame,
            upcoming: self.upcoming.as_deref(),
            theme: &self.theme,
        };
        if let Err(e) = self.terminal.draw(|f| f.render_widget(&view, f.area())) {
            tracing::warn!(error = %e, "failed to draw line");
        }
    }
}

impl<B: Backend, E: EventSource> Stage for TerminalIo<'_, B, E> {
    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    fn show_upcoming(&mut self, next: Option<&str>) {
        self.upcoming = next.map(str::to_string);
    }

    fn clear(&mut self) {
        self.upcoming = None;
        if let Err(e) = self.terminal.clear() {
            tracing::warn!(error = %e, "failed to clear terminal");
        }
    }
}
