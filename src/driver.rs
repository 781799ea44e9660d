use std::time::Duration;

use crate::session::{LineIo, LineOutcome, LineReport, LineSession};
use crate::timeline::Cue;

/// Typing window for the last line, which has no following cue to measure against.
pub const LAST_LINE_WINDOW_SECS: f64 = 5.0;

/// Everything the driver needs beyond a single line's input/render loop.
pub trait Stage: LineIo {
    /// Block the foreground until `duration` has passed.
    fn sleep(&mut self, duration: Duration);
    /// Preview of the line after the one about to be typed.
    fn show_upcoming(&mut self, next: Option<&str>);
    /// Drop per-line display state.
    fn clear(&mut self);
}

/// Background music for a playthrough. Started once; never waited on.
pub trait Soundtrack {
    fn start(&mut self, speed: f64);
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineBudget {
    pub text: String,
    pub duration: f64,
}

/// Time allowed for each cue: the gap to the next cue, or the fixed window for
/// the last one, scaled by `1 / speed`.
pub fn line_budgets(timeline: &[Cue], speed: f64) -> Vec<LineBudget> {
    timeline
        .iter()
        .enumerate()
        .map(|(i, cue)| {
            let next_timestamp = timeline
                .get(i + 1)
                .map_or(cue.timestamp + LAST_LINE_WINDOW_SECS, |next| next.timestamp);

            LineBudget {
                text: cue.text.clone(),
                duration: (next_timestamp - cue.timestamp) / speed,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaythroughReport {
    pub errors: usize,
    pub score: u64,
    pub lines: usize,
    pub timed_out: usize,
}

impl PlaythroughReport {
    fn record(&mut self, line: &LineReport) {
        self.errors += line.errors;
        self.score += line.score;
        self.lines += 1;
        if line.outcome == LineOutcome::TimedOut {
            self.timed_out += 1;
        }
    }
}

/// One full run through a song's lyrics.
#[derive(Debug)]
pub struct Playthrough {
    timeline: Vec<Cue>,
    speed: f64,
    poll_interval: Duration,
}

impl Playthrough {
    /// A speed that is not a positive finite number plays at normal speed.
    pub fn new(timeline: Vec<Cue>, speed: f64, poll_interval: Duration) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            tracing::warn!(speed, "unusable playback speed, using 1.0");
            1.0
        };
        Self {
            timeline,
            speed,
            poll_interval,
        }
    }

    pub fn timeline(&self) -> &[Cue] {
        &self.timeline
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Lines run strictly one after another; each waits for its cue first.
    pub fn run<S, A>(&self, stage: &mut S, soundtrack: &mut A) -> PlaythroughReport
    where
        S: Stage + ?Sized,
        A: Soundtrack + ?Sized,
    {
        tracing::info!(
            lines = self.timeline.len(),
            speed = self.speed,
            "starting playthrough"
        );

        soundtrack.start(self.speed);
        let started = stage.now();
        let mut report = PlaythroughReport::default();

        for (i, (cue, budget)) in self
            .timeline
            .iter()
            .zip(line_budgets(&self.timeline, self.speed))
            .enumerate()
        {
            let due = cue.timestamp / self.speed;
            let wait = due - (stage.now() - started);
            if wait > 0.0 {
                match Duration::try_from_secs_f64(wait) {
                    Ok(wait) => stage.sleep(wait),
                    Err(e) => {
                        tracing::warn!(line = i, due, error = %e, "cue time out of range, not waiting")
                    }
                }
            }

            stage.show_upcoming(self.timeline.get(i + 1).map(|next| next.text.as_str()));

            let line = LineSession::new(&budget.text, budget.duration).run(stage, self.poll_interval);
            tracing::debug!(
                line = i,
                budget = budget.duration,
                outcome = ?line.outcome,
                errors = line.errors,
                score = line.score,
                "line finished"
            );
            report.record(&line);

            stage.clear();
        }

        tracing::info!(
            errors = report.errors,
            score = report.score,
            timed_out = report.timed_out,
            "playthrough finished"
        );
        report
    }
}
