use std::time::Duration;

/// Per-character classification against the target line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    Matched,
    Mismatched,
    Pending,
}

/// A typed character, already lower-cased, with how it compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Input {
    pub char: char,
    pub judgment: Judgment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEvent {
    Char(char),
    Backspace,
    /// Anything the session has no use for.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Completed,
    TimedOut,
}

/// What is left of one line once its session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineReport {
    pub outcome: LineOutcome,
    pub errors: usize,
    pub score: u64,
    pub typed: usize,
}

/// Snapshot handed to the renderer each iteration.
#[derive(Debug)]
pub struct LineFrame<'a> {
    pub target: &'a [char],
    pub input: &'a [Input],
    pub remaining: f64,
    pub budget: f64,
    pub score: u64,
    pub combo: u64,
    pub pulse: bool,
}

impl LineFrame<'_> {
    pub fn judgment(&self, idx: usize) -> Judgment {
        self.input
            .get(idx)
            .map_or(Judgment::Pending, |input| input.judgment)
    }

    pub fn cursor(&self) -> usize {
        self.input.len()
    }

    /// Fraction of the budget still available, clamped to `0.0..=1.0`.
    pub fn remaining_ratio(&self) -> f64 {
        if self.budget <= 0.0 {
            return 0.0;
        }
        (self.remaining / self.budget).clamp(0.0, 1.0)
    }
}

/// Input/render boundary a line session runs against.
pub trait LineIo {
    /// Wall-clock seconds from an arbitrary fixed origin.
    fn now(&self) -> f64;
    /// Wait at most `timeout` for the next event. `None` is the normal idle case.
    fn poll_event(&mut self, timeout: Duration) -> Option<LineEvent>;
    fn render(&mut self, frame: &LineFrame);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub input: Vec<Input>,
    pub errors: usize,
    pub combo: u64,
    pub score: u64,
}

/// One scored attempt at typing a line before its budget runs out.
#[derive(Debug)]
pub struct LineSession {
    target: Vec<char>,
    budget: f64,
    state: InputState,
}

impl LineSession {
    pub fn new(text: &str, budget: f64) -> Self {
        Self {
            target: text.chars().collect(),
            budget,
            state: InputState::default(),
        }
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn is_complete(&self) -> bool {
        self.state.input.len() >= self.target.len()
    }

    pub fn apply(&mut self, event: LineEvent) {
        match event {
            LineEvent::Char(c) => self.write(c),
            LineEvent::Backspace => self.backspace(),
            LineEvent::Ignored => {}
        }
    }

    pub fn write(&mut self, c: char) {
        if self.is_complete() {
            return;
        }

        let typed = fold_case(c);
        let expected = fold_case(self.target[self.state.input.len()]);
        let state = &mut self.state;

        let judgment = if typed == expected {
            state.combo += 1;
            state.score += 10 * state.combo;
            Judgment::Matched
        } else {
            state.errors += 1;
            state.combo = 0;
            Judgment::Mismatched
        };

        state.input.push(Input {
            char: typed,
            judgment,
        });
    }

    pub fn backspace(&mut self) {
        if self.state.input.pop().is_some() {
            self.state.combo = 0;
        }
    }

    pub fn frame(&self, remaining: f64, pulse: bool) -> LineFrame<'_> {
        LineFrame {
            target: &self.target,
            input: &self.state.input,
            remaining,
            budget: self.budget,
            score: self.state.score,
            combo: self.state.combo,
            pulse,
        }
    }

    /// Close the session. A timeout charges every untyped character as an error.
    pub fn finish(self, outcome: LineOutcome) -> LineReport {
        let typed = self.state.input.len();
        let errors = match outcome {
            LineOutcome::Completed => self.state.errors,
            LineOutcome::TimedOut => self.state.errors + self.target.len().saturating_sub(typed),
        };

        LineReport {
            outcome,
            errors,
            score: self.state.score,
            typed,
        }
    }

    /// Drive the session until the line is typed or the budget is spent.
    pub fn run<I: LineIo + ?Sized>(mut self, io: &mut I, poll_interval: Duration) -> LineReport {
        let started = io.now();

        loop {
            if self.is_complete() {
                return self.finish(LineOutcome::Completed);
            }

            let now = io.now();
            let remaining = self.budget - (now - started);
            let left = Duration::try_from_secs_f64(remaining.max(0.0)).unwrap_or(Duration::MAX);
            if left.is_zero() {
                return self.finish(LineOutcome::TimedOut);
            }

            io.render(&self.frame(remaining, pulse_phase(now)));

            if let Some(event) = io.poll_event(poll_interval.min(left)) {
                // a key landing after the deadline belongs to no line
                if io.now() - started < self.budget {
                    self.apply(event);
                }
            }
        }
    }
}

pub fn run_line<I: LineIo + ?Sized>(
    io: &mut I,
    text: &str,
    budget: f64,
    poll_interval: Duration,
) -> LineReport {
    LineSession::new(text, budget).run(io, poll_interval)
}

/// Cursor blink: flips four times a second.
pub fn pulse_phase(now: f64) -> bool {
    ((now * 4.0).max(0.0) as u64) % 2 == 1
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedIo;
    use assert_matches::assert_matches;

    const POLL: Duration = Duration::from_millis(10);

    fn judgments(session: &LineSession) -> Vec<Judgment> {
        session.state().input.iter().map(|i| i.judgment).collect()
    }

    #[test]
    fn test_write_correct_char() {
        let mut session = LineSession::new("test", 1.0);
        session.write('t');

        assert_eq!(session.state().input[0].judgment, Judgment::Matched);
        assert_eq!(session.state().combo, 1);
        assert_eq!(session.state().score, 10);
        assert_eq!(session.state().errors, 0);
    }

    #[test]
    fn test_write_incorrect_char() {
        let mut session = LineSession::new("test", 1.0);
        session.write('t');
        session.write('x');

        assert_eq!(judgments(&session), vec![Judgment::Matched, Judgment::Mismatched]);
        assert_eq!(session.state().combo, 0);
        assert_eq!(session.state().errors, 1);
        assert_eq!(session.state().score, 10);
    }

    #[test]
    fn test_input_is_lowercased() {
        let mut session = LineSession::new("Ab", 1.0);
        session.write('A');
        session.write('B');

        assert_eq!(session.state().input[0].char, 'a');
        assert_eq!(session.state().input[1].char, 'b');
        assert!(session.is_complete());
    }

    #[test]
    fn test_case_insensitive_judgments() {
        let target = "Hello World";
        let mut exact = LineSession::new(target, 1.0);
        let mut upper = LineSession::new(target, 1.0);

        for c in target.chars() {
            exact.write(c);
        }
        for c in target.to_uppercase().chars() {
            upper.write(c);
        }

        assert_eq!(judgments(&exact), judgments(&upper));
        assert!(judgments(&upper).iter().all(|j| *j == Judgment::Matched));
    }

    #[test]
    fn test_backspace_on_empty_is_noop() {
        let mut session = LineSession::new("abc", 1.0);
        let before = session.state().clone();

        session.backspace();
        session.backspace();
        session.apply(LineEvent::Backspace);

        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_backspace_pops_and_resets_combo() {
        let mut session = LineSession::new("abc", 1.0);
        session.write('a');
        session.write('b');
        assert_eq!(session.state().combo, 2);

        session.backspace();

        assert_eq!(session.state().input.len(), 1);
        assert_eq!(session.state().combo, 0);
        // score and errors are history, not undone
        assert_eq!(session.state().score, 30);
    }

    #[test]
    fn test_backspace_does_not_refund_errors() {
        let mut session = LineSession::new("abc", 1.0);
        session.write('x');
        session.backspace();
        session.write('a');

        assert_eq!(session.state().errors, 1);
        assert_eq!(judgments(&session), vec![Judgment::Matched]);
    }

    #[test]
    fn test_triangular_score_growth() {
        let target = "abcdefghij";
        let mut session = LineSession::new(target, 1.0);
        for (k, c) in target.chars().enumerate() {
            session.write(c);
            let k = (k + 1) as u64;
            assert_eq!(session.state().score, 10 * k * (k + 1) / 2);
            assert_eq!(session.state().combo, k);
        }
    }

    #[test]
    fn test_combo_restarts_after_mismatch() {
        let mut session = LineSession::new("abcd", 1.0);
        session.write('a');
        session.write('x');
        session.write('c');

        assert_eq!(session.state().combo, 1);
        assert_eq!(session.state().score, 20);
    }

    #[test]
    fn test_ignored_event_is_noop() {
        let mut session = LineSession::new("abc", 1.0);
        session.apply(LineEvent::Ignored);
        assert_eq!(session.state(), &InputState::default());
    }

    #[test]
    fn test_frame_classifies_characters() {
        let mut session = LineSession::new("abc", 2.0);
        session.write('a');
        session.write('x');

        let frame = session.frame(1.0, false);
        assert_eq!(frame.judgment(0), Judgment::Matched);
        assert_eq!(frame.judgment(1), Judgment::Mismatched);
        assert_eq!(frame.judgment(2), Judgment::Pending);
        assert_eq!(frame.cursor(), 2);
        assert_eq!(frame.remaining_ratio(), 0.5);
    }

    #[test]
    fn test_remaining_ratio_is_clamped() {
        let session = LineSession::new("abc", 2.0);
        assert_eq!(session.frame(5.0, false).remaining_ratio(), 1.0);
        assert_eq!(session.frame(-1.0, false).remaining_ratio(), 0.0);
        assert_eq!(LineSession::new("a", 0.0).frame(0.0, false).remaining_ratio(), 0.0);
    }

    #[test]
    fn test_finish_completed_counts_mismatches_only() {
        let mut session = LineSession::new("abc", 1.0);
        session.write('a');
        session.write('x');
        session.write('c');

        let report = session.finish(LineOutcome::Completed);
        assert_eq!(report.errors, 1);
        assert_eq!(report.typed, 3);
    }

    #[test]
    fn test_finish_timed_out_charges_remainder() {
        let mut session = LineSession::new("abcde", 1.0);
        session.write('a');
        session.write('x');

        let report = session.finish(LineOutcome::TimedOut);
        assert_eq!(report.errors, 1 + 3);
    }

    #[test]
    fn test_run_hello_scenario() {
        let mut io = ScriptedIo::new([
            (0.1, LineEvent::Char('h')),
            (0.5, LineEvent::Char('e')),
            (0.9, LineEvent::Char('l')),
            (1.3, LineEvent::Char('l')),
            (1.7, LineEvent::Char('x')),
        ]);

        let report = run_line(&mut io, "hello", 5.0, POLL);

        assert_matches!(report.outcome, LineOutcome::Completed);
        assert_eq!(report.errors, 1);
        assert_eq!(report.score, 100);
        assert_eq!(report.typed, 5);
        assert!(io.now() < 2.0);

        let last = io.frames().last().unwrap();
        assert_eq!(last.score, 100);
        assert_eq!(last.combo, 4);
    }

    #[test]
    fn test_run_times_out_without_input() {
        let mut io = ScriptedIo::new([]);

        let report = run_line(&mut io, "abc", 1.0, POLL);

        assert_matches!(report.outcome, LineOutcome::TimedOut);
        assert_eq!(report.errors, 3);
        assert_eq!(report.typed, 0);
        assert!(io.now() >= 1.0 - 1e-9 && io.now() < 1.02, "ended at {}", io.now());
    }

    #[test]
    fn test_run_poll_wait_never_passes_deadline() {
        let mut io = ScriptedIo::new([(1.15, LineEvent::Char('a'))]);

        let report = run_line(&mut io, "a", 1.0, Duration::from_millis(300));

        assert_matches!(report.outcome, LineOutcome::TimedOut);
        assert_eq!(report.errors, 1);
        assert_eq!(report.typed, 0);
        assert!(io.now() <= 1.0 + 1e-9, "ended at {}", io.now());
    }

    #[test]
    fn test_run_key_on_last_poll_before_deadline_counts() {
        let mut io = ScriptedIo::new([(0.95, LineEvent::Char('a'))]);

        let report = run_line(&mut io, "a", 1.0, Duration::from_millis(300));

        assert_matches!(report.outcome, LineOutcome::Completed);
        assert_eq!(report.errors, 0);
        assert_eq!(report.score, 10);
    }

    #[test]
    fn test_run_empty_line_completes_immediately() {
        let mut io = ScriptedIo::new([]);
        let report = run_line(&mut io, "", 1.0, POLL);

        assert_matches!(report.outcome, LineOutcome::Completed);
        assert_eq!(report.errors, 0);
        assert!(io.frames().is_empty());
    }

    #[test]
    fn test_run_zero_budget_times_out_immediately() {
        let mut io = ScriptedIo::new([(0.0, LineEvent::Char('a'))]);
        let report = run_line(&mut io, "ab", 0.0, POLL);

        assert_matches!(report.outcome, LineOutcome::TimedOut);
        assert_eq!(report.errors, 2);
    }

    #[test]
    fn test_run_renders_countdown() {
        let mut io = ScriptedIo::new([]);
        run_line(&mut io, "a", 0.05, POLL);

        let frames = io.frames();
        assert!(!frames.is_empty());
        assert!(frames.windows(2).all(|w| w[1].remaining < w[0].remaining));
        assert!(frames.iter().all(|f| f.remaining > 0.0 && f.remaining <= 0.05));
    }

    #[test]
    fn test_pulse_phase_alternates() {
        assert!(!pulse_phase(0.0));
        assert!(pulse_phase(0.25));
        assert!(!pulse_phase(0.5));
        assert!(pulse_phase(0.8));
    }
}
