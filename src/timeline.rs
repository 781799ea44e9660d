use std::fs;
use std::path::Path;

use crate::error::LoadError;

/// A single lyric line and the moment it should appear.
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    pub timestamp: f64,
    pub text: String,
}

impl Cue {
    pub fn new(timestamp: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            text: text.into(),
        }
    }
}

/// Ordered cues of one song, in source order.
pub type Timeline = Vec<Cue>;

/// Parse `[MM:SS.fff]text` lines. Anything without a marker is dropped.
pub fn parse(source: &str) -> Timeline {
    source
        .lines()
        .filter_map(|line| {
            let cue = parse_line(line.trim());
            if cue.is_none() && !line.trim().is_empty() {
                tracing::trace!(line, "skipping lyric line without a cue marker");
            }
            cue
        })
        .collect()
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Timeline, LoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    Ok(parse(&source))
}

fn parse_line(line: &str) -> Option<Cue> {
    let rest = line.strip_prefix('[')?;
    let (marker, text) = rest.split_once(']')?;
    let (minutes, seconds) = marker.split_once(':')?;

    if !is_digits(minutes) {
        return None;
    }
    let (whole, fraction) = seconds.split_once('.')?;
    if !is_digits(whole) || !is_digits(fraction) {
        return None;
    }

    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;

    Some(Cue {
        timestamp: minutes * 60.0 + seconds,
        text: normalize(text),
    })
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Strip ASCII punctuation and surrounding whitespace.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .trim()
        .to_string()
}
