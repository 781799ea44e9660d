use crate::timeline::Cue;

/// Rough measure of how hard a level is to keep up with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Difficulty {
    /// Sum of characters-per-second over every gap between cues.
    pub speed: u64,
    /// Sum of all cue timestamps in seconds.
    pub total_duration: u64,
}

pub fn estimate(timeline: &[Cue]) -> Difficulty {
    let total_time: f64 = timeline.iter().map(|cue| cue.timestamp).sum();

    let mut speed = 0.0;
    let mut previous_time = 0.0;
    for cue in timeline {
        let delay = cue.timestamp - previous_time;
        if delay > 0.0 {
            speed += cue.text.chars().count() as f64 / delay;
        }
        previous_time = cue.timestamp;
    }

    Difficulty {
        speed: speed as u64,
        total_duration: total_time as u64,
    }
}
