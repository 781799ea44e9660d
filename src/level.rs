use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::difficulty::{self, Difficulty};
use crate::error::LoadError;
use crate::timeline::{self, Timeline};

pub const LYRICS_EXTENSION: &str = "lrc";
pub const AUDIO_EXTENSION: &str = "mp3";

/// A playable song: a lyric file with an audio file of the same name next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub name: String,
    pub lyrics: PathBuf,
    pub audio: PathBuf,
}

impl Level {
    pub fn in_dir<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            name: name.to_string(),
            lyrics: dir.join(format!("{name}.{LYRICS_EXTENSION}")),
            audio: dir.join(format!("{name}.{AUDIO_EXTENSION}")),
        }
    }

    pub fn timeline(&self) -> Result<Timeline, LoadError> {
        timeline::load(&self.lyrics)
    }

    /// Recomputed on every call.
    pub fn difficulty(&self) -> Result<Difficulty, LoadError> {
        Ok(difficulty::estimate(&self.timeline()?))
    }
}

/// Levels under `dir` that have both halves, sorted by name.
pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<Level>, LoadError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;

    let levels = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == LYRICS_EXTENSION))
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            let level = Level::in_dir(dir, &name);
            if level.audio.is_file() {
                Some(level)
            } else {
                tracing::debug!(name = %name, "skipping lyrics without matching audio");
                None
            }
        })
        .sorted_by(|a, b| a.name.cmp(&b.name))
        .collect();

    Ok(levels)
}
