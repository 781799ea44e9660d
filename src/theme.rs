use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Styles for every element of the typing screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub correct: Style,
    pub incorrect: Style,
    pub pending: Style,
    pub highlight: Style,
    pub combo: Style,
    pub score: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from(&ThemeConfig::default())
    }
}

/// Colour names as they appear in the config file, e.g. `"green"` or `"#ff8800"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    pub correct: String,
    pub incorrect: String,
    pub pending: String,
    pub highlight: String,
    pub combo: String,
    pub score: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            correct: "green".to_string(),
            incorrect: "red".to_string(),
            pending: "white".to_string(),
            highlight: "yellow".to_string(),
            combo: "cyan".to_string(),
            score: "magenta".to_string(),
        }
    }
}

impl From<&ThemeConfig> for Theme {
    fn from(cfg: &ThemeConfig) -> Self {
        let defaults = ThemeConfig::default();
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let fg = |name: &str, fallback: &str| {
            Color::from_str(name)
                .or_else(|_| Color::from_str(fallback))
                .unwrap_or(Color::Reset)
        };

        Self {
            correct: bold.fg(fg(&cfg.correct, &defaults.correct)),
            incorrect: bold.fg(fg(&cfg.incorrect, &defaults.incorrect)),
            pending: Style::default()
                .fg(fg(&cfg.pending, &defaults.pending))
                .add_modifier(Modifier::DIM),
            highlight: bold.fg(fg(&cfg.highlight, &defaults.highlight)),
            combo: bold.fg(fg(&cfg.combo, &defaults.combo)),
            score: bold.fg(fg(&cfg.score, &defaults.score)),
        }
    }
}
