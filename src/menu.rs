use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::config::SpeedMode;
use crate::level::Level;
use crate::runtime::is_quit;
use crate::ui::MenuEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub selected: usize,
    pub mode: SpeedMode,
}

impl MenuState {
    pub fn new(mode: SpeedMode) -> Self {
        Self { selected: 0, mode }
    }

    pub fn on_key(&mut self, key: &KeyEvent, level_count: usize) -> Option<MenuAction> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if is_quit(key) {
            return Some(MenuAction::Quit);
        }

        match key.code {
            KeyCode::Enter if level_count > 0 => return Some(MenuAction::Start),
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down if self.selected + 1 < level_count => self.selected += 1,
            KeyCode::Char('e') => self.mode = self.mode.next(),
            _ => {}
        }
        None
    }
}

/// Menu rows with freshly computed difficulty.
pub fn entries(levels: &[Level]) -> Vec<MenuEntry> {
    levels
        .iter()
        .map(|level| MenuEntry {
            name: level.name.clone(),
            difficulty: level.difficulty().ok(),
        })
        .collect()
}
