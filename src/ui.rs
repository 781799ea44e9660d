use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    config::SpeedMode,
    difficulty::Difficulty,
    driver::PlaythroughReport,
    session::{Judgment, LineFrame},
    theme::Theme,
};

pub const GAME_NAME: &str = "lyrik";

const HORIZONTAL_MARGIN: u16 = 5;
const TIME_BAR_PADDING: u16 = 20;

/// Typing screen for the current lyric line.
pub struct LineView<'a> {
    pub frame: &'a LineFrame<'a>,
    pub upcoming: Option<&'a str>,
    pub theme: &'a Theme,
}

/// One row of the level menu. Difficulty is absent when the lyrics could not be read.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuEntry {
    pub name: String,
    pub difficulty: Option<Difficulty>,
}

pub struct MenuView<'a> {
    pub entries: &'a [MenuEntry],
    pub selected: usize,
    pub mode: SpeedMode,
    pub theme: &'a Theme,
}

pub struct GameOverView<'a> {
    pub report: &'a PlaythroughReport,
    pub theme: &'a Theme,
}

/// Single-line rect `offset` rows from the vertical middle, if it fits.
fn middle_row(area: Rect, offset: i32) -> Option<Rect> {
    let y = area.y as i32 + area.height as i32 / 2 + offset;
    if y < area.y as i32 || y >= area.bottom() as i32 {
        return None;
    }
    Some(Rect::new(area.x, y as u16, area.width, 1))
}

fn centered(text: impl Into<Line<'static>>, area: Rect, buf: &mut Buffer) {
    let line: Line = text.into();
    Paragraph::new(line).alignment(Alignment::Center).render(area, buf);
}

/// Filled and empty cell counts of the countdown bar.
pub fn time_bar(ratio: f64, bar_length: u16) -> (usize, usize) {
    let bar_length = bar_length as usize;
    let filled = ((ratio.clamp(0.0, 1.0) * bar_length as f64) as usize).min(bar_length);
    (filled, bar_length - filled)
}

/// The bar shifts from calm to urgent as time runs out.
pub fn time_bar_style(ratio: f64, theme: &Theme) -> Style {
    if ratio > 0.5 {
        theme.correct
    } else if ratio > 0.25 {
        theme.highlight
    } else {
        theme.incorrect
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if out.width() > max_width {
            out.pop();
            break;
        }
    }
    out
}

impl LineView<'_> {
    fn target_spans(&self) -> Vec<Span<'static>> {
        let frame = self.frame;
        let theme = self.theme;

        frame
            .target
            .iter()
            .enumerate()
            .map(|(idx, &expected)| {
                if idx == frame.cursor() {
                    let pulse = if frame.pulse {
                        Modifier::REVERSED
                    } else {
                        Modifier::BOLD
                    };
                    return Span::styled(expected.to_string(), theme.combo.add_modifier(pulse));
                }

                match frame.judgment(idx) {
                    Judgment::Matched => Span::styled(expected.to_string(), theme.correct),
                    Judgment::Mismatched => Span::styled(
                        match expected {
                            ' ' => "·".to_owned(),
                            c => c.to_string(),
                        },
                        theme.incorrect,
                    ),
                    Judgment::Pending => Span::styled(expected.to_string(), theme.pending),
                }
            })
            .collect()
    }
}

impl Widget for &LineView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame;
        let theme = self.theme;

        if frame.combo > 1 {
            if let Some(row) = middle_row(area, -3) {
                centered(Span::styled(format!("Combo: x{}", frame.combo), theme.combo), row, buf);
            }
        }

        if let Some(row) = middle_row(area, -2) {
            centered(Span::styled(format!("Score: {}", frame.score), theme.score), row, buf);
        }

        if let Some(row) = middle_row(area, 0) {
            centered(Line::from(self.target_spans()), row, buf);
        }

        if let Some(row) = middle_row(area, 2) {
            let ratio = frame.remaining_ratio();
            let (filled, empty) = time_bar(ratio, area.width.saturating_sub(TIME_BAR_PADDING));
            let bar = Line::from(vec![
                Span::styled("Time: [", theme.pending),
                Span::styled(
                    format!("{}{}", "█".repeat(filled), "░".repeat(empty)),
                    time_bar_style(ratio, theme),
                ),
                Span::styled("]", theme.pending),
            ]);
            let inner = Rect {
                x: row.x + HORIZONTAL_MARGIN.min(row.width),
                width: row.width.saturating_sub(HORIZONTAL_MARGIN),
                ..row
            };
            Paragraph::new(bar).render(inner, buf);
        }

        if let Some(next) = self.upcoming {
            if let Some(row) = middle_row(area, 6) {
                let max_width = (area.width as usize).saturating_sub(6);
                centered(
                    Span::styled(format!("Next: {}", truncate(next, max_width)), theme.highlight),
                    row,
                    buf,
                );
            }
        }
    }
}

impl MenuEntry {
    pub fn label(&self, idx: usize) -> String {
        match self.difficulty {
            Some(d) => format!(
                "{}: {}    [Difficulty: {} | Duration: {}s]",
                idx + 1,
                self.name,
                d.speed,
                d.total_duration
            ),
            None => format!("{}: {}    [unreadable lyrics]", idx + 1, self.name),
        }
    }
}

impl Widget for &MenuView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.theme;
        if area.height == 0 {
            return;
        }

        centered(
            Span::styled(GAME_NAME.to_string(), theme.combo),
            Rect::new(area.x, area.y, area.width, 1),
            buf,
        );

        let footer_rows = 2;
        let list_top = area.y + 2;
        let list_bottom = area.bottom().saturating_sub(footer_rows);

        if self.entries.is_empty() {
            if list_top < list_bottom {
                centered(
                    Span::styled("No levels found".to_string(), theme.incorrect),
                    Rect::new(area.x, list_top, area.width, 1),
                    buf,
                );
            }
        } else {
            let visible = list_bottom.saturating_sub(list_top) as usize;
            // keep the selection on screen
            let first = self.selected.saturating_sub(visible.saturating_sub(1));

            for (row, (idx, entry)) in self
                .entries
                .iter()
                .enumerate()
                .skip(first)
                .take(visible)
                .enumerate()
            {
                let style = if idx == self.selected {
                    theme.correct.add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                let rect = Rect::new(
                    area.x + 2.min(area.width),
                    list_top + row as u16,
                    area.width.saturating_sub(2),
                    1,
                );
                Paragraph::new(Span::styled(entry.label(idx), style)).render(rect, buf);
            }
        }

        if area.height >= 4 {
            centered(
                Span::styled(
                    "Arrows: Navigate | 'e': Change Mode | Enter: Start | Esc: Quit".to_string(),
                    theme.combo,
                ),
                Rect::new(area.x, area.bottom() - 2, area.width, 1),
                buf,
            );
            centered(
                Span::styled(format!("Mode: {}", self.mode), theme.highlight),
                Rect::new(area.x, area.bottom() - 1, area.width, 1),
                buf,
            );
        }
    }
}

impl Widget for &GameOverView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(row) = middle_row(area, -1) {
            centered(
                Span::styled(format!("Game Over! Errors: {}", self.report.errors), self.theme.incorrect),
                row,
                buf,
            );
        }
        if let Some(row) = middle_row(area, 1) {
            centered(
                Span::styled(format!("Score: {}", self.report.score), self.theme.score),
                row,
                buf,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LineSession;

    fn rows(buffer: &Buffer) -> Vec<String> {
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect()
    }

    fn render_line(session: &LineSession, remaining: f64, upcoming: Option<&str>, area: Rect) -> Buffer {
        let theme = Theme::default();
        let frame = session.frame(remaining, false);
        let view = LineView {
            frame: &frame,
            upcoming,
            theme: &theme,
        };
        let mut buffer = Buffer::empty(area);
        (&view).render(area, &mut buffer);
        buffer
    }

    #[test]
    fn test_time_bar_proportions() {
        assert_eq!(time_bar(1.0, 10), (10, 0));
        assert_eq!(time_bar(0.5, 10), (5, 5));
        assert_eq!(time_bar(0.0, 10), (0, 10));
        assert_eq!(time_bar(-1.0, 10), (0, 10));
        assert_eq!(time_bar(2.0, 10), (10, 0));
        assert_eq!(time_bar(0.5, 0), (0, 0));
    }

    #[test]
    fn test_time_bar_style_thresholds() {
        let theme = Theme::default();
        assert_eq!(time_bar_style(0.9, &theme), theme.correct);
        assert_eq!(time_bar_style(0.4, &theme), theme.highlight);
        assert_eq!(time_bar_style(0.1, &theme), theme.incorrect);
    }

    #[test]
    fn test_truncate_respects_width() {
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hi", 10), "hi");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn test_line_view_shows_target_and_score() {
        let mut session = LineSession::new("hello world", 4.0);
        session.write('h');
        let area = Rect::new(0, 0, 80, 24);
        let buffer = render_line(&session, 2.0, Some("next one"), area);
        let rows = rows(&buffer);

        assert!(rows[12].contains("hello world"));
        assert!(rows[10].contains("Score: 10"));
        assert!(rows[14].contains("Time: ["));
        assert!(rows[18].contains("Next: next one"));
        // combo of one is not worth showing
        assert!(!rows.iter().any(|r| r.contains("Combo")));
    }

    #[test]
    fn test_line_view_time_bar_half_full() {
        let session = LineSession::new("abc", 4.0);
        let area = Rect::new(0, 0, 40, 10);
        let buffer = render_line(&session, 2.0, None, area);
        let bar_row = &rows(&buffer)[7];

        assert_eq!(bar_row.matches('█').count(), 10);
        assert_eq!(bar_row.matches('░').count(), 10);
    }

    #[test]
    fn test_line_view_shows_combo() {
        let mut session = LineSession::new("abc", 4.0);
        session.write('a');
        session.write('b');
        let area = Rect::new(0, 0, 40, 10);
        let buffer = render_line(&session, 2.0, None, area);

        assert!(rows(&buffer)[2].contains("Combo: x2"));
    }

    #[test]
    fn test_line_view_styles_judgments() {
        let mut session = LineSession::new("abc", 4.0);
        session.write('a');
        session.write('x');
        let area = Rect::new(0, 0, 3, 3);
        let buffer = render_line(&session, 2.0, None, area);
        let theme = Theme::default();

        let line: Vec<_> = (0..3).map(|x| buffer.cell((x, 1)).unwrap().clone()).collect();
        assert_eq!(line[0].fg, theme.correct.fg.unwrap());
        assert_eq!(line[1].fg, theme.incorrect.fg.unwrap());
        assert_eq!(line[2].fg, theme.combo.fg.unwrap());
    }

    #[test]
    fn test_line_view_marks_missed_spaces() {
        let mut session = LineSession::new("a b", 4.0);
        session.write('a');
        session.write('x');
        let area = Rect::new(0, 0, 20, 5);
        let buffer = render_line(&session, 2.0, None, area);

        assert!(rows(&buffer)[2].contains("a·b"));
    }

    #[test]
    fn test_line_view_tiny_area_does_not_panic() {
        let session = LineSession::new("some lyric line", 1.0);
        for (w, h) in [(1, 1), (5, 2), (0, 0), (200, 3)] {
            render_line(&session, 0.5, Some("upcoming"), Rect::new(0, 0, w, h));
        }
    }

    #[test]
    fn test_menu_lists_levels() {
        let theme = Theme::default();
        let entries = vec![
            MenuEntry {
                name: "first".into(),
                difficulty: Some(Difficulty {
                    speed: 12,
                    total_duration: 340,
                }),
            },
            MenuEntry {
                name: "second".into(),
                difficulty: None,
            },
        ];
        let view = MenuView {
            entries: &entries,
            selected: 1,
            mode: SpeedMode::Nightcore,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 80, 12);
        let mut buffer = Buffer::empty(area);
        (&view).render(area, &mut buffer);
        let rows = rows(&buffer);

        assert!(rows[0].contains(GAME_NAME));
        assert!(rows[2].contains("1: first"));
        assert!(rows[2].contains("[Difficulty: 12 | Duration: 340s]"));
        assert!(rows[3].contains("2: second"));
        assert!(rows[11].contains("Mode: Nightcore"));
    }

    #[test]
    fn test_menu_scrolls_to_selection() {
        let theme = Theme::default();
        let entries: Vec<MenuEntry> = (0..20)
            .map(|i| MenuEntry {
                name: format!("level{i}"),
                difficulty: None,
            })
            .collect();
        let view = MenuView {
            entries: &entries,
            selected: 19,
            mode: SpeedMode::Normal,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 60, 10);
        let mut buffer = Buffer::empty(area);
        (&view).render(area, &mut buffer);

        assert!(rows(&buffer).iter().any(|r| r.contains("20: level19")));
    }

    #[test]
    fn test_menu_without_levels() {
        let theme = Theme::default();
        let view = MenuView {
            entries: &[],
            selected: 0,
            mode: SpeedMode::Normal,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 60, 10);
        let mut buffer = Buffer::empty(area);
        (&view).render(area, &mut buffer);

        assert!(rows(&buffer)[2].contains("No levels found"));
    }

    #[test]
    fn test_game_over_shows_totals() {
        let theme = Theme::default();
        let report = PlaythroughReport {
            errors: 7,
            score: 1230,
            lines: 4,
            timed_out: 1,
        };
        let view = GameOverView {
            report: &report,
            theme: &theme,
        };
        let area = Rect::new(0, 0, 40, 10);
        let mut buffer = Buffer::empty(area);
        (&view).render(area, &mut buffer);
        let rows = rows(&buffer);

        assert!(rows[4].contains("Game Over! Errors: 7"));
        assert!(rows[6].contains("Score: 1230"));
    }
}
