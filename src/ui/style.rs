use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

use crate::app::Status;

// ── Colour constants ──────────────────────────────────────────────────
pub const COLOR_PASS: Color = Color::Green;
pub const COLOR_FAIL: Color = Color::Red;
pub const COLOR_RUNNING: Color = Color::Yellow;
pub const COLOR_MUTED: Color = Color::DarkGray;
pub const COLOR_SELECTED_BG: Color = Color::DarkGray;

// ── Icon constants ────────────────────────────────────────────────────
pub const ICON_PASS: &str = "✓";
pub const ICON_FAIL: &str = "✗";
pub const ICON_RUNNING: &str = "◉";
pub const ICON_IDLE: &str = "─";

// ── Helpers ───────────────────────────────────────────────────────────

pub fn status_color(status: &Status) -> Color {
    match status {
        Status::Idle(_) => COLOR_MUTED,
        Status::Busy(_) => COLOR_RUNNING,
        Status::Success(_) => COLOR_PASS,
        Status::Failure { .. } => COLOR_FAIL,
    }
}

pub fn status_icon(status: &Status) -> &'static str {
    match status {
        Status::Idle(_) => ICON_IDLE,
        Status::Busy(_) => ICON_RUNNING,
        Status::Success(_) => ICON_PASS,
        Status::Failure { .. } => ICON_FAIL,
    }
}

pub fn make_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style)
}
