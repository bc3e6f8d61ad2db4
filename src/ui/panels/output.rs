use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::App;
use crate::ui::style::{COLOR_MUTED, make_block};

pub fn draw_output(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let title = match &app.task {
        Some(task) => format!(" Output: {} ", task.label),
        None => " Output ".to_string(),
    };
    let block = make_block(&title, focused);

    let lines: Vec<Line> = if app.live_log.is_empty() {
        vec![Line::from(Span::styled(
            "Runtime output appears here",
            Style::default().fg(COLOR_MUTED),
        ))]
    } else {
        app.live_log.lines().map(Line::raw).collect()
    };

    // Follow the tail while an operation runs.
    let inner_height = area.height.saturating_sub(2);
    let scroll = if app.task.is_some() {
        tail_offset(lines.len(), inner_height)
    } else {
        app.output_scroll
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Scroll offset that shows the last `height` of `line_count` lines.
fn tail_offset(line_count: usize, height: u16) -> u16 {
    u16::try_from(line_count)
        .unwrap_or(u16::MAX)
        .saturating_sub(height)
}
