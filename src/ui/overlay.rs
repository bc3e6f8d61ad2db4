use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

const KEYMAP: &[(&str, &str)] = &[
    ("Enter", "Launch selected workload"),
    ("s / Del", "Stop selected container"),
    ("Esc", "Cancel running operation"),
    ("j k / ↓ ↑", "Move selection / scroll"),
    ("Tab / S-Tab", "Cycle panels"),
    ("1-3", "Jump to panel"),
    ("?", "Toggle this help"),
    ("q / Ctrl+C", "Quit"),
];

/// Draw the keybinding help centered on the screen.
pub fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let height = KEYMAP.len() as u16 + 4;
    let popup = centered_rect(48, height, area);
    frame.render_widget(Clear, popup);

    let mut lines: Vec<Line> = KEYMAP
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:<13}"),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(
        Line::from(Span::styled(
            "Press any key to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Keybindings ");
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// A `Rect` of at most `width`×`height`, centered within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}
