use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, Panel, Status};
use crate::ui::overlay::draw_help_overlay;
use crate::ui::panels::{draw_containers, draw_output, draw_workloads};
use crate::ui::style::{COLOR_MUTED, status_color, status_icon};

pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    // Main area | status line
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(size);

    // Left: workloads | right: containers over output
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(horizontal[1]);

    draw_workloads(frame, app, horizontal[0], app.focused_panel == Panel::Workloads);
    draw_containers(frame, app, right[0], app.focused_panel == Panel::Containers);
    draw_output(frame, app, right[1], app.focused_panel == Panel::Output);
    draw_status(frame, app, rows[1]);

    if app.show_help {
        draw_help_overlay(frame, size);
    }
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let text = match &app.status {
        Status::Idle(s) | Status::Busy(s) | Status::Success(s) => s.clone(),
        Status::Failure { kind, message } => format!("[{kind}] {message}"),
    };
    let color = status_color(&app.status);

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", status_icon(&app.status)),
            Style::default().fg(color),
        ),
        Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled("   ? help · q quit", Style::default().fg(COLOR_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
