use std::time::SystemTime;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};

use crate::app::App;
use crate::ui::style::{COLOR_MUTED, COLOR_SELECTED_BG, make_block};

pub fn draw_containers(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let block = make_block(" Running containers ", focused);

    if app.containers.is_empty() {
        let item = ListItem::new(Line::from(Span::styled(
            "Nothing launched yet",
            Style::default().fg(COLOR_MUTED),
        )));
        frame.render_widget(List::new(vec![item]).block(block), area);
        return;
    }

    let now = SystemTime::now();
    let items: Vec<ListItem> = app
        .containers
        .iter()
        .map(|c| {
            let ports: Vec<String> = c.ports.iter().map(|p| p.to_string()).collect();
            let age = now
                .duration_since(c.started_at)
                .map(|d| format_age(d.as_secs()))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12} ", c.short_id()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<10} ", c.workload),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:<18} ", ports.join(","))),
                Span::styled(age, Style::default().fg(COLOR_MUTED)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.container_index));
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(COLOR_SELECTED_BG));
    frame.render_stateful_widget(list, area, &mut state);
}

fn format_age(secs: u64) -> String {
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        _ => format!("{}h{}m", secs / 3600, (secs % 3600) / 60),
    }
}
