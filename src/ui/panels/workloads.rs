use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState};

use crate::app::App;
use crate::ui::style::{COLOR_MUTED, COLOR_PASS, COLOR_SELECTED_BG, make_block};

pub fn draw_workloads(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let block = make_block(" Workloads ", focused);
    let running: Vec<&str> = app.containers.iter().map(|c| c.workload.as_str()).collect();

    let items: Vec<ListItem> = app
        .workloads()
        .into_iter()
        .map(|w| {
            let marker = if running.contains(&w.name) {
                Span::styled("● ", Style::default().fg(COLOR_PASS))
            } else {
                Span::raw("  ")
            };
            let source = if w.build.is_some() { "build" } else { "pull" };
            let ports: Vec<String> = w.run.ports.iter().map(|p| p.to_string()).collect();

            let title = Line::from(vec![
                marker,
                Span::styled(w.title, Style::default().add_modifier(Modifier::BOLD)),
            ]);
            let detail = Line::from(Span::styled(
                format!(
                    "    {} · {} · {}",
                    w.run.image,
                    source,
                    if ports.is_empty() {
                        "no ports".to_string()
                    } else {
                        ports.join(", ")
                    }
                ),
                Style::default().fg(COLOR_MUTED),
            ));
            ListItem::new(vec![title, detail])
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.workload_index));

    let highlight = if focused {
        Style::default().bg(COLOR_SELECTED_BG)
    } else {
        Style::default()
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    frame.render_stateful_widget(list, area, &mut state);
}
