mod app;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};

use app::{App, Panel, Status};
use dockmenu::{CliRuntime, Orchestrator, config, logging};

fn main() -> Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let cfg = config::load(&cwd)?;
    logging::init(&cfg, &cwd)?;

    let runtime = CliRuntime::parse(&cfg.runtime)?;
    let probe = runtime.ensure_available();
    let orchestrator = Arc::new(Orchestrator::from_config(&cfg, &cwd, Arc::new(runtime)));
    info!(runtime = %cfg.runtime, context_root = %cfg.context_root(&cwd).display(), "dockmenu starting");

    let mut app = App::new(orchestrator);
    if let Err(e) = probe {
        warn!(error = %format!("{e:#}"), "container runtime unavailable");
        app.status = Status::Idle(format!("warning: {e:#}"));
    }

    // Ensure terminal is restored on panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, &mut app);
    restore_terminal()?;

    let left = app.orchestrator.list();
    if !left.is_empty() {
        println!("{} container(s) left running:", left.len());
        for c in left {
            println!("  {}  {}", c.short_id(), c.workload);
        }
    }
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, &*app))?;

        // Short poll while an operation runs so its output shows promptly.
        let poll_timeout = if app.busy() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(200)
        };
        if event::poll(poll_timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(app, key);
            app.clamp_indices();
        }

        app.drain_events();
    }

    if let Some(task) = &app.task {
        task.cancel.cancel();
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Global keys.
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
            app.running = false;
            return;
        }
        (KeyCode::Char('?'), _) => {
            app.show_help = true;
            return;
        }
        (KeyCode::Esc, _) if app.busy() => {
            app.cancel_task();
            return;
        }
        _ => {}
    }

    // Panel switching.
    match key.code {
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
            app.focused_panel = app.focused_panel.next();
            return;
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            app.focused_panel = app.focused_panel.prev();
            return;
        }
        KeyCode::Char(c @ '1'..='3') => {
            if let Some(panel) = Panel::from_index((c as usize) - ('1' as usize)) {
                app.focused_panel = panel;
            }
            return;
        }
        _ => {}
    }

    // Panel-specific keys.
    match app.focused_panel {
        Panel::Workloads => match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                app.workload_index = app.workload_index.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.workload_index = app.workload_index.saturating_sub(1)
            }
            KeyCode::Enter => app.start_launch(),
            _ => {}
        },
        Panel::Containers => match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                app.container_index = app.container_index.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.container_index = app.container_index.saturating_sub(1)
            }
            KeyCode::Char('s') | KeyCode::Delete => app.start_stop(),
            _ => {}
        },
        Panel::Output => match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                app.output_scroll = app.output_scroll.saturating_add(1)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.output_scroll = app.output_scroll.saturating_sub(1)
            }
            _ => {}
        },
    }
}
