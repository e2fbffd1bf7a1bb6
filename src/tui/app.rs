use anyhow::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use gms::config::WINDOW_STEP;
use gms::export::export_json_file;
use gms::{Monitor, MonitorCommand, MonitorSnapshot};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Paragraph;
use scopeguard::defer;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::prefs::Language;
use crate::tui::strings::{tr, tr_fmt};
use crate::tui::theme::Theme;
use crate::tui::views::{HelpView, MainView};

/// UI state
#[derive(Default)]
pub struct UiState {
    pub language: Language,
    /// Show the quality explanation line
    pub show_reason: bool,
    /// Show keys guide overlay
    pub show_keys: bool,
    /// Full hop list instead of the trace summary
    pub trace_full: bool,
    pub trace_scroll: u16,
    /// Short-term diagnostics (`--admin`)
    pub admin: bool,
    /// Status message to display
    pub status_message: Option<(String, Instant)>,
    pub theme_index: usize,
}

impl UiState {
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    pub fn clear_old_status(&mut self) {
        if let Some((_, time)) = &self.status_message
            && time.elapsed() > Duration::from_secs(3)
        {
            self.status_message = None;
        }
    }

    fn status(&mut self, key: &str) {
        let text = tr(self.language, key).to_string();
        self.set_status(text);
    }

    fn scroll_by(&mut self, delta: i32, hop_count: usize) {
        let max = hop_count.saturating_sub(1).min(u16::MAX as usize) as i32;
        self.trace_scroll = (self.trace_scroll as i32 + delta).clamp(0, max) as u16;
    }
}

/// Settings the user may have changed in the UI, for persistence
pub struct UiOutcome {
    pub theme: String,
    pub language: Language,
    pub window_size: usize,
}

/// Run the TUI until the user quits or `cancel` fires
pub async fn run_tui(
    monitor: &Monitor,
    cancel: CancellationToken,
    initial_theme: Theme,
    language: Language,
    admin: bool,
) -> Result<UiOutcome> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    // Restore the terminal on any exit (success, error, or panic)
    defer! {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let theme_names = Theme::list();
    let initial_index = theme_names
        .iter()
        .position(|&name| name == initial_theme.name())
        .unwrap_or(0);

    let mut ui_state = UiState {
        language,
        admin,
        theme_index: initial_index,
        ..Default::default()
    };
    let tick_rate = Duration::from_millis(100);

    run_app(&mut terminal, monitor, &mut ui_state, cancel, tick_rate).await?;

    Ok(UiOutcome {
        theme: theme_names[ui_state.theme_index].to_string(),
        language: ui_state.language,
        window_size: monitor.snapshot().window_size,
    })
}

async fn run_app<B>(
    terminal: &mut Terminal<B>,
    monitor: &Monitor,
    ui_state: &mut UiState,
    cancel: CancellationToken,
    tick_rate: Duration,
) -> Result<()>
where
    B: ratatui::backend::Backend,
{
    let theme_names = Theme::list();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        ui_state.clear_old_status();
        let theme = Theme::by_name(theme_names[ui_state.theme_index]);
        let snapshot = monitor.snapshot();

        terminal.draw(|f| draw_ui(f, &snapshot, ui_state, &theme))?;

        // Yield so the probe and trace tasks keep running on this worker
        tokio::task::yield_now().await;

        if !event::poll(tick_rate)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if ui_state.show_keys {
            ui_state.show_keys = false;
            continue;
        }

        let lang = ui_state.language;
        match key.code {
            KeyCode::Char('q') => {
                cancel.cancel();
                break;
            }
            KeyCode::Char('p') => {
                monitor.apply(MonitorCommand::Pause);
                ui_state.status("MSG_PAUSED");
            }
            KeyCode::Char('r') => {
                monitor.apply(MonitorCommand::Resume);
                ui_state.status("MSG_RESUMED");
            }
            KeyCode::Char('t') => {
                if monitor.apply(MonitorCommand::StartTrace) {
                    ui_state.trace_scroll = 0;
                    ui_state.status("MSG_TRACE_STARTED");
                } else {
                    ui_state.status("MSG_TRACE_ALREADY_RUNNING");
                }
            }
            KeyCode::Char('s') => {
                if monitor.apply(MonitorCommand::StopTrace) {
                    ui_state.status("MSG_TRACE_STOPPED");
                } else {
                    ui_state.status("MSG_TRACE_NOT_RUNNING");
                }
            }
            KeyCode::Char('f') => {
                ui_state.trace_full = !ui_state.trace_full;
                ui_state.trace_scroll = 0;
            }
            KeyCode::Char('h') => {
                ui_state.show_reason = !ui_state.show_reason;
            }
            KeyCode::Char('k') | KeyCode::Char('?') => {
                ui_state.show_keys = true;
            }
            KeyCode::Char('l') => {
                ui_state.language = lang.next();
                ui_state.status("MSG_LANGUAGE");
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                monitor.apply(MonitorCommand::AdjustWindow(WINDOW_STEP));
                window_status(monitor, ui_state);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                monitor.apply(MonitorCommand::AdjustWindow(-WINDOW_STEP));
                window_status(monitor, ui_state);
            }
            KeyCode::Char('x') => {
                monitor.apply(MonitorCommand::ResetSession);
                ui_state.status("MSG_SESSION_RESET");
            }
            KeyCode::Char('e') => match export_json_file(&monitor.snapshot()) {
                Ok(filename) => {
                    ui_state.set_status(tr_fmt(lang, "MSG_EXPORTED", &[("file", filename)]));
                }
                Err(e) => {
                    warn!(error = %e, "export failed");
                    ui_state.set_status(tr_fmt(lang, "MSG_EXPORT_FAILED", &[("error", e.to_string())]));
                }
            },
            KeyCode::Char('c') => {
                ui_state.theme_index = (ui_state.theme_index + 1) % theme_names.len();
                let name = theme_names[ui_state.theme_index].to_string();
                ui_state.set_status(tr_fmt(lang, "MSG_THEME", &[("theme", name)]));
            }
            KeyCode::Up => ui_state.scroll_by(-1, snapshot.trace.hops.len()),
            KeyCode::Down => ui_state.scroll_by(1, snapshot.trace.hops.len()),
            KeyCode::PageUp => ui_state.scroll_by(-10, snapshot.trace.hops.len()),
            KeyCode::PageDown => ui_state.scroll_by(10, snapshot.trace.hops.len()),
            KeyCode::Esc => {
                ui_state.show_reason = false;
            }
            _ => {}
        }
    }

    Ok(())
}

fn window_status(monitor: &Monitor, ui_state: &mut UiState) {
    let checks = monitor.snapshot().window_size.to_string();
    let text = tr_fmt(ui_state.language, "MSG_WINDOW", &[("checks", checks)]);
    ui_state.set_status(text);
}

fn draw_ui(f: &mut ratatui::Frame, snapshot: &MonitorSnapshot, ui_state: &UiState, theme: &Theme) {
    let area = f.area();

    // Layout: main view + status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let main_view = MainView::new(snapshot, theme, ui_state.language)
        .with_reason(ui_state.show_reason)
        .with_admin(ui_state.admin)
        .with_trace(ui_state.trace_full, ui_state.trace_scroll);
    f.render_widget(main_view, chunks[0]);

    let status_text = if let Some((ref msg, _)) = ui_state.status_message {
        msg.clone()
    } else {
        "q quit | p pause | r resume | t trace | s stop | f full | +/- window | k keys".to_string()
    };
    let status_bar = Paragraph::new(status_text).style(Style::default().fg(theme.text_dim));
    f.render_widget(status_bar, chunks[1]);

    if ui_state.show_keys {
        f.render_widget(HelpView::new(theme, ui_state.language), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_is_clamped_to_hops() {
        let mut ui = UiState::default();
        ui.scroll_by(-5, 10);
        assert_eq!(ui.trace_scroll, 0);
        ui.scroll_by(25, 10);
        assert_eq!(ui.trace_scroll, 9);
        ui.scroll_by(3, 0);
        assert_eq!(ui.trace_scroll, 0);
    }

    #[test]
    fn test_status_uses_current_language() {
        let mut ui = UiState {
            language: Language::Id,
            ..Default::default()
        };
        ui.status("MSG_PAUSED");
        assert_eq!(ui.status_message.unwrap().0, "Pemantauan dijeda");
    }
}
