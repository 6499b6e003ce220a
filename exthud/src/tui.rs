//! # Terminal User Interface (TUI)
//!
//! Live terminal list of activated extensions using `ratatui`.
//!
//! ## View Modes
//!
//! - **List** - Runtime extensions list (default)
//! - **Details** - Frozen view of the selected extension
//! - **Help** - Keys and how to read the list
//!
//! ## Loop
//!
//! [`run_live`] owns the model for as long as the terminal is up. Every turn
//! it drains host events, pumps the model (profiling completions, due
//! refreshes) and picks up newly published lists; it redraws at 10 Hz.
//!
//! ## Sub-Modules
//!
//! - `extensions` - Record list and selection
//! - `theme` - Color scheme

// TUI rendering uses long functions for clarity
#![allow(clippy::too_many_lines, clippy::cast_precision_loss)]

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use exthud_common::Severity;
use log::warn;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};
use std::io::{self, Stdout};
use std::path::Path;
use std::time::{Duration, Instant};

pub mod extensions; // Public for testing
mod theme;

use extensions::ExtensionListView;
use theme::{severity_color, BACKGROUND, CAUTION_AMBER, CRITICAL_RED, HUD_GREEN, INFO_DIM};

use crate::analysis::RuntimeExtensionRecord;
use crate::describe::{activation_summary, profile_summary, trigger_description};
use crate::domain::{ExportError, Micros, Millis, TuiError};
use crate::export::save_profile;
use crate::host::{HostEvent, SnapshotHost};
use crate::profiling::{ProfilerBackend, SessionPhase};
use crate::view_model::{RecordList, RuntimeExtensionsModel};

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
const STYLE_LABEL: Style = Style::new().fg(CAUTION_AMBER).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

// =============================================================================
// VIEW MODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    List,
    /// Detailed view of a single extension (frozen snapshot)
    Details,
    Help,
}

/// Work a key asks the loop to do on the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    ToggleProfiling,
    Reload,
    Export,
}

// =============================================================================
// LIVE APP
// =============================================================================

struct LiveApp {
    list: ExtensionListView,
    /// Lists published by the model since the last turn
    updates: Receiver<RecordList>,

    view_mode: ViewMode,
    should_quit: bool,
    /// Frozen record for the details overlay (list may re-sort underneath)
    frozen: Option<RuntimeExtensionRecord>,
    /// Outcome of the last command, shown in the status bar
    notice: Option<(Severity, String)>,
}

impl LiveApp {
    fn new(
        records: RecordList,
        trace_duration: Option<Micros>,
        updates: Receiver<RecordList>,
    ) -> Self {
        Self {
            list: ExtensionListView::new(records, trace_duration),
            updates,
            view_mode: ViewMode::List,
            should_quit: false,
            frozen: None,
            notice: None,
        }
    }

    /// Process keyboard input based on current view mode
    fn handle_key(&mut self, key: KeyCode) -> Option<Command> {
        match self.view_mode {
            ViewMode::List => match key {
                KeyCode::Char('q' | 'Q') => self.should_quit = true,
                KeyCode::Up => self.list.scroll_up(),
                KeyCode::Down => self.list.scroll_down(),
                KeyCode::Enter => {
                    self.frozen = self.list.selected().cloned();
                    if self.frozen.is_some() {
                        self.view_mode = ViewMode::Details;
                    }
                }
                KeyCode::Char('p' | 'P') => return Some(Command::ToggleProfiling),
                KeyCode::Char('r' | 'R') => return Some(Command::Reload),
                KeyCode::Char('e' | 'E') => return Some(Command::Export),
                KeyCode::Char('?') => self.view_mode = ViewMode::Help,
                _ => {}
            },
            ViewMode::Help => self.view_mode = ViewMode::List,
            ViewMode::Details => {
                if matches!(key, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'Q')) {
                    self.view_mode = ViewMode::List;
                    self.frozen = None;
                }
            }
        }
        None
    }

    /// Take the newest published list, if any
    fn take_updates(&mut self, trace_duration: Option<Micros>) -> bool {
        let Some(latest) = self.updates.try_iter().last() else {
            return false;
        };
        self.list.set_records(latest, trace_duration);
        true
    }
}

fn run_command<B: ProfilerBackend>(
    model: &mut RuntimeExtensionsModel<SnapshotHost, B>,
    command: Command,
    export_path: &Path,
) -> Option<(Severity, String)> {
    match command {
        Command::ToggleProfiling => {
            model.toggle_profiling();
            None
        }
        Command::Reload => match model.host_mut().reload() {
            Ok(()) => Some((Severity::Info, "snapshot reloaded".to_string())),
            Err(e) => {
                warn!("reload failed: {e}");
                Some((Severity::Error, e.to_string()))
            }
        },
        Command::Export => {
            let trace = model.trace();
            match save_profile(export_path, trace.as_deref(), &model.records()) {
                Ok(()) => Some((Severity::Info, format!("saved: {}", export_path.display()))),
                Err(ExportError::NoProfile) => {
                    Some((Severity::Warning, "nothing to export: press P to profile".to_string()))
                }
                Err(e) => {
                    warn!("export failed: {e}");
                    Some((Severity::Error, e.to_string()))
                }
            }
        }
    }
}

// =============================================================================
// TERMINAL SETUP
// =============================================================================

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<CrosstermTerminal, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| TuiError::TerminalError(e.to_string()))
}

fn restore_terminal(terminal: &mut CrosstermTerminal) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

// =============================================================================
// LIVE MODE ENTRY POINT
// =============================================================================

/// Run the live list until the user quits
///
/// This is the main entry point for interactive use. It:
/// 1. Sets up the terminal in raw mode
/// 2. Drains host events and pumps the model every turn (non-blocking)
/// 3. Updates the display at 10Hz (100ms intervals)
/// 4. Handles keyboard input
/// 5. Cleans up terminal on exit
///
/// `e` writes the current trace to `export_path`.
///
/// # Errors
/// Returns an error if terminal setup or rendering fails
pub fn run_live<B: ProfilerBackend>(
    model: &mut RuntimeExtensionsModel<SnapshotHost, B>,
    host_events: &Receiver<HostEvent>,
    export_path: &Path,
) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = live_loop(&mut terminal, model, host_events, export_path);
    // Restore even when the loop failed so the shell stays usable
    restore_terminal(&mut terminal)?;
    result
}

fn live_loop<B: ProfilerBackend>(
    terminal: &mut CrosstermTerminal,
    model: &mut RuntimeExtensionsModel<SnapshotHost, B>,
    host_events: &Receiver<HostEvent>,
    export_path: &Path,
) -> Result<()> {
    let updates = model.subscribe();
    let mut app = LiveApp::new(model.records(), model.trace_duration(), updates);
    let mut last_update: Option<Instant> = None;

    loop {
        let now = Instant::now();
        model.drain_host_events(host_events, now);
        model.pump(now);
        let changed = app.take_updates(model.trace_duration());

        if changed || last_update.map_or(true, |t| t.elapsed() >= UPDATE_INTERVAL) {
            let phase = model.session_phase();
            let duration = model.trace_duration();
            let error_line = model
                .last_error()
                .map(|e| (Severity::Error, e.to_string()))
                .or_else(|| app.notice.clone());

            terminal.draw(|f| {
                let outer_layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3), // Header
                        Constraint::Min(0),    // List
                        Constraint::Length(3), // Status bar
                    ])
                    .split(f.area());

                f.render_widget(
                    render_header(phase, duration, app.list.records().len()),
                    outer_layout[0],
                );
                app.list.render(f, outer_layout[1]);

                match app.view_mode {
                    ViewMode::Help => render_help_overlay(f, f.area()),
                    ViewMode::Details => {
                        if let Some(ref record) = app.frozen {
                            render_details_overlay(f, f.area(), record, duration);
                        }
                    }
                    ViewMode::List => {}
                }

                f.render_widget(
                    render_status_bar(app.view_mode, error_line.as_ref()),
                    outer_layout[2],
                );
            })?;

            last_update = Some(Instant::now());
        }

        // Handle keyboard input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = app.handle_key(key.code) {
                        app.notice = run_command(model, command, export_path);
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// =============================================================================
// PANELS
// =============================================================================

fn render_header(
    phase: SessionPhase,
    trace_duration: Option<Micros>,
    count: usize,
) -> Paragraph<'static> {
    let phase_style = match phase {
        SessionPhase::Running => Style::new().fg(CRITICAL_RED).add_modifier(Modifier::BOLD),
        SessionPhase::Starting | SessionPhase::Stopping => Style::new().fg(CAUTION_AMBER),
        SessionPhase::Idle => STYLE_DIM,
    };
    let trace = trace_duration.map_or_else(|| "no profile".to_string(), |d| format!("profile {d}"));

    Paragraph::new(vec![Line::from(vec![
        Span::styled("EXTHUD", STYLE_HEADING),
        Span::styled(" | ", STYLE_DIM),
        Span::styled(format!("[{}]", phase.label()), phase_style),
        Span::styled(" | ", STYLE_DIM),
        Span::styled(trace, Style::new().fg(HUD_GREEN)),
        Span::styled(" | ", STYLE_DIM),
        Span::styled(format!("{count} extensions"), Style::new().fg(CAUTION_AMBER)),
    ])])
    .block(Block::default().borders(Borders::ALL).border_style(phase_style))
}

fn render_status_bar(
    view_mode: ViewMode,
    notice: Option<&(Severity, String)>,
) -> Paragraph<'static> {
    let mut spans = vec![
        Span::styled("Q", STYLE_KEY),
        Span::styled(":Quit ", STYLE_DIM),
        Span::styled("P", STYLE_KEY),
        Span::styled(":Profile ", STYLE_DIM),
        Span::styled("R", STYLE_KEY),
        Span::styled(":Reload ", STYLE_DIM),
        Span::styled("E", STYLE_KEY),
        Span::styled(":Export ", STYLE_DIM),
        Span::styled("Enter", STYLE_KEY),
        Span::styled(":Detail ", STYLE_DIM),
        Span::styled("?", STYLE_KEY),
        Span::styled(":Help ", STYLE_DIM),
    ];
    if view_mode == ViewMode::Details {
        spans.push(Span::styled("[Detail] ", Style::new().fg(CAUTION_AMBER)));
    }
    if let Some((severity, text)) = notice {
        spans.push(Span::styled(text.clone(), Style::new().fg(severity_color(*severity))));
    }

    Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(HUD_GREEN)))
}

// =============================================================================
// OVERLAY RENDERERS
// =============================================================================

fn render_help_overlay(f: &mut ratatui::Frame, area: Rect) {
    let popup_area = centered_popup(area, 80, 24);

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  What You're Looking At", STYLE_HEADING)),
        Line::from(Span::styled(
            "  Every extension the host has activated, with how long activation took.",
            STYLE_DIM,
        )),
        Line::from(Span::styled(
            "  After a profiling session the list is sorted by CPU time in the host.",
            STYLE_DIM,
        )),
        Line::from(""),
        Line::from(Span::styled("  How to Read It", STYLE_HEADING)),
        Line::from(vec![
            Span::styled("  Activation  ", STYLE_LABEL),
            Span::styled("Code loading plus the activate call.", STYLE_DIM),
        ]),
        Line::from(vec![
            Span::styled("  Profile     ", STYLE_LABEL),
            Span::styled("Time attributed to the extension and its share.", STYLE_DIM),
        ]),
        Line::from(vec![
            Span::styled("  Markers     ", STYLE_LABEL),
            Span::styled("Red above 40% of the profile, amber above 20%.", STYLE_DIM),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        Line::from(vec![
            Span::styled("  ↑↓", STYLE_KEY),
            Span::styled(" Select   ", STYLE_TEXT),
            Span::styled("Enter", STYLE_KEY),
            Span::styled(" Inspect   ", STYLE_TEXT),
            Span::styled("P", STYLE_KEY),
            Span::styled(" Start/stop profiling   ", STYLE_TEXT),
        ]),
        Line::from(vec![
            Span::styled("  R", STYLE_KEY),
            Span::styled(" Reload snapshot   ", STYLE_TEXT),
            Span::styled("E", STYLE_KEY),
            Span::styled(" Export profile   ", STYLE_TEXT),
            Span::styled("Q", STYLE_KEY),
            Span::styled(" Quit", STYLE_TEXT),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(BACKGROUND).fg(HUD_GREEN)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

/// Maximum segments listed in the details overlay
const MAX_SEGMENT_LINES: usize = 6;

fn render_details_overlay(
    f: &mut ratatui::Frame,
    area: Rect,
    record: &RuntimeExtensionRecord,
    trace_duration: Option<Micros>,
) {
    let popup_area = centered_popup(area, 70, 28);
    let separator = "─".repeat(popup_area.width.saturating_sub(4) as usize);
    let field = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, STYLE_LABEL), Span::styled(value, STYLE_TEXT)])
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", record.display_name()), STYLE_HEADING)),
        Line::from(Span::styled(format!("  {separator}"), STYLE_DIM)),
        field("  Id          ", record.id().to_string()),
        field("  Version     ", record.description.version.clone()),
    ];
    if let Some(ref url) = record.description.repository_url {
        lines.push(field("  Repository  ", url.clone()));
    }
    if let Some(ref marketplace) = record.marketplace {
        lines.push(field("  Source      ", format!("{:?}", marketplace.install_source)));
    }

    let activation = &record.activation;
    lines.push(Line::from(""));
    lines.push(field("  Activation  ", activation_summary(activation)));
    lines.push(Line::from(Span::styled(
        format!("              {}", trigger_description(activation)),
        STYLE_DIM,
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "              load {} · call {} · resolve {}",
            Millis(activation.code_loading_time),
            Millis(activation.activate_call_time),
            Millis(activation.activate_resolved_time)
        ),
        STYLE_DIM,
    )));

    if let (Some(duration), Some(profile)) = (trace_duration, record.profile.as_ref()) {
        lines.push(Line::from(""));
        lines.push(field("  Profile     ", profile_summary(record, duration).unwrap_or_default()));
        for segment in profile.segments.iter().take(MAX_SEGMENT_LINES) {
            lines.push(Line::from(Span::styled(
                format!("              {}..{} ({}us)", segment.start, segment.end, segment.len()),
                STYLE_DIM,
            )));
        }
        if profile.segments.len() > MAX_SEGMENT_LINES {
            lines.push(Line::from(Span::styled(
                format!("              +{} more", profile.segments.len() - MAX_SEGMENT_LINES),
                STYLE_DIM,
            )));
        }
    }

    if !record.messages.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("  Messages", STYLE_HEADING)));
        for message in &record.messages {
            lines.push(Line::from(Span::styled(
                format!("  • {}", message.message),
                Style::new().fg(severity_color(message.severity)),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Esc to close", STYLE_DIM)));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Extension ")
            .style(Style::new().bg(BACKGROUND).fg(HUD_GREEN)),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(widget, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use exthud_common::{ActivationTimes, ActivationTrigger, ExtensionDescription, ExtensionId};

    fn records(ids: &[&str]) -> RecordList {
        ids.iter()
            .enumerate()
            .map(|(original_index, id)| RuntimeExtensionRecord {
                original_index,
                description: ExtensionDescription {
                    identifier: ExtensionId::new(*id),
                    display_name: None,
                    version: "1.0.0".to_string(),
                    has_entry_point: true,
                    repository_url: None,
                    is_builtin: false,
                },
                marketplace: None,
                activation: ActivationTimes {
                    trigger: ActivationTrigger::Startup,
                    startup: true,
                    code_loading_time: 1,
                    activate_call_time: 2,
                    activate_resolved_time: 0,
                    activated_by: None,
                },
                messages: Vec::new(),
                profile: None,
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn app(ids: &[&str]) -> (LiveApp, crossbeam_channel::Sender<RecordList>) {
        let (tx, rx) = unbounded();
        (LiveApp::new(records(ids), None, rx), tx)
    }

    #[test]
    fn test_list_keys_map_to_commands() {
        let (mut app, _tx) = app(&["a"]);
        assert_eq!(app.handle_key(KeyCode::Char('p')), Some(Command::ToggleProfiling));
        assert_eq!(app.handle_key(KeyCode::Char('R')), Some(Command::Reload));
        assert_eq!(app.handle_key(KeyCode::Char('e')), Some(Command::Export));
        assert_eq!(app.handle_key(KeyCode::Down), None);
        assert!(!app.should_quit);
        assert_eq!(app.handle_key(KeyCode::Char('q')), None);
        assert!(app.should_quit);
    }

    #[test]
    fn test_details_freezes_selected_record() {
        let (mut app, tx) = app(&["a", "b"]);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view_mode, ViewMode::Details);

        tx.send(records(&["c"])).unwrap();
        assert!(app.take_updates(None));
        assert_eq!(app.frozen.as_ref().unwrap().id().as_str(), "b");

        // Commands are not accepted while the overlay is open
        assert_eq!(app.handle_key(KeyCode::Char('p')), None);
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.view_mode, ViewMode::List);
        assert!(app.frozen.is_none());
    }

    #[test]
    fn test_enter_on_empty_list_stays_in_list() {
        let (mut app, _tx) = app(&[]);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view_mode, ViewMode::List);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let (mut app, _tx) = app(&["a"]);
        app.handle_key(KeyCode::Char('?'));
        assert_eq!(app.view_mode, ViewMode::Help);
        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.view_mode, ViewMode::List);
    }

    #[test]
    fn test_take_updates_keeps_latest() {
        let (mut app, tx) = app(&["a"]);
        assert!(!app.take_updates(None));
        tx.send(records(&["a", "b"])).unwrap();
        tx.send(records(&["a", "b", "c"])).unwrap();
        assert!(app.take_updates(Some(Micros(5))));
        assert_eq!(app.list.records().len(), 3);
    }
}
