pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Mode};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(1), // Month tabs
            Constraint::Min(0),    // Dashboard
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_months(
        frame,
        layout[1],
        state.session.months(),
        state.session.selection().month_id(),
        &theme,
    );
    screens::budget::render(frame, layout[2], state, &theme);
    render_bottom_bar(frame, layout[3], state, &theme);

    screens::entry_form::render(frame, area, state, &theme);
    components::toast::render(frame, area, state.toast.as_ref(), &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let (status, status_style) = match state.db_connected {
        Some(true) => ("OK", Style::default().fg(theme.positive)),
        Some(false) => ("ERR", Style::default().fg(theme.error)),
        None => ("…", Style::default().fg(theme.dim)),
    };
    let month = state
        .session
        .current_month()
        .map_or("-", |month| month.name.as_str());

    let mut spans = vec![
        Span::styled("Server", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Month", Style::default().fg(theme.dim)),
        Span::raw(format!(": {month}  ")),
        Span::styled("Today", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.today.format("%d.%m.%Y"))),
        Span::styled("Epoch", Style::default().fg(theme.dim)),
        Span::raw(format!(": {}  ", state.session.epoch())),
        Span::styled("DB", Style::default().fg(theme.dim)),
        Span::raw(": "),
        Span::styled(status, status_style),
    ];
    if state.pending_writes > 0 {
        spans.push(Span::styled(
            format!("  saving {}…", state.pending_writes),
            Style::default().fg(theme.warning),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let key = |label: &'static str| Span::styled(label, Style::default().fg(theme.accent));
    let parts = match state.mode {
        Mode::Browse => vec![
            key("[ ]"),
            Span::raw(" month  "),
            key("←/→"),
            Span::raw(" week  "),
            key("Tab"),
            Span::raw(" list  "),
            key("↑/↓"),
            Span::raw(" entry  "),
            key("a"),
            Span::raw(" add  "),
            key("e"),
            Span::raw(" edit  "),
            key("d"),
            Span::raw(" delete  "),
            key("r"),
            Span::raw(" refresh"),
            Span::styled("  │  ", Style::default().fg(theme.border)),
            key("q"),
            Span::raw(" quit"),
        ],
        Mode::Form(_) => vec![
            key("Enter"),
            Span::raw(" save  "),
            key("Esc"),
            Span::raw(" cancel"),
        ],
        Mode::ConfirmDelete(_) => vec![key("y"), Span::raw(" confirm delete")],
    };

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
