use engine::format_currency;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::{
    app::{AppState, EntryForm, FormField, Mode},
    ui::{components::card::Card, theme::Theme},
};

/// Draws the add/edit form or the delete confirmation over the dashboard.
pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    match &state.mode {
        Mode::Browse => {}
        Mode::Form(form) => render_form(frame, area, form, theme),
        Mode::ConfirmDelete(entry) => {
            let rect = centered(area, 50, 5);
            let card = Card::new("Delete entry", theme).focused(true);
            let what = entry
                .description
                .as_deref()
                .map(|d| format!(" \"{d}\""))
                .unwrap_or_default();
            let lines = vec![
                Line::from(format!(
                    "Delete {}{what} of {}?",
                    entry.kind.label().to_lowercase(),
                    format_currency(entry.amount)
                )),
                Line::from(vec![
                    Span::styled("y", Style::default().fg(theme.accent)),
                    Span::raw(" confirm  "),
                    Span::styled("any key", Style::default().fg(theme.accent)),
                    Span::raw(" cancel"),
                ]),
            ];
            frame.render_widget(Clear, rect);
            card.render_with(frame, rect, Paragraph::new(lines));
        }
    }
}

fn render_form(frame: &mut Frame<'_>, area: Rect, form: &EntryForm, theme: &Theme) {
    let rect = centered(area, 50, 7);
    let card = Card::new(form.title(), theme).focused(true);
    let inner = card.inner(rect);
    frame.render_widget(Clear, rect);
    frame.render_widget(card.block(), rect);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(field_line("Amount", &form.amount, form.focus == FormField::Amount, theme)),
        rows[0],
    );
    if form.kind.requires_description() {
        frame.render_widget(
            Paragraph::new(field_line(
                "Description",
                &form.description,
                form.focus == FormField::Description,
                theme,
            )),
            rows[1],
        );
    }
    if let Some(message) = &form.message {
        frame.render_widget(
            Paragraph::new(Span::styled(message.clone(), Style::default().fg(theme.error))),
            rows[2],
        );
    }
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Enter", Style::default().fg(theme.accent)),
            Span::raw(" save  "),
            Span::styled("Tab", Style::default().fg(theme.accent)),
            Span::raw(" next  "),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::raw(" cancel"),
        ])),
        rows[3],
    );
}

fn field_line(label: &str, value: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.dim)
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:<12}"), label_style),
        Span::styled(format!("{value}{cursor}"), Style::default().fg(theme.text)),
    ])
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    rect
}
