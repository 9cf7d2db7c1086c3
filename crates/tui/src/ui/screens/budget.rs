use engine::{EntryKind, LedgerEntry, SelectionState, ViewState, format_currency};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::AppState,
    ui::{
        components::{
            card::{Card, StatCard},
            money::{plain_amount, signed_amount},
        },
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Weeks
            Constraint::Length(4), // Totals
            Constraint::Min(0),    // Entry lists
            Constraint::Length(1), // Warnings
        ])
        .split(area);

    render_weeks(frame, layout[0], state, theme);
    render_totals(frame, layout[1], state, theme);
    render_lists(frame, layout[2], state, theme);
    render_warnings(frame, layout[3], state, theme);
}

fn render_weeks(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let selection = state.session.selection();
    let card = Card::new("Weeks", theme).loading(selection.is_loading_weeks());

    let line = match selection.state() {
        SelectionState::NoMonthSelected => {
            Line::from(Span::styled("No month selected", Style::default().fg(theme.dim)))
        }
        SelectionState::MonthSelected { .. } | SelectionState::WeekListLoading { .. } => {
            Line::from(Span::styled("Loading weeks…", Style::default().fg(theme.dim)))
        }
        SelectionState::WeekListFailed { error, .. } => Line::from(Span::styled(
            format!("Weeks unavailable: {error}  (r to retry)"),
            Style::default().fg(theme.error),
        )),
        SelectionState::WeekListLoaded { .. } => {
            Line::from(Span::styled("No weeks in this month", Style::default().fg(theme.dim)))
        }
        SelectionState::WeekSelected { weeks, week_id, .. } => {
            let mut spans = Vec::new();
            for week in weeks {
                let label = format!(
                    "W{} {}-{}",
                    week.ordinal,
                    week.start_date.format("%d.%m"),
                    week.end_date.format("%d.%m")
                );
                let mut style = Style::default().fg(theme.dim);
                if week.contains(state.today) {
                    style = style.fg(theme.text);
                }
                if week.id == *week_id {
                    style = style.fg(theme.accent).add_modifier(Modifier::BOLD);
                    spans.push(Span::styled(format!("[{label}]"), style));
                } else {
                    spans.push(Span::styled(format!(" {label} "), style));
                }
                spans.push(Span::raw(" "));
            }
            Line::from(spans)
        }
    };

    card.render_with(frame, area, Paragraph::new(line));
}

fn render_totals(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(area);

    let weekly = state.session.weekly_summary();
    let summary = weekly.value();
    let weekly_note = weekly.error().map(|err| format!("! {err}"));
    let pending = state.session.awaiting_selection();
    let loading = weekly.is_loading() || pending;

    for (i, kind) in EntryKind::ALL.into_iter().enumerate() {
        StatCard::new(
            kind.label(),
            plain_amount(summary.map(|s| s.sum_for(kind)), theme),
            theme,
        )
        .subtitle(weekly_note.clone())
        .loading(loading)
        .render(frame, columns[i]);
    }

    StatCard::new(
        "Week residue",
        signed_amount(state.session.weekly_residue(), theme),
        theme,
    )
    .loading(loading)
    .render(frame, columns[3]);

    let monthly = state.session.monthly_residue();
    let residue = monthly.value();
    let monthly_note = monthly.error().map(|err| format!("! {err}"));
    StatCard::new(
        "Month residue",
        signed_amount(residue.and_then(|r| r.monthly_residue), theme),
        theme,
    )
    .subtitle(monthly_note.clone())
    .loading(monthly.is_loading() || pending)
    .render(frame, columns[4]);
    StatCard::new(
        "Daily limit",
        plain_amount(residue.and_then(|r| r.daily_spending_limit), theme),
        theme,
    )
    .subtitle(monthly_note)
    .loading(monthly.is_loading() || pending)
    .render(frame, columns[5]);
}

fn render_lists(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    for (i, kind) in EntryKind::ALL.into_iter().enumerate() {
        render_list(frame, columns[i], state, kind, theme);
    }
}

/// What a view with nothing to fetch shows, depending on why.
fn idle_hint(state: &AppState) -> &'static str {
    if state.session.awaiting_selection() {
        return "Loading…";
    }
    let months_failed = matches!(state.session.months(), ViewState::Failed(_));
    match state.session.selection().state() {
        SelectionState::WeekListFailed { .. } => "Weeks unavailable",
        SelectionState::NoMonthSelected if months_failed => "Months unavailable",
        _ => "No data",
    }
}

fn render_list(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &AppState,
    kind: EntryKind,
    theme: &Theme,
) {
    let view = state.session.entries(kind);
    let card = Card::new(kind.label(), theme)
        .focused(state.focus == kind)
        .loading(view.is_loading() || state.session.awaiting_selection());

    let (entries, error) = match view {
        ViewState::NoData => {
            let hint = Paragraph::new(Span::styled(idle_hint(state), Style::default().fg(theme.dim)));
            card.render_with(frame, area, hint);
            return;
        }
        ViewState::Loading => {
            let hint = Paragraph::new(Span::styled("Loading…", Style::default().fg(theme.dim)));
            card.render_with(frame, area, hint);
            return;
        }
        ViewState::Failed(message) => {
            let hint = Paragraph::new(vec![
                Line::from(Span::styled(message.clone(), Style::default().fg(theme.error))),
                Line::from(Span::styled("r to retry", Style::default().fg(theme.dim))),
            ]);
            card.render_with(frame, area, hint);
            return;
        }
        ViewState::Loaded { value, error, .. } => (value, error),
    };

    let inner = card.inner(area);
    frame.render_widget(card.block(), area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let items = entries
        .iter()
        .map(|entry| ListItem::new(entry_line(entry, theme)))
        .collect::<Vec<_>>();
    let mut list_state = ListState::default();
    if !items.is_empty() && state.focus == kind {
        list_state.select(Some(state.cursor(kind)));
    }
    let list = List::new(items)
        .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, rows[0], &mut list_state);

    let total = state
        .session
        .local_summary()
        .map(|report| report.summary.sum_for(kind));
    let total_line = Line::from(vec![
        Span::styled("Total ", Style::default().fg(theme.dim)),
        plain_amount(total, theme),
    ]);
    frame.render_widget(Paragraph::new(total_line), rows[1]);

    if let Some(error) = error {
        frame.render_widget(
            Paragraph::new(Span::styled(format!("! {error}"), Style::default().fg(theme.error))),
            rows[2],
        );
    }
}

fn entry_line(entry: &LedgerEntry, theme: &Theme) -> Line<'static> {
    let amount = format_currency(entry.amount);
    let amount_style = if entry.amount.is_some() {
        Style::default().fg(theme.text)
    } else {
        Style::default().fg(theme.warning)
    };
    let mut spans = vec![Span::styled(format!("{amount:>12}"), amount_style)];
    if let Some(description) = &entry.description {
        spans.push(Span::raw("  "));
        spans.push(Span::raw(description.clone()));
    }
    Line::from(spans)
}

fn render_warnings(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    if let Some(error) = state.session.mutation_error() {
        frame.render_widget(
            Paragraph::new(Span::styled(error.to_string(), Style::default().fg(theme.error))),
            area,
        );
        return;
    }
    let Some(report) = state.session.local_summary() else {
        return;
    };
    if let Some(first) = report.warnings.first() {
        let more = report.warnings.len() - 1;
        let text = if more > 0 {
            format!("{first} (+{more} more)")
        } else {
            first.to_string()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme.warning))),
            area,
        );
    }
}
