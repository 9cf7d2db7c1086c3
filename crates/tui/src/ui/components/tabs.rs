use engine::{Month, MonthId, ViewState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ui::theme::Theme;

/// Renders the months as a horizontal tab bar with the selected one bracketed.
pub fn render_months(
    frame: &mut Frame<'_>,
    area: Rect,
    months: &ViewState<Vec<Month>>,
    active: Option<MonthId>,
    theme: &Theme,
) {
    let line = match months {
        ViewState::Loaded { value, .. } if value.is_empty() => {
            Line::from(Span::styled(" No months", Style::default().fg(theme.dim)))
        }
        ViewState::Loaded { value, .. } => month_spans(value, active, theme),
        ViewState::Failed(message) => Line::from(Span::styled(
            format!(" Months unavailable: {message}  (r to retry)"),
            Style::default().fg(theme.error),
        )),
        ViewState::Loading | ViewState::NoData => {
            Line::from(Span::styled(" Loading months…", Style::default().fg(theme.dim)))
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn month_spans(months: &[Month], active: Option<MonthId>, theme: &Theme) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (i, month) in months.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        if Some(month.id) == active {
            spans.push(Span::styled("[", Style::default().fg(theme.accent)));
            spans.push(Span::styled(
                month.name.clone(),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("]", Style::default().fg(theme.accent)));
        } else {
            spans.push(Span::styled(
                month.name.clone(),
                Style::default().fg(theme.dim),
            ));
        }
    }
    Line::from(spans)
}
