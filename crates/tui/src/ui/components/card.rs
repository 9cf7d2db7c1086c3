use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Rounded panel used for every dashboard section.
pub struct Card<'a> {
    title: String,
    theme: &'a Theme,
    focused: bool,
    loading: bool,
}

impl<'a> Card<'a> {
    pub fn new(title: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title: title.into(),
            theme,
            focused: false,
            loading: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Appends a spinner-like marker to the title while data is in flight.
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn block(&self) -> Block<'static> {
        let border_color = if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };
        let mut title = vec![Span::styled(
            format!(" {} ", self.title),
            Style::default().fg(self.theme.accent),
        )];
        if self.loading {
            title.push(Span::styled("… ", Style::default().fg(self.theme.dim)));
        }

        Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
    }

    pub fn inner(&self, area: Rect) -> Rect {
        self.block().inner(area)
    }

    pub fn render_with<W: Widget>(&self, frame: &mut Frame<'_>, area: Rect, content: W) {
        let inner = self.inner(area);
        frame.render_widget(self.block(), area);
        frame.render_widget(content, inner);
    }
}

/// A label over a single emphasized value.
pub struct StatCard<'a> {
    title: &'a str,
    value: Span<'static>,
    subtitle: Option<String>,
    loading: bool,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(title: &'a str, value: Span<'static>, theme: &'a Theme) -> Self {
        Self {
            title,
            value,
            subtitle: None,
            loading: false,
            theme,
        }
    }

    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn render(self, frame: &mut Frame<'_>, area: Rect) {
        let card = Card::new(self.title, self.theme).loading(self.loading);
        let value = self.value.clone();
        let style = value.style.add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(value.style(style))];
        if let Some(sub) = self.subtitle {
            lines.push(Line::from(Span::styled(
                sub,
                Style::default().fg(self.theme.dim),
            )));
        }
        card.render_with(frame, area, Paragraph::new(lines));
    }
}
