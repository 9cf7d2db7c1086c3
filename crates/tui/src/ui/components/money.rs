use engine::format_currency;
use ratatui::{style::Style, text::Span};
use rust_decimal::Decimal;

use crate::ui::theme::Theme;

/// Amount in the text color, or the placeholder dimmed when unavailable.
#[must_use]
pub fn plain_amount(value: Option<Decimal>, theme: &Theme) -> Span<'static> {
    let color = if value.is_some() { theme.text } else { theme.dim };
    Span::styled(format_currency(value), Style::default().fg(color))
}

/// Amount colored by sign. Used for residues, where the sign is the point.
///
/// The sign is taken after rounding to cents, so the color always agrees
/// with the digits shown.
#[must_use]
pub fn signed_amount(value: Option<Decimal>, theme: &Theme) -> Span<'static> {
    let color = match value.map(|value| value.round_dp(2)) {
        Some(value) if value > Decimal::ZERO => theme.positive,
        Some(value) if value < Decimal::ZERO => theme.negative,
        Some(_) => theme.text,
        None => theme.dim,
    };
    Span::styled(format_currency(value), Style::default().fg(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_residue_is_red() {
        let theme = Theme::default();
        let span = signed_amount(Some(Decimal::new(-150, 0)), &theme);
        assert_eq!(span.content, "-150.00");
        assert_eq!(span.style.fg, Some(theme.negative));
    }

    #[test]
    fn balanced_residue_is_neutral() {
        let theme = Theme::default();
        let span = signed_amount(Some(Decimal::new(-1, 3)), &theme);
        assert_eq!(span.content, "0.00");
        assert_eq!(span.style.fg, Some(theme.text));
    }

    #[test]
    fn missing_value_shows_placeholder() {
        let theme = Theme::default();
        let span = plain_amount(None, &theme);
        assert_eq!(span.content, engine::PLACEHOLDER);
        assert_eq!(span.style.fg, Some(theme.dim));
    }
}
