use rust_decimal::{Decimal, RoundingStrategy};

use crate::ValidationError;

/// Placeholder shown for missing or non-numeric aggregates.
pub const PLACEHOLDER: &str = "N/A";

/// Formats an aggregate for display with two fixed decimals.
///
/// A missing value degrades to [`PLACEHOLDER`] instead of failing, so views
/// can render whatever the collaborator sent. Rounding happens here and only
/// here; sums keep every digit.
///
/// # Examples
///
/// ```rust
/// use engine::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Some(Decimal::new(12345, 1))), "1234.50");
/// assert_eq!(format_currency(Some(Decimal::new(-8, 0))), "-8.00");
/// assert_eq!(format_currency(None), "N/A");
/// ```
#[must_use]
pub fn format_currency(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // "-0.00" is not a balance anyone wants to read.
    let rounded = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    };
    format!("{rounded:.2}")
}

/// Parses a user-typed amount.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`.
///
/// Validation rules:
/// - rejects empty strings
/// - rejects anything that is not a plain decimal number (no exponent, no
///   thousands separators, no `inf`/`nan`)
/// - rejects more than 2 decimals
/// - rejects zero and negative values
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(input.trim().to_string());

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped.trim_start())
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped.trim_start())
    } else {
        (false, trimmed)
    };

    if rest.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }

    let normalized = rest.replace(',', ".");
    let mut parts = normalized.split('.');
    let whole = parts.next().ok_or_else(invalid)?;
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !digits(whole) || !digits(fraction) {
        return Err(invalid());
    }
    if fraction.len() > 2 {
        return Err(ValidationError::TooManyDecimals);
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = if fraction.is_empty() { "0" } else { fraction };
    let value = Decimal::from_str_exact(&format!("{whole}.{fraction}")).map_err(|_| invalid())?;
    if negative || value <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }

    Ok(value)
}
