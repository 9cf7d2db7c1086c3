use rust_decimal::Decimal;

use crate::{EntryKind, ValidationError, money::parse_amount};

/// User input for a create or update, already validated.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryDraft {
    pub kind: EntryKind,
    pub amount: Decimal,
    /// Always `Some` for expenses, always `None` for income.
    pub description: Option<String>,
}

impl EntryDraft {
    /// Validates raw form input. Nothing is sent to the collaborator unless
    /// this succeeds.
    pub fn new(kind: EntryKind, amount: &str, description: &str) -> Result<Self, ValidationError> {
        let amount = parse_amount(amount)?;
        let description = if kind.requires_description() {
            let trimmed = description.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::MissingDescription);
            }
            Some(trimmed.to_string())
        } else {
            None
        };

        Ok(Self {
            kind,
            amount,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_ignores_description() {
        let draft = EntryDraft::new(EntryKind::Income, "35000", "salary").unwrap();
        assert_eq!(draft.amount, Decimal::new(35000, 0));
        assert_eq!(draft.description, None);
    }

    #[test]
    fn expenses_require_description() {
        assert_eq!(
            EntryDraft::new(EntryKind::GeneralExpense, "500", "  "),
            Err(ValidationError::MissingDescription)
        );
        let draft = EntryDraft::new(EntryKind::PersonalExpense, "12,5", " coffee ").unwrap();
        assert_eq!(draft.amount, Decimal::new(125, 1));
        assert_eq!(draft.description.as_deref(), Some("coffee"));
    }

    #[test]
    fn amount_is_checked_before_description() {
        assert_eq!(
            EntryDraft::new(EntryKind::GeneralExpense, "0", ""),
            Err(ValidationError::NonPositiveAmount)
        );
    }
}
