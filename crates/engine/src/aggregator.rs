//! Pure computations over ledger entries.
//!
//! Nothing here holds state: the same input always yields the same output.
use std::fmt;

use rust_decimal::Decimal;

use crate::{EntryId, EntryKind, LedgerEntry, WeekId, WeeklySummary};

/// An entry whose amount could not be summed.
///
/// The entry stays in its list; it only contributes 0 to the totals.
#[derive(Clone, Debug, PartialEq)]
pub struct DataWarning {
    pub kind: EntryKind,
    pub entry_id: EntryId,
    pub week_id: WeekId,
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entry #{} in week {} has a non-numeric amount",
            self.kind, self.entry_id, self.week_id
        )
    }
}

/// Output of [`compute_weekly_summary`].
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryReport {
    pub summary: WeeklySummary,
    pub warnings: Vec<DataWarning>,
}

/// Sums entry amounts per kind with exact decimal addition.
///
/// Kinds with no entries sum to zero. Entries without a usable amount
/// contribute zero and are reported in [`SummaryReport::warnings`].
#[must_use]
pub fn compute_weekly_summary(week_id: WeekId, entries: &[LedgerEntry]) -> SummaryReport {
    let mut sums = [Decimal::ZERO; 3];
    let mut warnings = Vec::new();

    for entry in entries {
        if let Some(amount) = entry.amount {
            let slot = &mut sums[entry.kind.index()];
            *slot = slot.saturating_add(amount);
        } else {
            tracing::warn!(
                kind = %entry.kind,
                entry_id = %entry.id,
                week_id = %entry.week_id,
                "non-numeric amount counted as 0"
            );
            warnings.push(DataWarning {
                kind: entry.kind,
                entry_id: entry.id,
                week_id: entry.week_id,
            });
        }
    }

    SummaryReport {
        summary: WeeklySummary {
            week_id,
            income_sum: sums[EntryKind::Income.index()],
            general_expenses_sum: sums[EntryKind::GeneralExpense.index()],
            personal_expenses_sum: sums[EntryKind::PersonalExpense.index()],
        },
        warnings,
    }
}

/// Income minus both expense categories. May be negative.
#[must_use]
pub fn compute_weekly_residue(summary: &WeeklySummary) -> Decimal {
    summary
        .income_sum
        .saturating_sub(summary.general_expenses_sum)
        .saturating_sub(summary.personal_expenses_sum)
}
