use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a [`Month`].
    MonthId
);
id_type!(
    /// Identifier of a [`Week`].
    WeekId
);
id_type!(
    /// Identifier of a [`LedgerEntry`], unique within its kind.
    EntryId
);

/// Static reference data: one calendar month of the budget year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Month {
    pub id: MonthId,
    pub name: String,
    /// Calendar month number, 1-12.
    pub ordinal: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub id: WeekId,
    /// Position within the month, starting at 1.
    pub ordinal: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub month_id: MonthId,
}

impl Week {
    /// Returns `true` if `date` falls within the week, both ends inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    GeneralExpense,
    PersonalExpense,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [
        EntryKind::Income,
        EntryKind::GeneralExpense,
        EntryKind::PersonalExpense,
    ];

    /// Expenses carry a description, income does not.
    #[must_use]
    pub const fn requires_description(self) -> bool {
        !matches!(self, EntryKind::Income)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::GeneralExpense => "General expenses",
            Self::PersonalExpense => "Personal expenses",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Income => 0,
            Self::GeneralExpense => 1,
            Self::PersonalExpense => 2,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded income or expense, owned by a week.
///
/// `amount` is `None` when the collaborator sent a missing or non-numeric
/// value; the row is kept so the aggregator can flag it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    pub week_id: WeekId,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

/// Per-category totals of a week. Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_id: WeekId,
    pub income_sum: Decimal,
    pub general_expenses_sum: Decimal,
    pub personal_expenses_sum: Decimal,
}

impl WeeklySummary {
    #[must_use]
    pub const fn empty(week_id: WeekId) -> Self {
        Self {
            week_id,
            income_sum: Decimal::ZERO,
            general_expenses_sum: Decimal::ZERO,
            personal_expenses_sum: Decimal::ZERO,
        }
    }

    #[must_use]
    pub const fn sum_for(&self, kind: EntryKind) -> Decimal {
        match kind {
            EntryKind::Income => self.income_sum,
            EntryKind::GeneralExpense => self.general_expenses_sum,
            EntryKind::PersonalExpense => self.personal_expenses_sum,
        }
    }
}

/// Month balance as computed by the collaborator's aggregate view.
///
/// Both figures are opaque here; `None` means the collaborator sent nothing
/// usable and the value is rendered as a placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResidue {
    pub month_id: MonthId,
    pub monthly_residue: Option<Decimal>,
    pub daily_spending_limit: Option<Decimal>,
}
