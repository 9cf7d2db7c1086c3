use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal column as emitted by the budget endpoints.
///
/// MySQL `DECIMAL` values travel as JSON strings while computed columns travel
/// as numbers, so both shapes are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    Number(f64),
    Text(String),
}

impl RawDecimal {
    /// Returns the exact decimal value, or `None` when the column does not
    /// hold a number.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(value) => Decimal::try_from(*value).ok(),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Generic `{ "error": "..." }` body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod month {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct MonthRow {
        #[serde(rename = "MonthId")]
        pub month_id: i64,
        #[serde(rename = "Name")]
        pub name: String,
        #[serde(rename = "monthNumber")]
        pub month_number: u32,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ResidueSummary {
        #[serde(rename = "MonthId", default)]
        pub month_id: Option<i64>,
        #[serde(rename = "MonthlyResidue")]
        pub monthly_residue: Option<RawDecimal>,
        #[serde(rename = "DailySpendingLimit")]
        pub daily_spending_limit: Option<RawDecimal>,
    }
}

pub mod week {
    use super::*;

    /// One row of `get-weeks`.
    ///
    /// Dates are kept as text: the endpoint emits either `YYYY-MM-DD` or a full
    /// RFC3339 timestamp depending on the driver, and only the client knows
    /// which timezone "today" lives in.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct WeekRow {
        #[serde(rename = "WeeksId")]
        pub weeks_id: i64,
        #[serde(rename = "weekNumber")]
        pub week_number: u32,
        #[serde(rename = "firstWeekDay")]
        pub first_week_day: String,
        #[serde(rename = "lastWeekDay")]
        pub last_week_day: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct WeeklySummary {
        #[serde(rename = "IncomeSum")]
        pub income_sum: Option<RawDecimal>,
        #[serde(rename = "GeneralExpensesSum")]
        pub general_expenses_sum: Option<RawDecimal>,
        #[serde(rename = "PersonalExpensesSum")]
        pub personal_expenses_sum: Option<RawDecimal>,
    }
}

pub mod entry {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct IncomeRow {
        #[serde(rename = "IncomeId")]
        pub income_id: i64,
        #[serde(rename = "Amount")]
        pub amount: Option<RawDecimal>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct GeneralExpenseRow {
        #[serde(rename = "GeneralExpensesId")]
        pub general_expenses_id: i64,
        #[serde(rename = "Description")]
        pub description: Option<String>,
        #[serde(rename = "Amount")]
        pub amount: Option<RawDecimal>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct PersonalExpenseRow {
        #[serde(rename = "PersonalExpensesId")]
        pub personal_expenses_id: i64,
        #[serde(rename = "Description")]
        pub description: Option<String>,
        #[serde(rename = "Amount")]
        pub amount: Option<RawDecimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeNew {
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        #[serde(rename = "weekId")]
        pub week_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        #[serde(rename = "weekId")]
        pub week_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeUpdate {
        pub id: i64,
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        #[serde(rename = "weekId")]
        pub week_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub id: i64,
        pub description: String,
        #[serde(with = "rust_decimal::serde::float")]
        pub amount: Decimal,
        #[serde(rename = "weekId")]
        pub week_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryDelete {
        pub id: i64,
    }

    /// Echo returned by the `add-*` endpoints. The stored row id is not part
    /// of the acknowledgement.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryCreated {
        #[serde(default)]
        pub success: Option<bool>,
        #[serde(default)]
        pub id: Option<i64>,
        #[serde(default)]
        pub description: Option<String>,
        pub amount: Option<RawDecimal>,
        #[serde(rename = "weekId")]
        pub week_id: Option<RawId>,
    }

    /// `weekId` is echoed back verbatim from the request body, which browsers
    /// historically sent as either a number or a string.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum RawId {
        Number(i64),
        Text(String),
    }

    impl RawId {
        pub fn as_i64(&self) -> Option<i64> {
            match self {
                Self::Number(value) => Some(*value),
                Self::Text(text) => text.trim().parse().ok(),
            }
        }
    }
}

pub mod status {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DbStatus {
        pub status: String,
        #[serde(default)]
        pub error: Option<String>,
    }

    impl DbStatus {
        pub fn is_connected(&self) -> bool {
            self.status == "connected"
        }
    }
}
