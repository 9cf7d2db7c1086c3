use api_types::{
    ErrorResponse, RawDecimal,
    entry::{
        EntryCreated, EntryDelete, ExpenseNew, ExpenseUpdate, GeneralExpenseRow, IncomeNew,
        IncomeRow, IncomeUpdate, PersonalExpenseRow,
    },
    month::{MonthRow, ResidueSummary},
    status::DbStatus,
    week::{self, WeekRow},
};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use engine::{
    EntryDraft, EntryId, EntryKind, EntryReceipt, LedgerEntry, LedgerSource, Month, MonthId,
    MonthlyResidue, SourceError, Week, WeekId, WeeklySummary,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, Result};

type SourceResult<T> = std::result::Result<T, SourceError>;

/// HTTP client for the budget functions.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    timezone: Tz,
}

impl Client {
    pub fn new(base_url: &str, timezone: Tz) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::InvalidSetting(format!("base_url {base_url:?}: {err}")))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("budget_tui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            http,
            timezone,
        })
    }

    fn endpoint(&self, path: &str) -> SourceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|err| SourceError::Transport(format!("invalid base_url: {err}")))
    }

    /// Sends the request and turns non-2xx answers into [`SourceError::Status`],
    /// using the `{ "error": ... }` body when there is one.
    async fn execute(&self, request: RequestBuilder) -> SourceResult<Response> {
        let res = request
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let message = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(SourceError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, i64)]) -> SourceResult<T> {
        let endpoint = self.endpoint(path)?;
        let res = self.execute(self.http.get(endpoint).query(query)).await?;
        res.json::<T>()
            .await
            .map_err(|err| SourceError::Decode(err.to_string()))
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> SourceResult<Response> {
        let endpoint = self.endpoint(path)?;
        self.execute(self.http.request(method, endpoint).json(body))
            .await
    }

    pub async fn db_status(&self) -> SourceResult<DbStatus> {
        self.get("db-status", &[]).await
    }

    fn parse_day(&self, text: &str) -> SourceResult<NaiveDate> {
        parse_day(text, self.timezone)
    }
}

/// Parses a week boundary. Plain dates are taken as is; timestamps are
/// converted to the configured timezone first, since the database driver
/// serializes local midnight as UTC.
fn parse_day(text: &str, timezone: Tz) -> SourceResult<NaiveDate> {
    let text = text.trim();
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.with_timezone(&timezone).date_naive())
        .map_err(|err| SourceError::Decode(format!("invalid date {text:?}: {err}")))
}

/// `None` for a missing or non-numeric amount; the row is still listed.
fn amount(raw: Option<&RawDecimal>) -> Option<Decimal> {
    raw.and_then(RawDecimal::to_decimal)
}

/// SQL `SUM` over no rows is `NULL`. Anything else that is not a number is a
/// broken response.
fn sum(raw: Option<&RawDecimal>, column: &str) -> SourceResult<Decimal> {
    match raw {
        None => Ok(Decimal::ZERO),
        Some(raw) => raw
            .to_decimal()
            .ok_or_else(|| SourceError::Decode(format!("non-numeric {column}: {raw:?}"))),
    }
}

fn entries_path(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Income => "get-income",
        EntryKind::GeneralExpense => "get-general-expenses",
        EntryKind::PersonalExpense => "get-personal-expenses",
    }
}

fn write_path(verb: &str, kind: EntryKind) -> String {
    let noun = match kind {
        EntryKind::Income => "income",
        EntryKind::GeneralExpense => "general-expense",
        EntryKind::PersonalExpense => "personal-expense",
    };
    format!("{verb}-{noun}")
}

fn description_of(draft: &EntryDraft) -> String {
    draft.description.clone().unwrap_or_default()
}

impl LedgerSource for Client {
    async fn list_months(&self) -> SourceResult<Vec<Month>> {
        let rows: Vec<MonthRow> = self.get("get-months", &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| Month {
                id: MonthId(row.month_id),
                name: row.name,
                ordinal: row.month_number,
            })
            .collect())
    }

    async fn list_weeks(&self, month_id: MonthId) -> SourceResult<Vec<Week>> {
        let rows: Vec<WeekRow> = self.get("get-weeks", &[("monthId", month_id.0)]).await?;
        rows.into_iter()
            .map(|row| {
                Ok(Week {
                    id: WeekId(row.weeks_id),
                    ordinal: row.week_number,
                    start_date: self.parse_day(&row.first_week_day)?,
                    end_date: self.parse_day(&row.last_week_day)?,
                    month_id,
                })
            })
            .collect()
    }

    async fn list_entries(
        &self,
        kind: EntryKind,
        week_id: WeekId,
    ) -> SourceResult<Vec<LedgerEntry>> {
        let path = entries_path(kind);
        let query = [("weekId", week_id.0)];
        let entries = match kind {
            EntryKind::Income => self
                .get::<Vec<IncomeRow>>(path, &query)
                .await?
                .into_iter()
                .map(|row| LedgerEntry {
                    id: EntryId(row.income_id),
                    kind,
                    week_id,
                    amount: amount(row.amount.as_ref()),
                    description: None,
                })
                .collect(),
            EntryKind::GeneralExpense => self
                .get::<Vec<GeneralExpenseRow>>(path, &query)
                .await?
                .into_iter()
                .map(|row| LedgerEntry {
                    id: EntryId(row.general_expenses_id),
                    kind,
                    week_id,
                    amount: amount(row.amount.as_ref()),
                    description: row.description,
                })
                .collect(),
            EntryKind::PersonalExpense => self
                .get::<Vec<PersonalExpenseRow>>(path, &query)
                .await?
                .into_iter()
                .map(|row| LedgerEntry {
                    id: EntryId(row.personal_expenses_id),
                    kind,
                    week_id,
                    amount: amount(row.amount.as_ref()),
                    description: row.description,
                })
                .collect(),
        };
        Ok(entries)
    }

    async fn create_entry(
        &self,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> SourceResult<EntryReceipt> {
        let path = write_path("add", draft.kind);
        let res = match draft.kind {
            EntryKind::Income => {
                let payload = IncomeNew {
                    amount: draft.amount,
                    week_id: week_id.0,
                };
                self.send_json(Method::POST, &path, &payload).await?
            }
            EntryKind::GeneralExpense | EntryKind::PersonalExpense => {
                let payload = ExpenseNew {
                    description: description_of(draft),
                    amount: draft.amount,
                    week_id: week_id.0,
                };
                self.send_json(Method::POST, &path, &payload).await?
            }
        };

        let created = res
            .json::<EntryCreated>()
            .await
            .map_err(|err| SourceError::Decode(err.to_string()))?;
        if created.success == Some(false) {
            return Err(SourceError::Status {
                status: StatusCode::OK.as_u16(),
                message: "server reported failure".to_string(),
            });
        }
        Ok(EntryReceipt {
            id: created.id.map(EntryId),
            kind: draft.kind,
            week_id: created
                .week_id
                .and_then(|id| id.as_i64())
                .map_or(week_id, WeekId),
            amount: amount(created.amount.as_ref()).unwrap_or(draft.amount),
            description: created.description.or_else(|| draft.description.clone()),
        })
    }

    async fn update_entry(
        &self,
        id: EntryId,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> SourceResult<()> {
        let path = write_path("update", draft.kind);
        match draft.kind {
            EntryKind::Income => {
                let payload = IncomeUpdate {
                    id: id.0,
                    amount: draft.amount,
                    week_id: week_id.0,
                };
                self.send_json(Method::PUT, &path, &payload).await?;
            }
            EntryKind::GeneralExpense | EntryKind::PersonalExpense => {
                let payload = ExpenseUpdate {
                    id: id.0,
                    description: description_of(draft),
                    amount: draft.amount,
                    week_id: week_id.0,
                };
                self.send_json(Method::PUT, &path, &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_entry(&self, kind: EntryKind, id: EntryId) -> SourceResult<()> {
        let path = write_path("delete", kind);
        self.send_json(Method::DELETE, &path, &EntryDelete { id: id.0 })
            .await?;
        Ok(())
    }

    async fn weekly_summary(&self, week_id: WeekId) -> SourceResult<WeeklySummary> {
        let row = match self
            .get::<week::WeeklySummary>("get-weekly-summary", &[("weekId", week_id.0)])
            .await
        {
            Ok(row) => row,
            // No accounting row yet: nothing was recorded this week.
            Err(SourceError::Status { status: 404, .. }) => {
                return Ok(WeeklySummary::empty(week_id));
            }
            Err(err) => return Err(err),
        };
        Ok(WeeklySummary {
            week_id,
            income_sum: sum(row.income_sum.as_ref(), "IncomeSum")?,
            general_expenses_sum: sum(row.general_expenses_sum.as_ref(), "GeneralExpensesSum")?,
            personal_expenses_sum: sum(row.personal_expenses_sum.as_ref(), "PersonalExpensesSum")?,
        })
    }

    async fn monthly_residue(&self, month_id: MonthId) -> SourceResult<MonthlyResidue> {
        match self
            .get::<ResidueSummary>("get-residue-summary", &[("monthId", month_id.0)])
            .await
        {
            Ok(row) => Ok(MonthlyResidue {
                month_id,
                monthly_residue: amount(row.monthly_residue.as_ref()),
                daily_spending_limit: amount(row.daily_spending_limit.as_ref()),
            }),
            Err(SourceError::Status { status: 404, .. }) => Ok(MonthlyResidue {
                month_id,
                monthly_residue: None,
                daily_spending_limit: None,
            }),
            Err(err) => Err(err),
        }
    }
}
