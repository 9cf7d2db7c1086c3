//! The collaborator the engine reads from and writes to, and the request
//! values that travel between a [`Session`](crate::Session) and it.
use std::future::Future;

use rust_decimal::Decimal;

use crate::{
    EntryDraft, EntryId, EntryKind, LedgerEntry, Month, MonthId, MonthlyResidue, SourceError,
    Week, WeekId, WeeklySummary, guard::Ticket,
};

/// Acknowledgement of a created entry.
///
/// The collaborator echoes the stored values; it may not report the new id.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryReceipt {
    pub id: Option<EntryId>,
    pub kind: EntryKind,
    pub week_id: WeekId,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Request/response operations over the budget store.
///
/// Every operation may fail with a [`SourceError`]; none is retried.
pub trait LedgerSource: Send + Sync {
    fn list_months(&self) -> impl Future<Output = Result<Vec<Month>, SourceError>> + Send;

    fn list_weeks(
        &self,
        month_id: MonthId,
    ) -> impl Future<Output = Result<Vec<Week>, SourceError>> + Send;

    fn list_entries(
        &self,
        kind: EntryKind,
        week_id: WeekId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, SourceError>> + Send;

    fn create_entry(
        &self,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> impl Future<Output = Result<EntryReceipt, SourceError>> + Send;

    /// `week_id` is the week the entry belongs to; the store needs it to
    /// locate the row.
    fn update_entry(
        &self,
        id: EntryId,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn delete_entry(
        &self,
        kind: EntryKind,
        id: EntryId,
    ) -> impl Future<Output = Result<(), SourceError>> + Send;

    fn weekly_summary(
        &self,
        week_id: WeekId,
    ) -> impl Future<Output = Result<WeeklySummary, SourceError>> + Send;

    fn monthly_residue(
        &self,
        month_id: MonthId,
    ) -> impl Future<Output = Result<MonthlyResidue, SourceError>> + Send;
}

/// A read the caller must perform on behalf of the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Fetch {
    Months,
    Weeks(Ticket<MonthId>),
    Entries(EntryKind, Ticket<WeekId>),
    WeeklySummary(Ticket<WeekId>),
    MonthlyResidue(Ticket<MonthId>),
}

/// The answer to a [`Fetch`], carrying the ticket it was issued with.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Months(Result<Vec<Month>, SourceError>),
    Weeks(Ticket<MonthId>, Result<Vec<Week>, SourceError>),
    Entries(EntryKind, Ticket<WeekId>, Result<Vec<LedgerEntry>, SourceError>),
    WeeklySummary(Ticket<WeekId>, Result<WeeklySummary, SourceError>),
    MonthlyResidue(Ticket<MonthId>, Result<MonthlyResidue, SourceError>),
}

/// A write against a single entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Create {
        week_id: WeekId,
        draft: EntryDraft,
    },
    Update {
        id: EntryId,
        week_id: WeekId,
        draft: EntryDraft,
    },
    Delete {
        kind: EntryKind,
        id: EntryId,
        week_id: WeekId,
    },
}

impl Mutation {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Create { draft, .. } | Self::Update { draft, .. } => draft.kind,
            Self::Delete { kind, .. } => *kind,
        }
    }

    pub fn week_id(&self) -> WeekId {
        match self {
            Self::Create { week_id, .. }
            | Self::Update { week_id, .. }
            | Self::Delete { week_id, .. } => *week_id,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "add",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Runs one read against `source`.
pub async fn dispatch<S: LedgerSource>(source: &S, fetch: Fetch) -> Outcome {
    tracing::debug!(?fetch, "fetch issued");
    match fetch {
        Fetch::Months => Outcome::Months(source.list_months().await),
        Fetch::Weeks(ticket) => Outcome::Weeks(ticket, source.list_weeks(ticket.key).await),
        Fetch::Entries(kind, ticket) => {
            Outcome::Entries(kind, ticket, source.list_entries(kind, ticket.key).await)
        }
        Fetch::WeeklySummary(ticket) => {
            Outcome::WeeklySummary(ticket, source.weekly_summary(ticket.key).await)
        }
        Fetch::MonthlyResidue(ticket) => {
            Outcome::MonthlyResidue(ticket, source.monthly_residue(ticket.key).await)
        }
    }
}

/// Runs one write against `source`.
pub async fn perform<S: LedgerSource>(
    source: &S,
    mutation: &Mutation,
) -> Result<(), SourceError> {
    match mutation {
        Mutation::Create { week_id, draft } => {
            let receipt = source.create_entry(*week_id, draft).await?;
            tracing::info!(
                kind = %receipt.kind,
                week_id = %receipt.week_id,
                amount = %receipt.amount,
                "entry created"
            );
        }
        Mutation::Update { id, week_id, draft } => {
            source.update_entry(*id, *week_id, draft).await?;
            tracing::info!(kind = %draft.kind, %id, "entry updated");
        }
        Mutation::Delete { kind, id, .. } => {
            source.delete_entry(*kind, *id).await?;
            tracing::info!(%kind, %id, "entry deleted");
        }
    }
    Ok(())
}
