//! Budget ledger core: aggregation, the mutation epoch and the month/week
//! selection, wired together by [`Session`].
//!
//! The crate does no I/O of its own. Reads and writes go through a
//! [`LedgerSource`] supplied by the caller.

pub use aggregator::{DataWarning, SummaryReport, compute_weekly_residue, compute_weekly_summary};
pub use coordinator::{Coordinator, Epoch};
pub use draft::EntryDraft;
pub use error::{EngineError, SourceError, ValidationError};
pub use guard::{StaleGuard, Ticket};
pub use model::{
    EntryId, EntryKind, LedgerEntry, Month, MonthId, MonthlyResidue, Week, WeekId, WeeklySummary,
};
pub use money::{PLACEHOLDER, format_currency, parse_amount};
pub use selection::{Selection, SelectionState};
pub use session::{EntryListView, Session};
pub use source::{EntryReceipt, Fetch, LedgerSource, Mutation, Outcome, dispatch, perform};
pub use view::{AggregateView, Applied, ViewState};

mod aggregator;
mod coordinator;
mod draft;
mod error;
mod guard;
mod model;
mod money;
mod selection;
mod session;
mod source;
mod view;
