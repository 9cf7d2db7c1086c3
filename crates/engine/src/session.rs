//! The dashboard state: selection, epoch and every view derived from them.
//!
//! A [`Session`] never performs I/O. Its operations return the [`Fetch`]es the
//! caller has to run; the caller hands each answer back through
//! [`Session::apply`], in whatever order they arrive.
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::{
    EntryKind, LedgerEntry, Month, MonthId, MonthlyResidue, SourceError, WeekId, WeeklySummary,
    aggregator::{SummaryReport, compute_weekly_residue, compute_weekly_summary},
    coordinator::{Coordinator, Epoch},
    selection::{Selection, SelectionState},
    source::{Fetch, Mutation, Outcome},
    view::{AggregateView, Applied, ViewState},
};

pub type EntryListView = AggregateView<WeekId, Vec<LedgerEntry>>;

#[derive(Debug)]
pub struct Session {
    coordinator: Coordinator,
    selection: Selection,
    months: ViewState<Vec<Month>>,
    entries: [EntryListView; 3],
    weekly_summary: AggregateView<WeekId, WeeklySummary>,
    monthly_residue: AggregateView<MonthId, MonthlyResidue>,
    local_summary: Option<SummaryReport>,
    mutation_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            coordinator: Coordinator::new(),
            selection: Selection::new(),
            months: ViewState::NoData,
            entries: Default::default(),
            weekly_summary: AggregateView::new(),
            monthly_residue: AggregateView::new(),
            local_summary: None,
            mutation_error: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> Epoch {
        self.coordinator.current()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn months(&self) -> &ViewState<Vec<Month>> {
        &self.months
    }

    pub fn current_month(&self) -> Option<&Month> {
        let month_id = self.selection.month_id()?;
        self.months.value()?.iter().find(|month| month.id == month_id)
    }

    pub fn entries(&self, kind: EntryKind) -> &ViewState<Vec<LedgerEntry>> {
        self.entries[kind.index()].state()
    }

    pub fn weekly_summary(&self) -> &ViewState<WeeklySummary> {
        self.weekly_summary.state()
    }

    pub fn monthly_residue(&self) -> &ViewState<MonthlyResidue> {
        self.monthly_residue.state()
    }

    /// Totals computed from the three loaded entry lists of the selected week,
    /// once all of them have arrived.
    pub fn local_summary(&self) -> Option<&SummaryReport> {
        self.local_summary.as_ref()
    }

    /// Residue of the selected week, from the collaborator's summary.
    pub fn weekly_residue(&self) -> Option<Decimal> {
        self.weekly_summary.state().value().map(compute_weekly_residue)
    }

    /// `true` while the month list or the selected month's week list is still
    /// in flight. Views without data are pending then, not empty.
    pub fn awaiting_selection(&self) -> bool {
        self.months.is_loading() || self.selection.is_loading_weeks()
    }

    /// Message of the last failed mutation, until the next success or retry.
    pub fn mutation_error(&self) -> Option<&str> {
        self.mutation_error.as_deref()
    }

    pub fn start(&mut self) -> Vec<Fetch> {
        self.months = ViewState::Loading;
        vec![Fetch::Months]
    }

    pub fn select_month(&mut self, month_id: MonthId) -> Vec<Fetch> {
        let ticket = self.selection.select_month(month_id);
        let mut fetches = vec![Fetch::Weeks(ticket)];
        fetches.extend(self.sync());
        fetches
    }

    /// Moves to the previous/next month of the loaded month list.
    pub fn step_month(&mut self, delta: isize) -> Vec<Fetch> {
        let Some(months) = self.months.value() else {
            return Vec::new();
        };
        let Some(current) = self
            .selection
            .month_id()
            .and_then(|id| months.iter().position(|month| month.id == id))
        else {
            return Vec::new();
        };
        let target = current
            .saturating_add_signed(delta)
            .min(months.len().saturating_sub(1));
        if target == current {
            return Vec::new();
        }
        let month_id = months[target].id;
        self.select_month(month_id)
    }

    pub fn select_week(&mut self, week_id: WeekId) -> Vec<Fetch> {
        if !self.selection.select_week(week_id) {
            return Vec::new();
        }
        self.sync()
    }

    pub fn step_week(&mut self, delta: isize) -> Vec<Fetch> {
        if !self.selection.step_week(delta) {
            return Vec::new();
        }
        self.sync()
    }

    /// Feeds one response back. Stale responses are dropped silently.
    pub fn apply(&mut self, outcome: Outcome, today: NaiveDate) -> Vec<Fetch> {
        match outcome {
            Outcome::Months(result) => self.apply_months(result, today),
            Outcome::Weeks(ticket, result) => {
                match self.selection.apply_weeks(ticket, result, today) {
                    Applied::Applied => self.sync(),
                    Applied::Discarded => Vec::new(),
                }
            }
            Outcome::Entries(kind, ticket, result) => {
                if self.entries[kind.index()].apply(ticket, result) == Applied::Applied {
                    self.recompute_local_summary();
                }
                Vec::new()
            }
            Outcome::WeeklySummary(ticket, result) => {
                self.weekly_summary.apply(ticket, result);
                Vec::new()
            }
            Outcome::MonthlyResidue(ticket, result) => {
                self.monthly_residue.apply(ticket, result);
                Vec::new()
            }
        }
    }

    fn apply_months(
        &mut self,
        result: Result<Vec<Month>, SourceError>,
        today: NaiveDate,
    ) -> Vec<Fetch> {
        let months = match result {
            Ok(months) => months,
            Err(err) => {
                tracing::error!("month list failed: {err}");
                self.months = ViewState::Failed(err.to_string());
                return Vec::new();
            }
        };

        let current = self.selection.month_id();
        let initial = months
            .iter()
            .find(|month| month.ordinal == today.month())
            .or_else(|| months.first())
            .map(|month| month.id);
        let still_listed = current.is_some_and(|id| months.iter().any(|month| month.id == id));

        self.months = ViewState::Loaded {
            value: months,
            refreshing: false,
            error: None,
        };

        if still_listed {
            return Vec::new();
        }
        match initial {
            Some(month_id) => self.select_month(month_id),
            None => {
                self.selection.reset();
                self.sync()
            }
        }
    }

    /// Must be called once per acknowledged mutation. Bumps the epoch and
    /// refetches everything the mutation can have changed.
    pub fn mutation_succeeded(&mut self, mutation: &Mutation) -> Vec<Fetch> {
        let epoch = self.coordinator.record_mutation();
        tracing::info!(
            %epoch,
            kind = %mutation.kind(),
            week_id = %mutation.week_id(),
            verb = mutation.verb(),
            "mutation acknowledged"
        );
        self.mutation_error = None;

        let week_id = self.selection.week_id();
        let month_id = week_id.and(self.selection.month_id());
        let mut fetches = Vec::new();

        let list = &mut self.entries[mutation.kind().index()];
        if let Some(ticket) = list.invalidate(week_id, epoch.value()) {
            fetches.push(Fetch::Entries(mutation.kind(), ticket));
        }
        if let Some(ticket) = self.weekly_summary.invalidate(week_id, epoch.value()) {
            fetches.push(Fetch::WeeklySummary(ticket));
        }
        if let Some(ticket) = self.monthly_residue.invalidate(month_id, epoch.value()) {
            fetches.push(Fetch::MonthlyResidue(ticket));
        }
        self.recompute_local_summary();
        fetches
    }

    /// Records a failed mutation. The epoch does not move.
    pub fn mutation_failed(&mut self, mutation: &Mutation, err: &SourceError) {
        tracing::error!(kind = %mutation.kind(), verb = mutation.verb(), "mutation failed: {err}");
        self.mutation_error = Some(format!(
            "Could not {} {} entry: {err}",
            mutation.verb(),
            mutation.kind().label().to_lowercase()
        ));
    }

    /// Manual retry: refetches whatever is missing or failed at the current
    /// epoch.
    pub fn refresh(&mut self) -> Vec<Fetch> {
        self.mutation_error = None;
        if !matches!(self.months, ViewState::Loaded { .. }) {
            return self.start();
        }
        if matches!(self.selection.state(), SelectionState::WeekListFailed { .. }) {
            return self.selection.reload_weeks().map(Fetch::Weeks).into_iter().collect();
        }
        self.invalidate_all()
    }

    /// Brings every view's key in line with the selection, fetching the ones
    /// whose key changed.
    fn sync(&mut self) -> Vec<Fetch> {
        let week_id = self.selection.week_id();
        let month_id = week_id.and(self.selection.month_id());
        let version = self.epoch().value();
        let mut fetches = Vec::new();

        for kind in EntryKind::ALL {
            let view = &mut self.entries[kind.index()];
            if view.key() != week_id {
                if let Some(ticket) = view.invalidate(week_id, version) {
                    fetches.push(Fetch::Entries(kind, ticket));
                }
            }
        }
        if self.weekly_summary.key() != week_id {
            if let Some(ticket) = self.weekly_summary.invalidate(week_id, version) {
                fetches.push(Fetch::WeeklySummary(ticket));
            }
        }
        if self.monthly_residue.key() != month_id {
            if let Some(ticket) = self.monthly_residue.invalidate(month_id, version) {
                fetches.push(Fetch::MonthlyResidue(ticket));
            }
        }
        self.recompute_local_summary();
        fetches
    }

    fn invalidate_all(&mut self) -> Vec<Fetch> {
        let week_id = self.selection.week_id();
        let month_id = week_id.and(self.selection.month_id());
        let version = self.epoch().value();
        let mut fetches = Vec::new();

        for kind in EntryKind::ALL {
            if let Some(ticket) = self.entries[kind.index()].invalidate(week_id, version) {
                fetches.push(Fetch::Entries(kind, ticket));
            }
        }
        if let Some(ticket) = self.weekly_summary.invalidate(week_id, version) {
            fetches.push(Fetch::WeeklySummary(ticket));
        }
        if let Some(ticket) = self.monthly_residue.invalidate(month_id, version) {
            fetches.push(Fetch::MonthlyResidue(ticket));
        }
        self.recompute_local_summary();
        fetches
    }

    fn recompute_local_summary(&mut self) {
        let Some(week_id) = self.selection.week_id() else {
            self.local_summary = None;
            return;
        };
        let mut all = Vec::new();
        for view in &self.entries {
            match view.state().value() {
                Some(entries) if view.key() == Some(week_id) => all.extend_from_slice(entries),
                _ => {
                    self.local_summary = None;
                    return;
                }
            }
        }
        self.local_summary = Some(compute_weekly_summary(week_id, &all));
    }
}
