//! Month/week selection as an explicit state machine.
//!
//! ```text
//! NoMonthSelected -> MonthSelected -> WeekListLoading -> WeekListLoaded -> WeekSelected
//!                                                     \-> WeekListFailed
//! ```
//!
//! Dependents read the current snapshot and poll [`Selection::revision`] to
//! notice changes; only the owner drives transitions.
use chrono::NaiveDate;

use crate::{
    MonthId, SourceError, Week, WeekId,
    guard::{StaleGuard, Ticket},
    view::Applied,
};

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionState {
    NoMonthSelected,
    MonthSelected {
        month_id: MonthId,
    },
    WeekListLoading {
        month_id: MonthId,
    },
    /// Week list arrived but no week is selected. Only reachable with an
    /// empty list.
    WeekListLoaded {
        month_id: MonthId,
        weeks: Vec<Week>,
    },
    WeekListFailed {
        month_id: MonthId,
        error: String,
    },
    WeekSelected {
        month_id: MonthId,
        weeks: Vec<Week>,
        week_id: WeekId,
    },
}

#[derive(Debug)]
pub struct Selection {
    state: SelectionState,
    guard: StaleGuard<MonthId>,
    generation: u64,
    revision: u64,
    remembered_week: Option<WeekId>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            state: SelectionState::NoMonthSelected,
            guard: StaleGuard::new(),
            generation: 0,
            revision: 0,
            remembered_week: None,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Incremented on every transition. Dependents compare it with the value
    /// they last saw to notice a change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn month_id(&self) -> Option<MonthId> {
        match &self.state {
            SelectionState::NoMonthSelected => None,
            SelectionState::MonthSelected { month_id }
            | SelectionState::WeekListLoading { month_id }
            | SelectionState::WeekListLoaded { month_id, .. }
            | SelectionState::WeekListFailed { month_id, .. }
            | SelectionState::WeekSelected { month_id, .. } => Some(*month_id),
        }
    }

    pub fn week_id(&self) -> Option<WeekId> {
        match &self.state {
            SelectionState::WeekSelected { week_id, .. } => Some(*week_id),
            _ => None,
        }
    }

    pub fn weeks(&self) -> &[Week] {
        match &self.state {
            SelectionState::WeekListLoaded { weeks, .. }
            | SelectionState::WeekSelected { weeks, .. } => weeks,
            _ => &[],
        }
    }

    pub fn week(&self) -> Option<&Week> {
        let week_id = self.week_id()?;
        self.weeks().iter().find(|week| week.id == week_id)
    }

    pub fn is_loading_weeks(&self) -> bool {
        matches!(
            self.state,
            SelectionState::MonthSelected { .. } | SelectionState::WeekListLoading { .. }
        )
    }

    fn transition(&mut self, state: SelectionState) {
        self.state = state;
        self.revision += 1;
    }

    /// Clears the week and everything scoped to it, then requests the week
    /// list of `month_id`.
    pub fn select_month(&mut self, month_id: MonthId) -> Ticket<MonthId> {
        if let Some(week_id) = self.week_id() {
            self.remembered_week = Some(week_id);
        }
        tracing::info!(%month_id, "month selected");
        self.transition(SelectionState::MonthSelected { month_id });
        self.request_weeks_for(month_id)
    }

    /// Requests the week list of the current month again. The selected week
    /// survives if it is still in the new list.
    pub fn reload_weeks(&mut self) -> Option<Ticket<MonthId>> {
        let month_id = self.month_id()?;
        if let Some(week_id) = self.week_id() {
            self.remembered_week = Some(week_id);
        }
        Some(self.request_weeks_for(month_id))
    }

    fn request_weeks_for(&mut self, month_id: MonthId) -> Ticket<MonthId> {
        self.generation += 1;
        self.guard.retarget(Some(month_id), self.generation);
        self.transition(SelectionState::WeekListLoading { month_id });
        Ticket {
            key: month_id,
            version: self.generation,
        }
    }

    /// Applies a week-list response unless it targets a month that is no
    /// longer selected, or an older request than one already applied.
    ///
    /// On success a week is picked: the previously selected one if still
    /// listed, else the one containing `today`, else the last one. An empty
    /// list selects nothing.
    pub fn apply_weeks(
        &mut self,
        ticket: Ticket<MonthId>,
        result: Result<Vec<Week>, SourceError>,
        today: NaiveDate,
    ) -> Applied {
        if !self.guard.admit(&ticket) {
            tracing::debug!(month_id = %ticket.key, generation = ticket.version, "stale week list discarded");
            return Applied::Discarded;
        }
        let month_id = ticket.key;
        let remembered = self.remembered_week.take();

        let weeks = match result {
            Ok(weeks) => weeks,
            Err(err) => {
                tracing::error!(%month_id, "week list failed: {err}");
                self.transition(SelectionState::WeekListFailed {
                    month_id,
                    error: err.to_string(),
                });
                return Applied::Applied;
            }
        };

        let picked = remembered
            .filter(|id| weeks.iter().any(|week| week.id == *id))
            .or_else(|| weeks.iter().find(|week| week.contains(today)).map(|week| week.id))
            .or_else(|| weeks.last().map(|week| week.id));

        match picked {
            Some(week_id) => {
                tracing::info!(%month_id, %week_id, "week selected");
                self.transition(SelectionState::WeekSelected {
                    month_id,
                    weeks,
                    week_id,
                });
            }
            None => {
                tracing::info!(%month_id, "month has no weeks");
                self.transition(SelectionState::WeekListLoaded { month_id, weeks });
            }
        }
        Applied::Applied
    }

    /// Selects a week of the loaded list. Returns `true` if the selection
    /// changed.
    pub fn select_week(&mut self, week_id: WeekId) -> bool {
        if self.week_id() == Some(week_id) {
            return false;
        }
        let (month_id, weeks) = match &self.state {
            SelectionState::WeekListLoaded { month_id, weeks }
            | SelectionState::WeekSelected {
                month_id, weeks, ..
            } if weeks.iter().any(|week| week.id == week_id) => (*month_id, weeks.clone()),
            _ => return false,
        };
        tracing::info!(%month_id, %week_id, "week selected");
        self.transition(SelectionState::WeekSelected {
            month_id,
            weeks,
            week_id,
        });
        true
    }

    /// Moves the week selection by `delta` positions, clamped to the list.
    pub fn step_week(&mut self, delta: isize) -> bool {
        let weeks = self.weeks();
        let Some(current) = self
            .week_id()
            .and_then(|id| weeks.iter().position(|week| week.id == id))
        else {
            return false;
        };
        let target = current
            .saturating_add_signed(delta)
            .min(weeks.len().saturating_sub(1));
        let target_id = weeks[target].id;
        self.select_week(target_id)
    }

    /// Back to [`SelectionState::NoMonthSelected`].
    pub fn reset(&mut self) {
        self.guard.retarget(None, self.generation);
        self.remembered_week = None;
        self.transition(SelectionState::NoMonthSelected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn weeks(month: i64) -> Vec<Week> {
        (0..4)
            .map(|i| Week {
                id: WeekId(month * 10 + i),
                ordinal: i as u32 + 1,
                start_date: date(2 + 7 * i as u32),
                end_date: date(8 + 7 * i as u32),
                month_id: MonthId(month),
            })
            .collect()
    }

    #[test]
    fn selecting_a_month_starts_loading() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        assert_eq!(ticket.key, MonthId(9));
        assert_eq!(
            selection.state(),
            &SelectionState::WeekListLoading { month_id: MonthId(9) }
        );
        assert!(selection.is_loading_weeks());
        assert_eq!(selection.week_id(), None);
    }

    #[test]
    fn picks_week_containing_today() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        assert_eq!(selection.week_id(), Some(WeekId(92)));
    }

    #[test]
    fn falls_back_to_last_week() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(30));
        assert_eq!(selection.week_id(), Some(WeekId(93)));
    }

    #[test]
    fn empty_list_selects_nothing() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(Vec::new()), date(17));
        assert_eq!(
            selection.state(),
            &SelectionState::WeekListLoaded {
                month_id: MonthId(9),
                weeks: Vec::new()
            }
        );
        assert!(!selection.is_loading_weeks());
    }

    #[test]
    fn reload_keeps_selected_week() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        assert!(selection.select_week(WeekId(90)));

        let ticket = selection.reload_weeks().unwrap();
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        assert_eq!(selection.week_id(), Some(WeekId(90)));
    }

    #[test]
    fn month_change_ignores_old_week() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        selection.select_week(WeekId(90));

        let ticket = selection.select_month(MonthId(10));
        selection.apply_weeks(ticket, Ok(weeks(10)), date(30));
        assert_eq!(selection.week_id(), Some(WeekId(103)));
    }

    #[test]
    fn late_week_list_of_previous_month_is_discarded() {
        let mut selection = Selection::new();
        let m1 = selection.select_month(MonthId(1));
        let m2 = selection.select_month(MonthId(2));

        assert_eq!(selection.apply_weeks(m2, Ok(weeks(2)), date(17)), Applied::Applied);
        assert_eq!(selection.apply_weeks(m1, Ok(weeks(1)), date(17)), Applied::Discarded);
        assert_eq!(selection.month_id(), Some(MonthId(2)));
        assert!(selection.weeks().iter().all(|week| week.month_id == MonthId(2)));
    }

    #[test]
    fn failure_is_terminal_not_loading() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Err(SourceError::Transport("down".to_string())), date(17));
        assert!(matches!(selection.state(), SelectionState::WeekListFailed { .. }));
        assert!(!selection.is_loading_weeks());
    }

    #[test]
    fn unknown_week_is_not_selectable() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        assert!(!selection.select_week(WeekId(12345)));
        assert_eq!(selection.week_id(), Some(WeekId(92)));
    }

    #[test]
    fn step_week_is_clamped() {
        let mut selection = Selection::new();
        let ticket = selection.select_month(MonthId(9));
        selection.apply_weeks(ticket, Ok(weeks(9)), date(30));
        assert!(!selection.step_week(1));
        assert!(selection.step_week(-1));
        assert_eq!(selection.week_id(), Some(WeekId(92)));
        assert!(selection.step_week(-10));
        assert_eq!(selection.week_id(), Some(WeekId(90)));
    }

    #[test]
    fn every_transition_bumps_revision() {
        let mut selection = Selection::new();
        let before = selection.revision();
        let ticket = selection.select_month(MonthId(9));
        let loading = selection.revision();
        assert!(loading > before);
        selection.apply_weeks(ticket, Ok(weeks(9)), date(17));
        assert!(selection.revision() > loading);
    }
}
