use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

use engine::{
    EntryDraft, EntryId, EntryKind, EntryReceipt, Epoch, Fetch, LedgerEntry, LedgerSource, Month,
    MonthId, MonthlyResidue, Mutation, Outcome, SelectionState, Session, SourceError, Ticket,
    ViewState, Week, WeekId, WeeklySummary, compute_weekly_residue, compute_weekly_summary,
    dispatch, perform,
};

#[derive(Default)]
struct Store {
    months: Vec<Month>,
    weeks: Vec<Week>,
    entries: Vec<LedgerEntry>,
    next_id: i64,
}

/// In-memory ledger with switchable failures and one-shot delays.
#[derive(Default)]
struct FakeLedger {
    store: Mutex<Store>,
    slow_summary: Mutex<Option<Duration>>,
    slow_weeks: Mutex<Option<(MonthId, Duration)>>,
    slow_write: Mutex<Option<Duration>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl FakeLedger {
    async fn read_check(&self) -> Result<(), SourceError> {
        if *self.fail_reads.lock().await {
            return Err(SourceError::Status {
                status: 500,
                message: "read failed".to_string(),
            });
        }
        Ok(())
    }

    async fn write_check(&self) -> Result<(), SourceError> {
        if *self.fail_writes.lock().await {
            return Err(SourceError::Transport("connection reset".to_string()));
        }
        let delay = self.slow_write.lock().await.take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn summary_of(store: &Store, week_id: WeekId) -> WeeklySummary {
        let entries: Vec<_> = store
            .entries
            .iter()
            .filter(|entry| entry.week_id == week_id)
            .cloned()
            .collect();
        compute_weekly_summary(week_id, &entries).summary
    }
}

impl LedgerSource for FakeLedger {
    async fn list_months(&self) -> Result<Vec<Month>, SourceError> {
        self.read_check().await?;
        Ok(self.store.lock().await.months.clone())
    }

    async fn list_weeks(&self, month_id: MonthId) -> Result<Vec<Week>, SourceError> {
        self.read_check().await?;
        let weeks: Vec<_> = {
            let store = self.store.lock().await;
            store
                .weeks
                .iter()
                .filter(|week| week.month_id == month_id)
                .cloned()
                .collect()
        };
        let delay = {
            let mut slow = self.slow_weeks.lock().await;
            match *slow {
                Some((slow_month, delay)) if slow_month == month_id => {
                    *slow = None;
                    Some(delay)
                }
                _ => None,
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(weeks)
    }

    async fn list_entries(
        &self,
        kind: EntryKind,
        week_id: WeekId,
    ) -> Result<Vec<LedgerEntry>, SourceError> {
        self.read_check().await?;
        let store = self.store.lock().await;
        Ok(store
            .entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.week_id == week_id)
            .cloned()
            .collect())
    }

    async fn create_entry(
        &self,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> Result<EntryReceipt, SourceError> {
        self.write_check().await?;
        let mut store = self.store.lock().await;
        store.next_id += 1;
        let id = EntryId(store.next_id);
        store.entries.push(LedgerEntry {
            id,
            kind: draft.kind,
            week_id,
            amount: Some(draft.amount),
            description: draft.description.clone(),
        });
        Ok(EntryReceipt {
            id: Some(id),
            kind: draft.kind,
            week_id,
            amount: draft.amount,
            description: draft.description.clone(),
        })
    }

    async fn update_entry(
        &self,
        id: EntryId,
        week_id: WeekId,
        draft: &EntryDraft,
    ) -> Result<(), SourceError> {
        self.write_check().await?;
        let mut store = self.store.lock().await;
        let entry = store
            .entries
            .iter_mut()
            .find(|entry| entry.id == id && entry.kind == draft.kind && entry.week_id == week_id)
            .ok_or(SourceError::Status {
                status: 404,
                message: "entry not found".to_string(),
            })?;
        entry.amount = Some(draft.amount);
        entry.description = draft.description.clone();
        Ok(())
    }

    async fn delete_entry(&self, kind: EntryKind, id: EntryId) -> Result<(), SourceError> {
        self.write_check().await?;
        let mut store = self.store.lock().await;
        store
            .entries
            .retain(|entry| !(entry.kind == kind && entry.id == id));
        Ok(())
    }

    async fn weekly_summary(&self, week_id: WeekId) -> Result<WeeklySummary, SourceError> {
        self.read_check().await?;
        let snapshot = Self::summary_of(&*self.store.lock().await, week_id);
        let delay = self.slow_summary.lock().await.take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn monthly_residue(&self, month_id: MonthId) -> Result<MonthlyResidue, SourceError> {
        self.read_check().await?;
        let store = self.store.lock().await;
        let total = store
            .weeks
            .iter()
            .filter(|week| week.month_id == month_id)
            .map(|week| compute_weekly_residue(&Self::summary_of(&store, week.id)))
            .sum();
        Ok(MonthlyResidue {
            month_id,
            monthly_residue: Some(total),
            daily_spending_limit: None,
        })
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 17).unwrap()
}

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn dec(text: &str) -> Decimal {
    text.parse().unwrap()
}

fn entry(id: i64, kind: EntryKind, amount: &str) -> LedgerEntry {
    LedgerEntry {
        id: EntryId(id),
        kind,
        week_id: WeekId(92),
        amount: Some(dec(amount)),
        description: kind.requires_description().then(|| format!("entry {id}")),
    }
}

/// August and September with four weeks each, October without weeks.
/// Week 92 (16-22 Sep) holds 1000 income, 200 general and 100 personal.
fn seeded() -> Arc<FakeLedger> {
    let months = [(8, "August"), (9, "September"), (10, "October")]
        .into_iter()
        .map(|(ordinal, name)| Month {
            id: MonthId(i64::from(ordinal)),
            name: name.to_string(),
            ordinal,
        })
        .collect();
    let weeks = [8u32, 9]
        .into_iter()
        .flat_map(|month| {
            (0..4u32).map(move |i| Week {
                id: WeekId(i64::from(month * 10 + i)),
                ordinal: i + 1,
                start_date: day(month, 2 + 7 * i),
                end_date: day(month, 8 + 7 * i),
                month_id: MonthId(i64::from(month)),
            })
        })
        .collect();
    let entries = vec![
        entry(1, EntryKind::Income, "1000"),
        entry(2, EntryKind::GeneralExpense, "200"),
        entry(3, EntryKind::PersonalExpense, "100"),
    ];

    Arc::new(FakeLedger {
        store: Mutex::new(Store {
            months,
            weeks,
            entries,
            next_id: 3,
        }),
        ..FakeLedger::default()
    })
}

/// Runs fetches concurrently and feeds answers to the session in arrival
/// order, the way the terminal client does.
struct Harness {
    session: Session,
    source: Arc<FakeLedger>,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
    pending: usize,
}

impl Harness {
    fn new(source: Arc<FakeLedger>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            source,
            tx,
            rx,
            pending: 0,
        }
    }

    async fn loaded(source: Arc<FakeLedger>) -> Self {
        let mut harness = Self::new(source);
        let fetches = harness.session.start();
        harness.issue(fetches);
        harness.drain().await;
        harness
    }

    fn issue(&mut self, fetches: Vec<Fetch>) {
        for fetch in fetches {
            let source = Arc::clone(&self.source);
            let tx = self.tx.clone();
            self.pending += 1;
            tokio::spawn(async move {
                let _ = tx.send(dispatch(source.as_ref(), fetch).await);
            });
        }
    }

    async fn drain(&mut self) {
        while self.pending > 0 {
            let outcome = self.rx.recv().await.unwrap();
            self.pending -= 1;
            let follow_up = self.session.apply(outcome, today());
            self.issue(follow_up);
        }
    }

    async fn mutate(&mut self, mutation: Mutation) {
        match perform(self.source.as_ref(), &mutation).await {
            Ok(()) => {
                let fetches = self.session.mutation_succeeded(&mutation);
                self.issue(fetches);
            }
            Err(err) => self.session.mutation_failed(&mutation, &err),
        }
    }

    /// Starts a write without waiting for it, so the selection can move
    /// before the acknowledgement arrives.
    fn mutate_later(
        &self,
        mutation: Mutation,
    ) -> JoinHandle<(Mutation, Result<(), SourceError>)> {
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            let result = perform(source.as_ref(), &mutation).await;
            (mutation, result)
        })
    }

    fn summary(&self) -> WeeklySummary {
        *self.session.weekly_summary().value().unwrap()
    }
}

fn add_general(amount: &str) -> Mutation {
    Mutation::Create {
        week_id: WeekId(92),
        draft: EntryDraft::new(EntryKind::GeneralExpense, amount, "groceries").unwrap(),
    }
}

#[tokio::test]
async fn dashboard_loads_current_week() {
    let harness = Harness::loaded(seeded()).await;
    let session = &harness.session;

    assert_eq!(session.current_month().map(|m| m.name.as_str()), Some("September"));
    assert_eq!(session.selection().week_id(), Some(WeekId(92)));
    assert_eq!(harness.summary().income_sum, dec("1000"));
    assert_eq!(session.weekly_residue(), Some(dec("700")));
    assert_eq!(
        session.local_summary().map(|report| report.summary),
        Some(harness.summary())
    );
    assert_eq!(
        session.monthly_residue().value().and_then(|r| r.monthly_residue),
        Some(dec("700"))
    );
    assert_eq!(session.epoch(), Epoch(0));
}

#[tokio::test]
async fn added_expense_shows_up_in_every_total() {
    let mut harness = Harness::loaded(seeded()).await;
    harness.mutate(add_general("500")).await;
    harness.drain().await;

    let summary = harness.summary();
    assert_eq!(summary.income_sum, dec("1000"));
    assert_eq!(summary.general_expenses_sum, dec("700"));
    assert_eq!(summary.personal_expenses_sum, dec("100"));
    assert_eq!(harness.session.weekly_residue(), Some(dec("200")));
    assert_eq!(
        harness
            .session
            .entries(EntryKind::GeneralExpense)
            .value()
            .map(Vec::len),
        Some(2)
    );
    assert_eq!(harness.session.epoch(), Epoch(1));
}

#[tokio::test]
async fn slow_summary_from_before_mutation_is_discarded() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    *source.slow_summary.lock().await = Some(Duration::from_millis(150));
    let fetches = harness.session.refresh();
    harness.issue(fetches);
    // let the slow summary take its snapshot before the write lands
    tokio::time::sleep(Duration::from_millis(20)).await;

    harness.mutate(add_general("500")).await;
    harness.drain().await;

    assert_eq!(harness.summary().general_expenses_sum, dec("700"));
    assert_eq!(harness.session.weekly_residue(), Some(dec("200")));
    assert!(!harness.session.weekly_summary().is_loading());
}

#[tokio::test]
async fn epoch_counts_only_acknowledged_mutations() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    harness.mutate(add_general("50")).await;
    harness.drain().await;
    let created = harness
        .session
        .entries(EntryKind::GeneralExpense)
        .value()
        .and_then(|entries| entries.iter().find(|entry| entry.amount == Some(dec("50"))))
        .map(|entry| entry.id)
        .unwrap();

    harness
        .mutate(Mutation::Update {
            id: created,
            week_id: WeekId(92),
            draft: EntryDraft::new(EntryKind::GeneralExpense, "80,5", "rent").unwrap(),
        })
        .await;
    harness.drain().await;
    assert_eq!(harness.summary().general_expenses_sum, dec("280.5"));

    *source.fail_writes.lock().await = true;
    harness
        .mutate(Mutation::Delete {
            kind: EntryKind::GeneralExpense,
            id: created,
            week_id: WeekId(92),
        })
        .await;
    harness.drain().await;
    assert_eq!(harness.session.epoch(), Epoch(2));
    assert!(harness.session.mutation_error().is_some());
    assert_eq!(harness.summary().general_expenses_sum, dec("280.5"));

    *source.fail_writes.lock().await = false;
    harness
        .mutate(Mutation::Delete {
            kind: EntryKind::GeneralExpense,
            id: created,
            week_id: WeekId(92),
        })
        .await;
    harness.drain().await;
    assert_eq!(harness.session.epoch(), Epoch(3));
    assert_eq!(harness.session.mutation_error(), None);
    assert_eq!(harness.summary().general_expenses_sum, dec("200"));
}

#[tokio::test]
async fn late_week_list_of_previous_month_is_discarded() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    *source.slow_weeks.lock().await = Some((MonthId(8), Duration::from_millis(100)));
    let fetches = harness.session.step_month(-1);
    harness.issue(fetches);
    let fetches = harness.session.step_month(1);
    harness.issue(fetches);
    harness.drain().await;

    let selection = harness.session.selection();
    assert_eq!(selection.month_id(), Some(MonthId(9)));
    assert!(
        selection
            .weeks()
            .iter()
            .all(|week| week.month_id == MonthId(9))
    );
    assert_eq!(selection.week_id(), Some(WeekId(92)));
    assert_eq!(harness.summary().week_id, WeekId(92));
}

#[tokio::test]
async fn month_without_weeks_shows_no_data() {
    let mut harness = Harness::loaded(seeded()).await;
    let fetches = harness.session.step_month(1);
    harness.issue(fetches);
    harness.drain().await;

    assert!(matches!(
        harness.session.selection().state(),
        SelectionState::WeekListLoaded { weeks, .. } if weeks.is_empty()
    ));
    assert_eq!(harness.session.weekly_summary(), &ViewState::NoData);
    assert_eq!(harness.session.monthly_residue(), &ViewState::NoData);
    for kind in EntryKind::ALL {
        assert_eq!(harness.session.entries(kind), &ViewState::NoData);
    }
    assert_eq!(harness.session.weekly_residue(), None);
}

#[tokio::test]
async fn read_failure_keeps_last_good_values() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    *source.fail_reads.lock().await = true;
    let fetches = harness.session.refresh();
    harness.issue(fetches);
    harness.drain().await;

    let summary = harness.session.weekly_summary();
    assert_eq!(summary.value().map(|s| s.income_sum), Some(dec("1000")));
    assert!(summary.error().is_some());
    assert!(
        harness
            .session
            .entries(EntryKind::Income)
            .error()
            .is_some()
    );

    *source.fail_reads.lock().await = false;
    let fetches = harness.session.refresh();
    harness.issue(fetches);
    harness.drain().await;
    assert_eq!(harness.session.weekly_summary().error(), None);
}

#[tokio::test]
async fn unreachable_server_fails_month_list() {
    let source = seeded();
    *source.fail_reads.lock().await = true;
    let harness = Harness::loaded(source).await;

    assert!(matches!(harness.session.months(), ViewState::Failed(_)));
    assert_eq!(
        harness.session.selection().state(),
        &SelectionState::NoMonthSelected
    );
}

#[tokio::test]
async fn failed_refetch_after_write_keeps_epoch_until_next_write() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    *source.fail_reads.lock().await = true;
    harness.mutate(add_general("500")).await;
    harness.drain().await;

    assert_eq!(harness.session.epoch(), Epoch(1));
    let summary = harness.session.weekly_summary();
    assert!(summary.error().is_some());
    assert_eq!(summary.value().map(|s| s.general_expenses_sum), Some(dec("200")));
    assert!(!summary.is_loading());

    *source.fail_reads.lock().await = false;
    harness.mutate(add_general("25")).await;
    harness.drain().await;

    assert_eq!(harness.session.epoch(), Epoch(2));
    assert_eq!(harness.session.weekly_summary().error(), None);
    assert_eq!(harness.summary().general_expenses_sum, dec("725"));
    assert_eq!(
        harness.session.monthly_residue().value().and_then(|r| r.monthly_residue),
        Some(dec("175"))
    );
}

#[tokio::test]
async fn write_acknowledged_after_week_change_refreshes_current_week() {
    let source = seeded();
    let mut harness = Harness::loaded(Arc::clone(&source)).await;

    *source.slow_write.lock().await = Some(Duration::from_millis(100));
    let write = harness.mutate_later(add_general("500"));

    let fetches = harness.session.step_week(-1);
    harness.issue(fetches);
    harness.drain().await;
    assert_eq!(harness.session.selection().week_id(), Some(WeekId(91)));

    let (mutation, result) = write.await.unwrap();
    result.unwrap();
    let fetches = harness.session.mutation_succeeded(&mutation);
    let version = Epoch(1).value();
    assert_eq!(
        fetches,
        vec![
            Fetch::Entries(
                EntryKind::GeneralExpense,
                Ticket {
                    key: WeekId(91),
                    version
                }
            ),
            Fetch::WeeklySummary(Ticket {
                key: WeekId(91),
                version
            }),
            Fetch::MonthlyResidue(Ticket {
                key: MonthId(9),
                version
            }),
        ]
    );
    harness.issue(fetches);
    harness.drain().await;
    assert_eq!(harness.summary().general_expenses_sum, Decimal::ZERO);

    let fetches = harness.session.step_week(1);
    harness.issue(fetches);
    harness.drain().await;
    assert_eq!(harness.session.selection().week_id(), Some(WeekId(92)));
    assert_eq!(harness.summary().general_expenses_sum, dec("700"));
}
