use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::{
    EngineError, EntryDraft, EntryId, EntryKind, Fetch, LedgerEntry, Mutation, Outcome, Session,
    SourceError, WeekId, dispatch, perform,
};
use tokio::sync::mpsc;

use crate::{
    client::Client,
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

const TOAST_TTL: Duration = Duration::from_secs(4);

/// Answers coming back from spawned tasks.
#[derive(Debug)]
pub enum AppEvent {
    Fetched(Outcome),
    Mutated(Mutation, std::result::Result<(), SourceError>),
    DbStatus(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub shown_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Amount,
    Description,
}

#[derive(Debug, Clone)]
pub struct EntryForm {
    pub kind: EntryKind,
    /// `Some` when editing an existing entry.
    pub editing: Option<EntryId>,
    pub amount: String,
    pub description: String,
    pub focus: FormField,
    pub message: Option<String>,
}

impl EntryForm {
    fn add(kind: EntryKind) -> Self {
        Self {
            kind,
            editing: None,
            amount: String::new(),
            description: String::new(),
            focus: FormField::Amount,
            message: None,
        }
    }

    fn edit(entry: &LedgerEntry) -> Self {
        let amount = entry
            .amount
            .map(|amount| format!("{:.2}", amount.round_dp(2)))
            .unwrap_or_default();
        Self {
            kind: entry.kind,
            editing: Some(entry.id),
            amount,
            description: entry.description.clone().unwrap_or_default(),
            focus: FormField::Amount,
            message: None,
        }
    }

    pub fn title(&self) -> String {
        let verb = if self.editing.is_some() { "Edit" } else { "Add" };
        format!("{verb} {}", self.kind.label().to_lowercase())
    }

    /// Validates the input. Nothing leaves the form unless this succeeds.
    fn to_mutation(&self, week_id: WeekId) -> Result<Mutation> {
        let draft = EntryDraft::new(self.kind, &self.amount, &self.description)
            .map_err(EngineError::from)?;
        Ok(match self.editing {
            Some(id) => Mutation::Update { id, week_id, draft },
            None => Mutation::Create { week_id, draft },
        })
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Amount => &mut self.amount,
            FormField::Description => &mut self.description,
        }
    }

    fn next_field(&mut self) {
        if !self.kind.requires_description() {
            return;
        }
        self.focus = match self.focus {
            FormField::Amount => FormField::Description,
            FormField::Description => FormField::Amount,
        };
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    Form(EntryForm),
    ConfirmDelete(LedgerEntry),
}

#[derive(Debug)]
pub struct AppState {
    pub session: Session,
    /// List the cursor keys act on.
    pub focus: EntryKind,
    pub cursors: [usize; 3],
    pub mode: Mode,
    pub db_connected: Option<bool>,
    pub toast: Option<ToastState>,
    pub pending_writes: usize,
    pub base_url: String,
    pub today: NaiveDate,
    /// Selection revision the cursors were last positioned for.
    seen_revision: u64,
}

impl AppState {
    pub fn new(base_url: String, today: NaiveDate) -> Self {
        Self {
            session: Session::new(),
            focus: EntryKind::Income,
            cursors: [0; 3],
            mode: Mode::Browse,
            db_connected: None,
            toast: None,
            pending_writes: 0,
            base_url,
            today,
            seen_revision: 0,
        }
    }

    pub fn cursor(&self, kind: EntryKind) -> usize {
        self.cursors[kind_slot(kind)]
    }

    /// Entry under the cursor of the focused list.
    pub fn selected_entry(&self) -> Option<&LedgerEntry> {
        self.session
            .entries(self.focus)
            .value()?
            .get(self.cursor(self.focus))
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self
            .session
            .entries(self.focus)
            .value()
            .map_or(0, Vec::len);
        let slot = &mut self.cursors[kind_slot(self.focus)];
        *slot = slot
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
    }

    /// Puts every cursor back at the top once the month or week changed.
    fn follow_selection(&mut self) {
        let revision = self.session.selection().revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.cursors = [0; 3];
        }
    }

    fn clamp_cursors(&mut self) {
        for kind in EntryKind::ALL {
            let len = self.session.entries(kind).value().map_or(0, Vec::len);
            let slot = &mut self.cursors[kind_slot(kind)];
            *slot = (*slot).min(len.saturating_sub(1));
        }
    }

    fn toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }
}

fn kind_slot(kind: EntryKind) -> usize {
    match kind {
        EntryKind::Income => 0,
        EntryKind::GeneralExpense => 1,
        EntryKind::PersonalExpense => 2,
    }
}

fn next_kind(kind: EntryKind) -> EntryKind {
    match kind {
        EntryKind::Income => EntryKind::GeneralExpense,
        EntryKind::GeneralExpense => EntryKind::PersonalExpense,
        EntryKind::PersonalExpense => EntryKind::Income,
    }
}

pub struct App {
    config: AppConfig,
    client: Arc<Client>,
    timezone: Tz,
    pub state: AppState,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let timezone = config.tz()?;
        let client = Arc::new(Client::new(&config.base_url, timezone)?);
        let (tx, rx) = mpsc::unbounded_channel();
        let today = Utc::now().with_timezone(&timezone).date_naive();
        let state = AppState::new(config.base_url.clone(), today);

        Ok(Self {
            config,
            client,
            timezone,
            state,
            tx,
            rx,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);
        let status_every = Duration::from_secs(self.config.status_interval_secs.max(1));

        let fetches = self.state.session.start();
        self.issue(fetches);
        self.check_status();
        let mut last_status = Instant::now();

        while !self.should_quit {
            self.state.today = self.today();
            while let Ok(app_event) = self.rx.try_recv() {
                self.handle_event(app_event);
            }
            self.state.follow_selection();
            if self
                .state
                .toast
                .as_ref()
                .is_some_and(|toast| toast.shown_at.elapsed() > TOAST_TTL)
            {
                self.state.toast = None;
            }

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    _ => {}
                }
            }

            if last_status.elapsed() >= status_every {
                self.check_status();
                last_status = Instant::now();
            }
        }

        Ok(())
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    /// Spawns one task per fetch. Nothing is awaited here; answers come back
    /// through the channel in whatever order they complete.
    fn issue(&self, fetches: Vec<Fetch>) {
        for fetch in fetches {
            let client = Arc::clone(&self.client);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let outcome = dispatch(client.as_ref(), fetch).await;
                let _ = tx.send(AppEvent::Fetched(outcome));
            });
        }
    }

    fn submit(&mut self, mutation: Mutation) {
        self.state.pending_writes += 1;
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = perform(client.as_ref(), &mutation).await;
            let _ = tx.send(AppEvent::Mutated(mutation, result));
        });
    }

    fn check_status(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let connected = match client.db_status().await {
                Ok(status) => status.is_connected(),
                Err(err) => {
                    tracing::warn!("db status check failed: {err}");
                    false
                }
            };
            let _ = tx.send(AppEvent::DbStatus(connected));
        });
    }

    fn handle_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::Fetched(outcome) => {
                let fetches = self.state.session.apply(outcome, self.state.today);
                self.issue(fetches);
                self.state.clamp_cursors();
            }
            AppEvent::Mutated(mutation, Ok(())) => {
                self.state.pending_writes = self.state.pending_writes.saturating_sub(1);
                let fetches = self.state.session.mutation_succeeded(&mutation);
                self.issue(fetches);
                self.state.toast(
                    ToastLevel::Success,
                    format!("{} {}", past_tense(&mutation), mutation.kind().label().to_lowercase()),
                );
            }
            AppEvent::Mutated(mutation, Err(err)) => {
                self.state.pending_writes = self.state.pending_writes.saturating_sub(1);
                self.state.session.mutation_failed(&mutation, &err);
                let message = self
                    .state
                    .session
                    .mutation_error()
                    .map_or_else(|| err.to_string(), str::to_string);
                self.state.toast(ToastLevel::Error, message);
            }
            AppEvent::DbStatus(connected) => {
                if self.state.db_connected != Some(connected) {
                    tracing::info!(connected, "database status changed");
                }
                self.state.db_connected = Some(connected);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let typing = matches!(self.state.mode, Mode::Form(_));
        let action = map_key(key, typing);
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }

        let mode = std::mem::replace(&mut self.state.mode, Mode::Browse);
        self.state.mode = match mode {
            Mode::Browse => {
                self.handle_browse(action);
                // browse handlers may open a form or a confirmation
                std::mem::replace(&mut self.state.mode, Mode::Browse)
            }
            Mode::Form(form) => self.handle_form(form, action),
            Mode::ConfirmDelete(entry) => self.handle_confirm(entry, action),
        };
    }

    fn handle_browse(&mut self, action: AppAction) {
        let fetches = match action {
            AppAction::Left => self.state.session.step_week(-1),
            AppAction::Right => self.state.session.step_week(1),
            AppAction::Up => {
                self.state.move_cursor(-1);
                Vec::new()
            }
            AppAction::Down => {
                self.state.move_cursor(1);
                Vec::new()
            }
            AppAction::NextField => {
                self.state.focus = next_kind(self.state.focus);
                Vec::new()
            }
            AppAction::Input(ch) => self.handle_browse_char(ch),
            _ => Vec::new(),
        };
        self.issue(fetches);
    }

    fn handle_browse_char(&mut self, ch: char) -> Vec<Fetch> {
        match ch {
            '[' => self.state.session.step_month(-1),
            ']' => self.state.session.step_month(1),
            'h' => self.state.session.step_week(-1),
            'l' => self.state.session.step_week(1),
            'k' => {
                self.state.move_cursor(-1);
                Vec::new()
            }
            'j' => {
                self.state.move_cursor(1);
                Vec::new()
            }
            'i' => {
                self.state.focus = EntryKind::Income;
                Vec::new()
            }
            'g' => {
                self.state.focus = EntryKind::GeneralExpense;
                Vec::new()
            }
            'p' => {
                self.state.focus = EntryKind::PersonalExpense;
                Vec::new()
            }
            'r' => {
                self.state.toast(ToastLevel::Info, "Refreshing");
                self.state.session.refresh()
            }
            'a' => {
                if self.require_week() {
                    self.state.mode = Mode::Form(EntryForm::add(self.state.focus));
                }
                Vec::new()
            }
            'e' => {
                if let Some(form) = self.state.selected_entry().map(EntryForm::edit) {
                    self.state.mode = Mode::Form(form);
                }
                Vec::new()
            }
            'd' => {
                if let Some(entry) = self.state.selected_entry().cloned() {
                    self.state.mode = Mode::ConfirmDelete(entry);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn require_week(&mut self) -> bool {
        if self.state.session.selection().week_id().is_some() {
            return true;
        }
        self.state.toast(ToastLevel::Error, "Select a week first");
        false
    }

    fn handle_form(&mut self, mut form: EntryForm, action: AppAction) -> Mode {
        match action {
            AppAction::Cancel => return Mode::Browse,
            AppAction::NextField => form.next_field(),
            AppAction::Backspace => {
                form.field_mut().pop();
            }
            AppAction::Input(ch) => form.field_mut().push(ch),
            AppAction::Submit => {
                let Some(week_id) = self.state.session.selection().week_id() else {
                    form.message = Some("Select a week first".to_string());
                    return Mode::Form(form);
                };
                match form.to_mutation(week_id) {
                    Ok(mutation) => {
                        self.submit(mutation);
                        return Mode::Browse;
                    }
                    Err(err) => form.message = Some(err.to_string()),
                }
            }
            _ => {}
        }
        Mode::Form(form)
    }

    fn handle_confirm(&mut self, entry: LedgerEntry, action: AppAction) -> Mode {
        if let AppAction::Input('y' | 'Y') = action {
            self.submit(Mutation::Delete {
                kind: entry.kind,
                id: entry.id,
                week_id: entry.week_id,
            });
        }
        Mode::Browse
    }
}

fn past_tense(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Create { .. } => "Added",
        Mutation::Update { .. } => "Updated",
        Mutation::Delete { .. } => "Deleted",
    }
}

#[cfg(test)]
mod tests {
    use engine::{Month, MonthId};
    use rust_decimal::Decimal;

    use super::*;

    fn entry(kind: EntryKind, amount: Option<Decimal>) -> LedgerEntry {
        LedgerEntry {
            id: EntryId(4),
            kind,
            week_id: WeekId(2),
            amount,
            description: Some("rent".to_string()),
        }
    }

    #[test]
    fn edit_form_is_prefilled() {
        let rent = entry(EntryKind::GeneralExpense, Some(Decimal::new(500, 0)));
        let form = EntryForm::edit(&rent);
        assert_eq!(form.amount, "500.00");
        assert_eq!(form.description, "rent");
        assert_eq!(form.editing, Some(EntryId(4)));
        assert_eq!(form.title(), "Edit general expenses");
    }

    #[test]
    fn malformed_amount_is_not_prefilled() {
        let form = EntryForm::edit(&entry(EntryKind::GeneralExpense, None));
        assert!(form.amount.is_empty());
    }

    #[test]
    fn invalid_form_reports_validation_message() {
        let mut form = EntryForm::add(EntryKind::GeneralExpense);
        form.amount = "12,5".to_string();
        let err = form.to_mutation(WeekId(2)).unwrap_err();
        assert_eq!(err.to_string(), "Description is required");

        form.description = "bread".to_string();
        let mutation = form.to_mutation(WeekId(2)).unwrap();
        assert_eq!(mutation.verb(), "add");
        assert_eq!(mutation.week_id(), WeekId(2));
    }

    #[test]
    fn income_form_has_a_single_field() {
        let mut form = EntryForm::add(EntryKind::Income);
        form.next_field();
        assert_eq!(form.focus, FormField::Amount);

        let mut form = EntryForm::add(EntryKind::PersonalExpense);
        form.next_field();
        assert_eq!(form.focus, FormField::Description);
    }

    #[test]
    fn cursors_reset_when_selection_moves() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 17).unwrap();
        let mut state = AppState::new("http://localhost:8888/".to_string(), today);
        state.cursors = [2, 1, 3];
        state.follow_selection();
        assert_eq!(state.cursors, [2, 1, 3]);

        let months = vec![Month {
            id: MonthId(9),
            name: "September".to_string(),
            ordinal: 9,
        }];
        state.session.apply(Outcome::Months(Ok(months)), today);
        state.follow_selection();
        assert_eq!(state.cursors, [0; 3]);

        state.cursors = [1, 0, 0];
        state.follow_selection();
        assert_eq!(state.cursors, [1, 0, 0]);
    }

    #[test]
    fn focus_cycles_through_every_list() {
        let mut kind = EntryKind::Income;
        for _ in 0..3 {
            kind = next_kind(kind);
        }
        assert_eq!(kind, EntryKind::Income);
    }
}
