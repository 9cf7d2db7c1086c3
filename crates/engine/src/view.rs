use crate::{
    SourceError,
    guard::{StaleGuard, Ticket},
};

/// What a view shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    /// Nothing to fetch: no selection, or an empty week list upstream.
    NoData,
    Loading,
    Loaded {
        value: T,
        /// A newer fetch is in flight; `value` may be behind.
        refreshing: bool,
        /// The last refresh failed; `value` is the previous good one.
        error: Option<String>,
    },
    /// The fetch failed and there was nothing to fall back to.
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Loaded { error, .. } => error.as_deref(),
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::Loading
                | Self::Loaded {
                    refreshing: true,
                    ..
                }
        )
    }
}

/// Result of handing a response to a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Discarded,
}

/// One independently fetched piece of the dashboard, keyed by the selection
/// it belongs to and versioned by the epoch it was requested at.
#[derive(Clone, Debug)]
pub struct AggregateView<K, T> {
    guard: StaleGuard<K>,
    state: ViewState<T>,
    in_flight: Option<u64>,
}

impl<K, T> Default for AggregateView<K, T> {
    fn default() -> Self {
        Self {
            guard: StaleGuard::default(),
            state: ViewState::NoData,
            in_flight: None,
        }
    }
}

impl<K: Copy + PartialEq + std::fmt::Debug, T> AggregateView<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn key(&self) -> Option<K> {
        self.guard.current()
    }

    /// Marks the view as needing data for `key` at `version` and returns the
    /// ticket to fetch with.
    ///
    /// A new key drops the shown value. The same key at a newer version keeps
    /// it on screen until the refetch lands.
    pub fn invalidate(&mut self, key: Option<K>, version: u64) -> Option<Ticket<K>> {
        let changed = self.guard.retarget(key, version);
        let Some(ticket) = self.guard.issue(version) else {
            self.state = ViewState::NoData;
            self.in_flight = None;
            return None;
        };

        let state = std::mem::replace(&mut self.state, ViewState::Loading);
        self.state = match state {
            ViewState::Loaded { value, error, .. } if !changed => ViewState::Loaded {
                value,
                refreshing: true,
                error,
            },
            _ => ViewState::Loading,
        };
        self.in_flight = Some(version);
        Some(ticket)
    }

    /// Applies a response unless it is stale.
    ///
    /// Failures are versioned like successes: an older success arriving after
    /// a newer failure is still discarded.
    pub fn apply(&mut self, ticket: Ticket<K>, result: Result<T, SourceError>) -> Applied {
        if !self.guard.admit(&ticket) {
            tracing::debug!(key = ?ticket.key, version = ticket.version, "stale response discarded");
            return Applied::Discarded;
        }

        let refreshing = self.in_flight.is_some_and(|pending| pending > ticket.version);
        if !refreshing {
            self.in_flight = None;
        }

        let state = std::mem::replace(&mut self.state, ViewState::Loading);
        self.state = match (result, state) {
            (Ok(value), _) => ViewState::Loaded {
                value,
                refreshing,
                error: None,
            },
            (Err(err), ViewState::Loaded { value, .. }) => {
                tracing::error!(key = ?ticket.key, version = ticket.version, "refresh failed: {err}");
                ViewState::Loaded {
                    value,
                    refreshing,
                    error: Some(err.to_string()),
                }
            }
            (Err(err), _) => {
                tracing::error!(key = ?ticket.key, version = ticket.version, "fetch failed: {err}");
                ViewState::Failed(err.to_string())
            }
        };
        Applied::Applied
    }
}
