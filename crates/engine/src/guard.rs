//! Stale-response discard by monotonic token.
//!
//! Every request is stamped with a [`Ticket`]: the context it was issued for
//! (a week, a month) and a version number that only grows (the mutation epoch,
//! or the selection generation). A [`StaleGuard`] admits a response only when
//! its context is still the current one and its version is not older than
//! either the version the context was entered at or the last response it
//! admitted. Superseded requests are never aborted, their answers are just
//! dropped on arrival.

/// Identity of one issued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket<K> {
    pub key: K,
    pub version: u64,
}

#[derive(Clone, Debug)]
pub struct StaleGuard<K> {
    current: Option<K>,
    floor: u64,
}

impl<K> Default for StaleGuard<K> {
    fn default() -> Self {
        Self {
            current: None,
            floor: 0,
        }
    }
}

impl<K: Copy + PartialEq> StaleGuard<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context responses must belong to.
    pub fn current(&self) -> Option<K> {
        self.current
    }

    /// Points the guard at a new context entered at `version`. Returns `true`
    /// if it changed, in which case anything stamped before `version` is
    /// refused.
    pub fn retarget(&mut self, key: Option<K>, version: u64) -> bool {
        if self.current == key {
            return false;
        }
        self.current = key;
        self.floor = version;
        true
    }

    /// Stamps a request for the current context, or `None` if there is none.
    pub fn issue(&self, version: u64) -> Option<Ticket<K>> {
        self.current.map(|key| Ticket { key, version })
    }

    /// Whether a response stamped with `ticket` would be admitted.
    pub fn is_fresh(&self, ticket: &Ticket<K>) -> bool {
        self.current == Some(ticket.key) && ticket.version >= self.floor
    }

    /// Admits the response and records its version, or rejects it as stale.
    pub fn admit(&mut self, ticket: &Ticket<K>) -> bool {
        if !self.is_fresh(ticket) {
            return false;
        }
        self.floor = ticket.version;
        true
    }
}
