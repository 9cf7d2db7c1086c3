use std::fmt;

/// Process-local invalidation token. Starts at 0, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl Epoch {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of the epoch counter.
///
/// The counter moves only through [`Coordinator::record_mutation`], once per
/// acknowledged mutation. Aggregate views stamp their fetches with
/// [`Coordinator::current`] and compare stamps on arrival.
#[derive(Debug, Default)]
pub struct Coordinator {
    epoch: Epoch,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Epoch {
        self.epoch
    }

    /// Bumps the epoch by exactly one. Call only after the collaborator
    /// acknowledged the mutation.
    pub fn record_mutation(&mut self) -> Epoch {
        self.epoch = Epoch(self.epoch.0.saturating_add(1));
        tracing::debug!(epoch = %self.epoch, "mutation recorded");
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(Coordinator::new().current(), Epoch(0));
    }

    #[test]
    fn each_mutation_adds_exactly_one() {
        let mut coordinator = Coordinator::new();
        let mut previous = coordinator.current();
        for _ in 0..10 {
            let next = coordinator.record_mutation();
            assert_eq!(next.value(), previous.value() + 1);
            assert_eq!(coordinator.current(), next);
            previous = next;
        }
    }
}
