use tokio::sync::oneshot;

use super::error::FetchResult;

/// Someone waiting for the in-flight fetch to settle.
pub(crate) enum Waiter {
    /// The component's own `done` hook
    Done,
    /// A caller of `prefetch_with`
    Callback(Box<dyn FnOnce(FetchResult)>),
    /// A caller of the async `prefetch`
    Channel(oneshot::Sender<FetchResult>),
}

impl core::fmt::Debug for Waiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done => f.write_str("Done"),
            Self::Callback(_) => f.write_str("Callback"),
            Self::Channel(_) => f.write_str("Channel"),
        }
    }
}

/// FIFO queue of the waiters attached to one pending fetch.
///
/// Only ever drained as a whole, so everyone who joined a fetch is notified within the same
/// settlement step and in registration order.
#[derive(Debug, Default)]
pub(crate) struct Coalescer {
    waiters: Vec<Waiter>,
}

impl Coalescer {
    pub fn with_first(waiter: Waiter) -> Self {
        Self {
            waiters: vec![waiter],
        }
    }

    /// Queues `waiter`. The `done` hook is queued at most once per fetch, returns whether
    /// the waiter was queued.
    pub fn join(&mut self, waiter: Waiter) -> bool {
        let is_done = |w: &Waiter| matches!(w, Waiter::Done);
        if is_done(&waiter) && self.waiters.iter().any(is_done) {
            return false;
        }
        self.waiters.push(waiter);
        true
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn into_waiters(self) -> Vec<Waiter> {
        self.waiters
    }
}

/// Counters describing how well requests were coalesced on one instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Concrete fetch operations started
    pub fetches_started: u64,
    /// Waiters that joined a fetch already in flight
    pub joined: u64,
    /// Prefetches answered from already fetched data
    pub cache_hits: u64,
    /// Settlements dropped because the instance had moved on
    pub stale_discarded: u64,
    /// Waiters released without notification when their fetch was abandoned
    pub abandoned: u64,
}
