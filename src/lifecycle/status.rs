use crate::utils::CCStr;

use super::coalescer::{Coalescer, CoalescerStats, Waiter};

/// Where an instance stands in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unfetched,
    Fetching,
    Fetched,
}

/// Lifecycle state. The identity of the data only exists while fetching or fetched, and the
/// data itself only once fetched.
#[derive(Debug)]
enum FetchStatus<I, D> {
    Unfetched,
    Fetching {
        id: I,
        epoch: u64,
        waiters: Coalescer,
    },
    Fetched {
        id: I,
        data: D,
    },
}

/// Handle on one started fetch, used to recognise its settlement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FetchTicket<I> {
    pub id: I,
    epoch: u64,
}

/// Outcome of applying a settled fetch to the lifecycle.
#[derive(Debug)]
pub(crate) enum Settlement {
    /// The instance moved on since the fetch started, nothing changed
    Stale,
    /// Back to unfetched; the waiters must hear about the error
    Failed { waiters: Coalescer, error: CCStr },
    /// Data stored; the waiters must hear about it
    Loaded { waiters: Coalescer },
}

/// The fetch lifecycle state machine of one component instance.
#[derive(Debug)]
pub(crate) struct Lifecycle<I, D> {
    status: FetchStatus<I, D>,
    created_id: Option<I>,
    initialized_for: Option<I>,
    epoch: u64,
    stats: CoalescerStats,
}

impl<I, D> Default for Lifecycle<I, D> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Unfetched,
            created_id: None,
            initialized_for: None,
            epoch: 0,
            stats: CoalescerStats::default(),
        }
    }
}

impl<I: Clone + PartialEq + core::fmt::Debug, D> Lifecycle<I, D> {
    pub fn status(&self) -> Status {
        match self.status {
            FetchStatus::Unfetched => Status::Unfetched,
            FetchStatus::Fetching { .. } => Status::Fetching,
            FetchStatus::Fetched { .. } => Status::Fetched,
        }
    }

    pub fn data_id(&self) -> Option<&I> {
        match &self.status {
            FetchStatus::Unfetched => None,
            FetchStatus::Fetching { id, .. } | FetchStatus::Fetched { id, .. } => Some(id),
        }
    }

    pub fn data(&self) -> Option<&D> {
        match &self.status {
            FetchStatus::Fetched { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Data, but only if it belongs to `id`
    pub fn data_for(&self, id: &I) -> Option<&D> {
        match &self.status {
            FetchStatus::Fetched { id: data_id, data } if data_id == id => Some(data),
            _ => None,
        }
    }

    pub fn created_id(&self) -> Option<&I> {
        self.created_id.as_ref()
    }

    /// Whether the tracked data belongs to the last rendered element
    pub fn serves_created(&self) -> bool {
        self.data_id().is_some() && self.data_id() == self.created_id()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.stats
    }

    /// Check a render or prefetch identity against the data the instance tracks.
    ///
    /// A different identity is accepted only when the tracked data belongs to an element
    /// that was already created: that data is stale and the instance goes back to
    /// unfetched. The waiters of an abandoned fetch are handed back so they can be dropped
    /// once the caller released its borrows.
    ///
    /// # Panics
    ///
    /// On any other identity mismatch: the same instance was asked for inconsistent data.
    pub fn resolve(&mut self, id: &I, caller: &str) -> Option<Coalescer> {
        let data_id = self.data_id()?;
        if data_id == id {
            return None;
        }
        assert!(
            self.created_id.as_ref() == Some(data_id),
            "{caller}: cross-call identity mismatch, asked for {id:?} while holding {data_id:?} \
            which no rendered element uses yet"
        );
        log::debug!("{caller}: data for {data_id:?} is stale, resetting for {id:?}");
        self.initialized_for = None;
        match std::mem::replace(&mut self.status, FetchStatus::Unfetched) {
            FetchStatus::Fetching { waiters, .. } => {
                self.stats.abandoned += waiters.len() as u64;
                Some(waiters)
            }
            _ => None,
        }
    }

    /// Whether the `init` hook still has to run for `id` before fetching
    pub fn needs_init(&self, id: &I) -> bool {
        self.status() == Status::Unfetched && self.initialized_for.as_ref() != Some(id)
    }

    pub fn mark_initialized(&mut self, id: I) {
        self.initialized_for = Some(id);
    }

    pub fn record_created(&mut self, id: I) {
        self.created_id = Some(id);
    }

    /// Enter the fetching state for `id`, with `first` as the first waiter.
    pub fn begin_fetch(&mut self, id: I, first: Waiter) -> FetchTicket<I> {
        debug_assert_eq!(self.status(), Status::Unfetched);
        self.epoch += 1;
        self.stats.fetches_started += 1;
        self.status = FetchStatus::Fetching {
            id: id.clone(),
            epoch: self.epoch,
            waiters: Coalescer::with_first(first),
        };
        FetchTicket {
            id,
            epoch: self.epoch,
        }
    }

    /// Attach `waiter` to the in-flight fetch. Hands it back when nothing is in flight.
    pub fn join(&mut self, waiter: Waiter) -> Result<(), Waiter> {
        match &mut self.status {
            FetchStatus::Fetching { waiters, .. } => {
                if waiters.join(waiter) {
                    self.stats.joined += 1;
                }
                Ok(())
            }
            _ => Err(waiter),
        }
    }

    pub fn count_cache_hit(&mut self) {
        self.stats.cache_hits += 1;
    }

    /// Apply the result of the fetch identified by `ticket`.
    pub fn settle(&mut self, ticket: FetchTicket<I>, result: Result<D, CCStr>) -> Settlement {
        match std::mem::replace(&mut self.status, FetchStatus::Unfetched) {
            FetchStatus::Fetching { id, epoch, waiters } if epoch == ticket.epoch => match result {
                Ok(data) => {
                    self.status = FetchStatus::Fetched { id, data };
                    Settlement::Loaded { waiters }
                }
                Err(error) => Settlement::Failed { waiters, error },
            },
            other => {
                self.status = other;
                self.stats.stale_discarded += 1;
                Settlement::Stale
            }
        }
    }
}
