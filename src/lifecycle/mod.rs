//! # Lifecycle Module
//!
//! Lazy, cache-aware data loading tied to the render and mount cycle of a component.
//!
//! An instance is always in one of three states: unfetched, fetching or fetched. Rendering
//! produces the placeholder until the data is fetched and the hydrated view afterwards. The
//! fetch itself starts once the placeholder is mounted and the host is idle, or earlier if
//! someone prefetches.
//!
//! ## Core Concepts
//!
//! - [`Fetchable`](component::Fetchable): Trait for components whose content depends on fetched data
//! - [`Fetcher`](fetcher::Fetcher): Wraps a component and drives its lifecycle
//! - Identity: Every render and prefetch maps its arguments to an identity. An instance only
//!   ever holds data for one identity, and moving on to another identity is only allowed
//!   once the held data belongs to an element that was already rendered.
//! - Coalescing: Concurrent requests for the same identity share one fetch and are notified
//!   in the order they asked.
//!
//! ## Example Usage
//!
//! ```ignore
//! use fetch_lifecycle::prelude::*;
//!
//! let card = Fetcher::new(UserCard::new(api), host, Rc::new(TokioScheduler));
//!
//! // placeholder now, swapped in place once mounted and fetched
//! let view = card.render(user_id);
//!
//! // or load ahead of time; a later render is hydrated straight away
//! card.prefetch(user_id).await?;
//! ```

pub mod coalescer;
pub mod component;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod mapper;
pub mod status;

/// Prelude module that re-exports commonly used types and traits.
///
/// Import this module to get access to all the essential items needed
/// to implement and drive a fetchable component.
pub mod prelude {
    pub use super::coalescer::CoalescerStats;
    pub use super::component::Fetchable;
    pub use super::error::{FetchError, FetchResult};
    pub use super::fetcher::Fetcher;
    pub use super::identity::{Identity, InstanceId};
    pub use super::mapper::LoadableMapper;
    pub use super::status::Status;
    pub use futures_util::{future::LocalBoxFuture, FutureExt};
}
