//! # fetch-lifecycle
//!
//! Lazy, identity-keyed data loading for renderable UI components.
//!
//! A component implements [`Fetchable`](lifecycle::component::Fetchable) and is wrapped in a
//! [`Fetcher`](lifecycle::fetcher::Fetcher). The fetcher decides at render time whether the
//! placeholder or the hydrated view is produced, starts the fetch once the placeholder is
//! mounted and the host is idle, coalesces every caller asking for the same data into one
//! fetch, and swaps the mounted view in place when data arrives late.
//!
//! The view layer and the event loop are injected through the [`host`] traits.

pub mod config;
pub mod host;
pub mod lifecycle;
pub mod utils;

#[cfg(test)]
mod testing;

/// Prelude module that re-exports commonly used types and traits.
pub mod prelude {
    pub use super::config::LifecycleConfig;
    pub use super::host::{local::TokioScheduler, MountHook, Scheduler, ViewHost};
    pub use super::lifecycle::prelude::*;
    pub use super::utils::{log_error_ccstr, CCStr};
}
