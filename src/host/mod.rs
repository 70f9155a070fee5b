//! Capabilities the host environment provides to a [`Fetcher`](crate::lifecycle::fetcher::Fetcher).
//!
//! The fetcher never detects mounts, idleness or diffs views itself: it asks the host.

use futures_util::future::LocalBoxFuture;

use crate::lifecycle::identity::InstanceId;

pub mod local;

/// A one-shot hook handed to the host
pub type MountHook = Box<dyn FnOnce()>;

/// The view side of the host: mount detection and in-place content swaps.
pub trait ViewHost<V> {
    /// Whether this host can tell when a view gets attached. When it cannot, no mount
    /// hook is ever registered.
    fn observes_mounts(&self) -> bool {
        true
    }

    /// Arrange for `on_load` to run once `view` is attached to the live view tree, and for
    /// `on_unload` to run once it is detached again.
    ///
    /// `instance` identifies the component instance owning `view`, so a host can tell
    /// a re-mount of the same component from a new one.
    fn on_mount(&self, view: &V, instance: InstanceId, on_load: MountHook, on_unload: MountHook);

    /// Replace the content of the mounted `mounted` view with `next`, keeping its position
    /// in the view tree.
    fn morph(&self, mounted: &V, next: V);
}

/// The event loop side of the host.
pub trait Scheduler {
    /// Drive `task` to completion on the current thread.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);

    /// Run `task` once the host is no longer busy with urgent work.
    fn when_idle(&self, task: Box<dyn FnOnce()>);
}
