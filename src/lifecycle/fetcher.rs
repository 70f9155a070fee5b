use std::{
    cell::RefCell,
    future::Future,
    rc::{Rc, Weak},
};

use futures_util::{future::LocalBoxFuture, FutureExt};
use tokio::sync::oneshot;

use crate::{
    config::LifecycleConfig,
    host::{MountHook, Scheduler, ViewHost},
    utils::CCStr,
};

use super::{
    coalescer::{CoalescerStats, Waiter},
    component::Fetchable,
    error::{FetchError, FetchResult},
    identity::InstanceId,
    mapper::LoadableMapper,
    status::{FetchTicket, Lifecycle, Settlement, Status},
};

struct State<C: Fetchable> {
    component: C,
    lifecycle: Lifecycle<C::Id, C::Data>,
    /// Registration number and handle of the mounted view
    mounted: Option<(u64, C::View)>,
    registrations: u64,
}

impl<C: Fetchable> State<C> {
    fn init_once(&mut self, id: &C::Id, args: &C::Args, name: &CCStr) {
        if self.lifecycle.needs_init(id) {
            log::debug!("{name}: init for {id:?}");
            self.component.init(args);
            self.lifecycle.mark_initialized(id.clone());
        }
    }

    /// The mounted view together with its hydrated replacement, if the data is its own
    fn hydrated_swap(&self) -> Option<(C::View, C::View)> {
        let (_, mounted) = self.mounted.as_ref()?;
        if !self.lifecycle.serves_created() {
            return None;
        }
        let data = self.lifecycle.data()?;
        Some((mounted.clone(), self.component.hydrate(data)))
    }
}

/// What to do once the state borrow of a prefetch is released
enum AfterPrefetch {
    CacheHit(Waiter),
    Joined,
    Started(LocalBoxFuture<'static, ()>),
}

struct Shared<C: Fetchable> {
    state: RefCell<State<C>>,
    host: Rc<dyn ViewHost<C::View>>,
    scheduler: Rc<dyn Scheduler>,
    config: LifecycleConfig,
    instance: InstanceId,
}

/// Wraps a [`Fetchable`] component and drives its fetch lifecycle.
///
/// `render` and `prefetch` are the only entry points; they are not part of the
/// [`Fetchable`] trait and cannot be overridden by the component.
///
/// Every step (render, mount, idle, settlement) mutates the state synchronously and
/// releases it before calling out to user callbacks, so callbacks may call back into the
/// fetcher. Hooks and spawned fetches only hold weak references: once the fetcher is
/// dropped, late events are ignored.
pub struct Fetcher<C: Fetchable> {
    shared: Rc<Shared<C>>,
}

impl<C: Fetchable> Fetcher<C> {
    pub fn new(
        component: C,
        host: Rc<dyn ViewHost<C::View>>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self::with_config(component, host, scheduler, LifecycleConfig::default())
    }

    pub fn with_config(
        component: C,
        host: Rc<dyn ViewHost<C::View>>,
        scheduler: Rc<dyn Scheduler>,
        config: LifecycleConfig,
    ) -> Self {
        let instance = InstanceId::new();
        log::debug!("{}: new instance {instance}", config.name);
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(State {
                    component,
                    lifecycle: Lifecycle::default(),
                    mounted: None,
                    registrations: 0,
                }),
                host,
                scheduler,
                config,
                instance,
            }),
        }
    }

    /// Renders the component for `args`.
    ///
    /// Produces the hydrated view when the data is already fetched, the placeholder
    /// otherwise. In the latter case the fetch starts once the placeholder is mounted and
    /// the host is idle. Never blocks.
    ///
    /// # Panics
    ///
    /// When `args` refer to other data than a fetch the instance holds for no rendered
    /// element (see [`Fetcher::prefetch_with`]).
    pub fn render(&self, args: C::Args) -> C::View {
        let shared = &self.shared;
        let id = C::identity(&args);

        let mut state = shared.state.borrow_mut();
        let abandoned = state.lifecycle.resolve(&id, "render");
        state.init_once(&id, &args, &shared.config.name);
        state.lifecycle.record_created(id);

        let state_ref = &mut *state;
        let (view, hydrated) = match state_ref.lifecycle.data() {
            Some(data) => (state_ref.component.hydrate(data), true),
            None => (state_ref.component.placeholder(), false),
        };
        state_ref.registrations += 1;
        let registration = state_ref.registrations;
        drop(state);
        drop(abandoned);

        if shared.observes_mounts() {
            shared.register_mount(&view, registration, hydrated);
        }
        view
    }

    /// Makes sure the data for `args` is fetched, then calls `callback`.
    ///
    /// Already fetched data answers immediately. A fetch in flight is joined rather than
    /// duplicated: everyone who joined is called back in registration order once it
    /// settles. Callbacks of a fetch that gets abandoned for other data are dropped without
    /// being called.
    ///
    /// # Panics
    ///
    /// When the instance already fetches or holds other data that no rendered element uses:
    /// the same instance was asked for two different things.
    pub fn prefetch_with(&self, args: C::Args, callback: impl FnOnce(FetchResult) + 'static) {
        self.shared
            .prefetch_waiter(args, Waiter::Callback(Box::new(callback)));
    }

    /// Async form of [`Fetcher::prefetch_with`].
    ///
    /// The identity check happens when this is called, not when the future is first polled.
    /// Resolves to [`FetchError::Superseded`] if the joined fetch gets abandoned.
    pub fn prefetch(&self, args: C::Args) -> impl Future<Output = FetchResult> + 'static {
        let (tx, rx) = oneshot::channel();
        self.shared.prefetch_waiter(args, Waiter::Channel(tx));
        async move { rx.await.unwrap_or(Err(FetchError::Superseded)) }
    }

    /// Waits for the data of `args` to be loaded and maps it with `f`
    pub async fn with<R>(
        &self,
        args: C::Args,
        f: impl FnOnce(&C::Data) -> R,
    ) -> Result<R, FetchError> {
        let id = C::identity(&args);
        self.prefetch(args).await?;
        let state = self.shared.state.borrow();
        state
            .lifecycle
            .data_for(&id)
            .map(f)
            .ok_or(FetchError::Superseded)
    }

    pub fn status(&self) -> Status {
        self.shared.state.borrow().lifecycle.status()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.shared.state.borrow().lifecycle.stats()
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.state.borrow().mounted.is_some()
    }

    pub fn instance_id(&self) -> InstanceId {
        self.shared.instance
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.shared.config
    }
}

impl<C: Fetchable> LoadableMapper<C::Data> for Fetcher<C> {
    fn lmap<R, F: FnOnce(&C::Data) -> R>(&self, f: F) -> Option<R> {
        self.shared.state.borrow().lifecycle.data().map(f)
    }
}

impl<C: Fetchable> Shared<C> {
    fn observes_mounts(&self) -> bool {
        self.config.observe_mounts && self.host.observes_mounts()
    }

    fn register_mount(self: &Rc<Self>, view: &C::View, registration: u64, hydrated: bool) {
        let weak = Rc::downgrade(self);
        let handle = view.clone();
        let on_load: MountHook = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.mounted(registration, handle, hydrated);
            }
        });
        let weak = Rc::downgrade(self);
        let on_unload: MountHook = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.unmounted(registration);
            }
        });
        self.host.on_mount(view, self.instance, on_load, on_unload);
    }

    fn mounted(self: &Rc<Self>, registration: u64, view: C::View, hydrated: bool) {
        let mut state = self.state.borrow_mut();
        if registration < state.registrations {
            log::debug!(
                "{}: ignoring mount of replaced view #{registration}",
                self.config.name
            );
            return;
        }
        state.mounted = Some((registration, view));
        drop(state);
        if hydrated {
            self.notify_done(&Ok(()));
        } else {
            self.load();
        }
    }

    fn unmounted(&self, registration: u64) {
        let mut state = self.state.borrow_mut();
        if matches!(state.mounted, Some((r, _)) if r == registration) {
            state.mounted = None;
        }
    }

    /// Runs once a placeholder got mounted
    fn load(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        let status = state.lifecycle.status();
        if status != Status::Unfetched && !state.lifecycle.serves_created() {
            log::debug!(
                "{}: mounted element does not own the tracked data, not loading",
                self.config.name
            );
            return;
        }
        match status {
            Status::Unfetched => {
                drop(state);
                let weak = Rc::downgrade(self);
                self.scheduler.when_idle(Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.fetch_when_idle();
                    }
                }));
            }
            Status::Fetching => {
                let _ = state.lifecycle.join(Waiter::Done);
            }
            Status::Fetched => {
                // fetch settled between render and mount detection
                let swap = state.hydrated_swap();
                drop(state);
                if let Some((mounted, next)) = swap {
                    self.host.morph(&mounted, next);
                }
                self.notify_done(&Ok(()));
            }
        }
    }

    fn fetch_when_idle(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        let status = state.lifecycle.status();
        if status != Status::Unfetched && !state.lifecycle.serves_created() {
            // a prefetch for other data took over while we waited for idle
            log::debug!(
                "{}: instance moved on to {:?}, idle fetch skipped",
                self.config.name,
                state.lifecycle.data_id()
            );
            return;
        }
        match status {
            Status::Unfetched => {
                let Some(id) = state.lifecycle.created_id().cloned() else {
                    return;
                };
                let task = self.fetch_task(&mut state, id, Waiter::Done);
                drop(state);
                self.scheduler.spawn_local(task);
            }
            // a prefetch started it while we waited for idle
            Status::Fetching => {
                let _ = state.lifecycle.join(Waiter::Done);
            }
            Status::Fetched => {
                drop(state);
                self.notify_done(&Ok(()));
            }
        }
    }

    fn prefetch_waiter(self: &Rc<Self>, args: C::Args, waiter: Waiter) {
        let id = C::identity(&args);

        let mut state = self.state.borrow_mut();
        let abandoned = state.lifecycle.resolve(&id, "prefetch");
        let status = state.lifecycle.status();
        let next = match status {
            Status::Fetched => {
                state.lifecycle.count_cache_hit();
                AfterPrefetch::CacheHit(waiter)
            }
            Status::Fetching => {
                let _ = state.lifecycle.join(waiter);
                AfterPrefetch::Joined
            }
            Status::Unfetched => {
                state.init_once(&id, &args, &self.config.name);
                AfterPrefetch::Started(self.fetch_task(&mut state, id, waiter))
            }
        };
        drop(state);
        drop(abandoned);

        match next {
            AfterPrefetch::CacheHit(waiter) => self.notify(vec![waiter], &Ok(())),
            AfterPrefetch::Joined => {}
            AfterPrefetch::Started(task) => self.scheduler.spawn_local(task),
        }
    }

    /// Moves to fetching and returns the task driving the fetch to its settlement
    fn fetch_task(
        self: &Rc<Self>,
        state: &mut State<C>,
        id: C::Id,
        first: Waiter,
    ) -> LocalBoxFuture<'static, ()> {
        let ticket = state.lifecycle.begin_fetch(id, first);
        let request = state.component.fetch(&ticket.id);
        log::info!("{}: fetching {:?}", self.config.name, ticket.id);

        let weak: Weak<Self> = Rc::downgrade(self);
        async move {
            let result = request.await;
            if let Some(shared) = weak.upgrade() {
                shared.settle(ticket, result);
            }
        }
        .boxed_local()
    }

    fn settle(&self, ticket: FetchTicket<C::Id>, result: Result<C::Data, CCStr>) {
        let name = &self.config.name;
        let id = ticket.id.clone();

        let mut state = self.state.borrow_mut();
        let settlement = state.lifecycle.settle(ticket, result);
        let (waiters, outcome, swap) = match settlement {
            Settlement::Stale => {
                log::debug!("{name}: dropping stale result for {id:?}");
                return;
            }
            Settlement::Failed { waiters, error } => {
                log::error!("{name}: fetch of {id:?} failed: {error}");
                (waiters, Err(FetchError::Failed(error)), None)
            }
            Settlement::Loaded { waiters } => {
                log::debug!("{name}: fetched {id:?}, {} waiter(s)", waiters.len());
                (waiters, Ok(()), state.hydrated_swap())
            }
        };
        drop(state);

        if let Some((mounted, next)) = swap {
            self.host.morph(&mounted, next);
        }
        self.notify(waiters.into_waiters(), &outcome);
    }

    fn notify(&self, waiters: Vec<Waiter>, outcome: &FetchResult) {
        for waiter in waiters {
            match waiter {
                Waiter::Done => self.notify_done(outcome),
                Waiter::Callback(callback) => callback(outcome.clone()),
                Waiter::Channel(tx) => {
                    let _ = tx.send(outcome.clone());
                }
            }
        }
    }

    fn notify_done(&self, outcome: &FetchResult) {
        self.state.borrow_mut().component.done(outcome);
    }
}
