//! Test doubles for the host, the scheduler and the data source.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    task::{Context, Poll},
};

use futures_util::{future::LocalBoxFuture, task::noop_waker, FutureExt};
use tokio::sync::oneshot;

use crate::{
    config::LifecycleConfig,
    host::{MountHook, Scheduler, ViewHost},
    lifecycle::prelude::*,
    utils::CCStr,
};

/// A mounted text node. Clones share the same node.
#[derive(Debug, Clone)]
pub struct TextView(Rc<RefCell<String>>);

impl TextView {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(text.into())))
    }

    pub fn text(&self) -> String {
        self.0.borrow().clone()
    }

    fn replace(&self, text: String) {
        *self.0.borrow_mut() = text;
    }
}

type PendingMount = (InstanceId, MountHook, MountHook);

/// A [`ViewHost`] that queues mount hooks until the test attaches the views.
#[derive(Default)]
pub struct RecordingHost {
    blind: bool,
    pending: RefCell<Vec<PendingMount>>,
    unloads: RefCell<Vec<MountHook>>,
    morphs: Cell<usize>,
}

impl RecordingHost {
    /// A host that cannot detect mounts at all
    pub fn blind() -> Self {
        Self {
            blind: true,
            ..Default::default()
        }
    }

    pub fn pending_mounts(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn mount_instances(&self) -> Vec<InstanceId> {
        self.pending.borrow().iter().map(|(id, _, _)| *id).collect()
    }

    /// Attaches every rendered view, in render order
    pub fn mount_all(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for (_, on_load, on_unload) in pending {
            self.unloads.borrow_mut().push(on_unload);
            on_load();
        }
    }

    pub fn unmount_all(&self) {
        let unloads = std::mem::take(&mut *self.unloads.borrow_mut());
        for on_unload in unloads {
            on_unload();
        }
    }

    pub fn morphs(&self) -> usize {
        self.morphs.get()
    }
}

impl ViewHost<TextView> for RecordingHost {
    fn observes_mounts(&self) -> bool {
        !self.blind
    }

    fn on_mount(&self, _view: &TextView, instance: InstanceId, on_load: MountHook, on_unload: MountHook) {
        self.pending.borrow_mut().push((instance, on_load, on_unload));
    }

    fn morph(&self, mounted: &TextView, next: TextView) {
        mounted.replace(next.text());
        self.morphs.set(self.morphs.get() + 1);
    }
}

/// A [`Scheduler`] the test steps by hand.
#[derive(Default)]
pub struct ManualScheduler {
    idle: RefCell<VecDeque<Box<dyn FnOnce()>>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl ManualScheduler {
    pub fn idle_pending(&self) -> usize {
        self.idle.borrow().len()
    }

    /// Pretends the host went idle
    pub fn run_idle(&self) {
        loop {
            let next = self.idle.borrow_mut().pop_front();
            match next {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Polls spawned tasks until none of them can make progress
    pub fn run_until_stalled(&self) {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            let before = tasks.len();
            tasks.retain_mut(|task| task.poll_unpin(&mut cx).is_pending());
            let progressed = tasks.len() < before;

            let mut queue = self.tasks.borrow_mut();
            let spawned = !queue.is_empty();
            tasks.append(&mut queue);
            *queue = tasks;
            if !progressed && !spawned {
                return;
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }

    fn when_idle(&self, task: Box<dyn FnOnce()>) {
        self.idle.borrow_mut().push_back(task);
    }
}

/// Fetch operations that stay pending until the test resolves them.
#[derive(Clone, Default)]
pub struct FetchSource {
    requests: Rc<RefCell<Vec<(u32, oneshot::Sender<Result<String, CCStr>>)>>>,
    calls: Rc<Cell<usize>>,
}

impl FetchSource {
    pub fn request(&self, id: u32) -> LocalBoxFuture<'static, Result<String, CCStr>> {
        let (tx, rx) = oneshot::channel();
        self.requests.borrow_mut().push((id, tx));
        self.calls.set(self.calls.get() + 1);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(CCStr::from("request dropped")))
        }
        .boxed_local()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn pending_ids(&self) -> Vec<u32> {
        self.requests.borrow().iter().map(|(id, _)| *id).collect()
    }

    /// Settles the oldest pending request for `id`
    pub fn resolve(&self, id: u32, result: Result<&str, &str>) {
        let tx = {
            let mut requests = self.requests.borrow_mut();
            let index = requests
                .iter()
                .position(|(requested, _)| *requested == id)
                .unwrap_or_else(|| panic!("no pending request for {id}"));
            requests.remove(index).1
        };
        let _ = tx.send(result.map(String::from).map_err(CCStr::from));
    }
}

#[derive(Debug, Default)]
pub struct Journal {
    pub inits: Vec<u32>,
    pub done: Vec<FetchResult>,
    pub events: Vec<&'static str>,
}

/// Renders a user name fetched from a [`FetchSource`]
pub struct UserCard {
    source: FetchSource,
    journal: Rc<RefCell<Journal>>,
}

impl Fetchable for UserCard {
    type Args = u32;
    type Id = u32;
    type Data = String;
    type View = TextView;

    fn identity(args: &u32) -> u32 {
        *args
    }

    fn fetch(&mut self, id: &u32) -> LocalBoxFuture<'static, Result<String, CCStr>> {
        self.source.request(*id)
    }

    fn placeholder(&self) -> TextView {
        TextView::new("loading")
    }

    fn hydrate(&self, data: &String) -> TextView {
        TextView::new(format!("user {data}"))
    }

    fn init(&mut self, args: &u32) {
        self.journal.borrow_mut().inits.push(*args);
    }

    fn done(&mut self, result: &FetchResult) {
        let mut journal = self.journal.borrow_mut();
        journal.done.push(result.clone());
        journal.events.push("done");
    }
}

pub struct Harness {
    pub fetcher: Fetcher<UserCard>,
    pub host: Rc<RecordingHost>,
    pub scheduler: Rc<ManualScheduler>,
    pub source: FetchSource,
    pub journal: Rc<RefCell<Journal>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_host(RecordingHost::default(), LifecycleConfig::named("user-card"))
    }

    pub fn with_host(host: RecordingHost, config: LifecycleConfig) -> Self {
        let host = Rc::new(host);
        let scheduler = Rc::new(ManualScheduler::default());
        let source = FetchSource::default();
        let journal = Rc::new(RefCell::new(Journal::default()));
        let component = UserCard {
            source: source.clone(),
            journal: journal.clone(),
        };
        let fetcher = Fetcher::with_config(component, host.clone(), scheduler.clone(), config);
        Self {
            fetcher,
            host,
            scheduler,
            source,
            journal,
        }
    }

    /// Settles the pending fetch for `id` and lets the settlement run
    pub fn resolve(&self, id: u32, result: Result<&str, &str>) {
        self.source.resolve(id, result);
        self.scheduler.run_until_stalled();
    }

    pub fn inits(&self) -> Vec<u32> {
        self.journal.borrow().inits.clone()
    }

    pub fn done(&self) -> Vec<FetchResult> {
        self.journal.borrow().done.clone()
    }
}

pub fn poll_once<F: std::future::Future + Unpin>(future: &mut F) -> Poll<F::Output> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.poll_unpin(&mut cx)
}
