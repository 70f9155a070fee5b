use std::{cell::RefCell, rc::Rc};

use fetch_lifecycle::{
    prelude::*,
    utils::{async_sleep, log_error},
};

/// A text node of the demo page. Clones share the node.
#[derive(Debug, Clone)]
struct Node(Rc<RefCell<String>>);

impl Node {
    fn new(text: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(text.into())))
    }
}

/// A flat page: every rendered view gets a slot, mount hooks fire on `attach`
#[derive(Default)]
struct Page {
    slots: RefCell<Vec<Node>>,
    pending: RefCell<Vec<MountHook>>,
}

impl Page {
    fn attach(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        log::debug!("attaching {} view(s)", pending.len());
        for on_load in pending {
            on_load();
        }
    }

    fn print(&self, title: &str) {
        println!("--- {title}");
        for node in self.slots.borrow().iter() {
            println!("  {}", node.0.borrow());
        }
    }
}

impl ViewHost<Node> for Page {
    fn on_mount(&self, view: &Node, instance: InstanceId, on_load: MountHook, _on_unload: MountHook) {
        log::debug!("mount hook registered for {instance}");
        self.slots.borrow_mut().push(view.clone());
        self.pending.borrow_mut().push(on_load);
    }

    fn morph(&self, mounted: &Node, next: Node) {
        let next = next.0.borrow().clone();
        *mounted.0.borrow_mut() = next;
    }
}

#[derive(Debug, Clone)]
struct User {
    name: &'static str,
    email: &'static str,
}

const DIRECTORY: &[(u32, User)] = &[
    (
        1,
        User {
            name: "Ada",
            email: "ada@example.org",
        },
    ),
    (
        2,
        User {
            name: "Grace",
            email: "grace@example.org",
        },
    ),
];

#[derive(Default)]
struct UserCard {
    user_id: Option<u32>,
}

impl Fetchable for UserCard {
    type Args = u32;
    type Id = u32;
    type Data = User;
    type View = Node;

    fn identity(args: &u32) -> u32 {
        *args
    }

    fn fetch(&mut self, id: &u32) -> LocalBoxFuture<'static, Result<User, CCStr>> {
        let id = *id;
        async move {
            async_sleep(20 * id as u64).await;
            DIRECTORY
                .iter()
                .find(|(user_id, _)| *user_id == id)
                .map(|(_, user)| user.clone())
                .ok_or_else(|| log_error_ccstr(format!("no user with id {id}")))
        }
        .boxed_local()
    }

    fn placeholder(&self) -> Node {
        Node::new("[ loading... ]")
    }

    fn hydrate(&self, user: &User) -> Node {
        Node::new(format!("[ {} <{}> ]", user.name, user.email))
    }

    fn init(&mut self, args: &u32) {
        self.user_id = Some(*args);
    }

    fn done(&mut self, result: &FetchResult) {
        log::info!("card for user {:?} settled: {result:?}", self.user_id);
    }
}

async fn run() {
    let page = Rc::new(Page::default());
    let scheduler: Rc<dyn Scheduler> = Rc::new(TokioScheduler);

    let cards: Vec<(u32, Fetcher<UserCard>)> = (1..=3)
        .map(|user_id| {
            let card = Fetcher::with_config(
                UserCard::default(),
                page.clone(),
                scheduler.clone(),
                LifecycleConfig::named(format!("card-{user_id}")),
            );
            (user_id, card)
        })
        .collect();

    for (user_id, card) in &cards {
        card.render(*user_id);
    }
    page.print("rendered");
    page.attach();

    // Eager caller: starts the first fetch right away, the idle-time fetch joins it
    let (user_id, first) = &cards[0];
    if let Err(e) = first.prefetch(*user_id).await {
        log_error(e);
    }

    for (user_id, card) in &cards {
        match card.with(*user_id, |user| user.email).await {
            Ok(email) => println!("user {user_id}: {email}"),
            Err(e) => println!("user {user_id}: {}", log_error(e)),
        }
    }
    page.print("loaded");

    for (user_id, card) in &cards {
        println!("user {user_id}: {:?} {:?}", card.status(), card.stats());
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_micros()
        .init();

    log::info!("starting demo");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    tokio::task::LocalSet::new().block_on(&runtime, run());
}
