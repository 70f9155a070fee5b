use futures_util::future::LocalBoxFuture;

use super::Scheduler;

/// A [`Scheduler`] running everything on the current tokio [`LocalSet`](tokio::task::LocalSet).
///
/// Idle work is deferred by yielding once to the runtime, so every task that was already
/// woken gets polled first.
///
/// # Panics
///
/// Both methods panic when called outside of a `LocalSet`, like [`tokio::task::spawn_local`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }

    fn when_idle(&self, task: Box<dyn FnOnce()>) {
        tokio::task::spawn_local(async move {
            tokio::task::yield_now().await;
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use futures_util::FutureExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        lifecycle::prelude::*,
        testing::{RecordingHost, TextView},
        utils::{async_sleep, CCStr},
    };

    #[tokio::test]
    async fn idle_task_runs_after_current_task_yields() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let ran = Rc::new(Cell::new(false));
                let (tx, rx) = oneshot::channel();
                let flag = ran.clone();
                TokioScheduler.when_idle(Box::new(move || {
                    flag.set(true);
                    let _ = tx.send(());
                }));
                assert!(!ran.get());
                rx.await.unwrap();
                assert!(ran.get());
            })
            .await;
    }

    struct Greeting;
    impl Fetchable for Greeting {
        type Args = u32;
        type Id = u32;
        type Data = String;
        type View = TextView;

        fn identity(args: &u32) -> u32 {
            *args
        }
        fn fetch(&mut self, id: &u32) -> LocalBoxFuture<'static, Result<String, CCStr>> {
            let id = *id;
            async move {
                async_sleep(1).await;
                Ok(format!("hello #{id}"))
            }
            .boxed_local()
        }
        fn placeholder(&self) -> TextView {
            TextView::new("...")
        }
        fn hydrate(&self, data: &String) -> TextView {
            TextView::new(data)
        }
    }

    #[tokio::test]
    async fn prefetch_completes_on_tokio() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let fetcher = Fetcher::new(
                    Greeting,
                    Rc::new(RecordingHost::default()),
                    Rc::new(TokioScheduler),
                );
                let joined = fetcher.prefetch(9);
                assert_eq!(fetcher.prefetch(9).await, Ok(()));
                assert_eq!(joined.await, Ok(()));
                assert_eq!(fetcher.render(9).text(), "hello #9");
                assert_eq!(fetcher.stats().fetches_started, 1);
            })
            .await;
    }
}
