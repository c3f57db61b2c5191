//! Background environment for running [`Task`]s.

use std::{
    convert,
    error::Error,
    future::{Future, IntoFuture},
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Result of a [`Task`] running in the [`Background`].
type Outcome = Result<(), Box<dyn Error + 'static>>;

/// Background environment for running [`Task`]s.
///
/// Spawned [`Task`]s make no progress until the [`Background`] is awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are driven on.
    set: task::LocalSet,

    /// Names and handles of the spawned [`Task`]s.
    handles: Vec<(&'static str, task::JoinHandle<Outcome>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(future.map_err(boxed));
        self.handles.push((name, handle));
    }
}

/// Boxes the provided [`Error`].
fn boxed(e: impl Error + 'static) -> Box<dyn Error + 'static> {
    Box::new(e)
}

impl IntoFuture for Background {
    type Output = Outcome;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = future::try_join_all(handles.into_iter().map(
            |(name, handle)| {
                handle.map(move |res| {
                    let res = res.map_err(boxed).and_then(convert::identity);
                    match &res {
                        Ok(()) => log::debug!("`{name}` task finished"),
                        Err(e) => log::error!("`{name}` task failed: {e}"),
                    }
                    res
                })
            },
        ));
        async move { set.run_until(tasks).await.map(drop) }.boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::fmt;

    use super::Background;

    #[tokio::test]
    async fn runs_tasks_only_when_awaited() {
        let (tx, mut rx) = tokio::sync::oneshot::channel();

        let mut bg = Background::default();
        bg.spawn("send", async move {
            tx.send(()).map_err(|()| fmt::Error)
        });
        assert!(rx.try_recv().is_err(), "task ran before awaiting");

        bg.await.expect("task succeeds");
        assert!(rx.try_recv().is_ok(), "task has not run");
    }

    #[tokio::test]
    async fn fails_when_any_task_fails() {
        let mut bg = Background::default();
        bg.spawn("ok", async { Ok::<_, fmt::Error>(()) });
        bg.spawn("failing", async { Err(fmt::Error) });

        assert!(bg.await.is_err(), "failure is not propagated");
    }
}
