use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

use crate::context::Context;
use crate::synchronizer::{Synchronizer, synchronizer, task_scope};
use crate::telemetry::request_span;

pub type TaskArgs = Arc<[String]>;

pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Unit of work launched by a [`TaskRunner`]. Tasks report nothing back; they
/// handle their own errors and may watch [`Context::cancelled`] to stop early.
pub type Task = Arc<dyn Fn(Context, TaskArgs) -> TaskFuture + Send + Sync>;

pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn(Context, TaskArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx, args| Box::pin(f(ctx, args)) as TaskFuture)
}

/// Launches a fixed batch of tasks concurrently.
///
/// Whether [`TaskRunner::run`] waits for the batch is decided by the context it
/// is given: with a synchronizer bound through
/// [`with_synchronizer`](crate::synchronizer::with_synchronizer) it returns
/// once every task has finished, otherwise it returns right after spawning.
#[derive(Clone)]
pub struct TaskRunner {
    dispatch: Dispatch,
    tasks: Arc<[Task]>,
}

impl TaskRunner {
    pub fn new(dispatch: Dispatch, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            dispatch,
            tasks: tasks.into_iter().collect(),
        }
    }

    /// Builds a runner that logs to the subscriber that is the default at
    /// construction time.
    pub fn with_current_dispatch(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self::new(tracing::dispatcher::get_default(Dispatch::clone), tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns every task with a context that keeps the values of `ctx` but
    /// ignores its cancellation and deadline, then waits on the synchronizer
    /// bound to `ctx`.
    pub async fn run(&self, ctx: &Context, args: impl Into<TaskArgs>) {
        let args: TaskArgs = args.into();
        let span = tracing::dispatcher::with_default(&self.dispatch, || {
            let span = request_span(ctx);
            span.in_scope(|| tracing::info!(args = ?args, tasks = self.tasks.len(), "run tasks"));
            span
        });

        let detached = ctx.without_cancel();
        let synchronizer = synchronizer(ctx);

        for task in self.tasks.iter() {
            synchronizer.register(1);
            let release = ReleaseOnDrop(synchronizer.clone());
            let task = task.clone();
            let task_ctx = task_scope(ctx, &detached);
            let args = args.clone();

            tokio::spawn(
                async move {
                    let _release = release;
                    task(task_ctx, args).await;
                }
                .instrument(span.clone())
                .with_subscriber(self.dispatch.clone()),
            );
        }

        synchronizer.wait().await;
    }
}

/// Releases one unit however the owning task ends, including by panic or by
/// the runtime dropping it.
struct ReleaseOnDrop(Arc<dyn Synchronizer>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release();
    }
}
