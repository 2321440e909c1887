use std::fmt::Debug;
use std::future::{Future, ready};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::context::Context;

pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Counts outstanding units of work and lets a caller wait for all of them.
///
/// Calling [`Synchronizer::release`] more often than units were registered is a
/// contract violation; the resulting behavior of [`Synchronizer::wait`] is
/// unspecified.
pub trait Synchronizer: Debug + Send + Sync {
    fn register(&self, delta: usize);

    fn release(&self);

    /// Resolves once every registered unit has been released.
    fn wait(&self) -> WaitFuture<'_>;
}

/// Active synchronizer backed by an atomic counter.
#[derive(Debug, Default)]
pub struct WaitGroup {
    outstanding: AtomicUsize,
    drained: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

impl Synchronizer for WaitGroup {
    fn register(&self, delta: usize) {
        self.outstanding.fetch_add(delta, Ordering::AcqRel);
    }

    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn wait(&self) -> WaitFuture<'_> {
        Box::pin(async move {
            loop {
                // Enabled before the counter check so a release landing in
                // between still wakes this waiter.
                let notified = self.drained.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.outstanding.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        })
    }
}

/// Synchronizer that keeps no count and never waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct InertSynchronizer;

impl Synchronizer for InertSynchronizer {
    fn register(&self, _delta: usize) {}

    fn release(&self) {}

    fn wait(&self) -> WaitFuture<'_> {
        Box::pin(ready(()))
    }
}

struct SynchronizerSlot(Arc<dyn Synchronizer>);

static INERT: OnceLock<Arc<dyn Synchronizer>> = OnceLock::new();

/// Derives a context carrying a fresh [`WaitGroup`], putting every
/// [`TaskRunner`](crate::runner::TaskRunner) invoked with it into
/// synchronized mode.
pub fn with_synchronizer(ctx: &Context) -> Context {
    bind_synchronizer(ctx, Arc::new(WaitGroup::new()))
}

/// Binds a caller-supplied synchronizer instead of a fresh [`WaitGroup`].
pub fn bind_synchronizer(ctx: &Context, synchronizer: Arc<dyn Synchronizer>) -> Context {
    ctx.with_value(SynchronizerSlot(synchronizer))
}

/// Returns the synchronizer bound to `ctx`, or an [`InertSynchronizer`].
pub fn synchronizer(ctx: &Context) -> Arc<dyn Synchronizer> {
    match ctx.value::<SynchronizerSlot>() {
        Some(slot) => slot.0.clone(),
        None => INERT
            .get_or_init(|| Arc::new(InertSynchronizer))
            .clone(),
    }
}

/// Context handed to a single task. A synchronized caller gives each task its
/// own wait group so runners nested inside the task join on their own work
/// instead of on the group the task itself is counted in.
pub(crate) fn task_scope(original: &Context, detached: &Context) -> Context {
    if original.value::<SynchronizerSlot>().is_some() {
        with_synchronizer(detached)
    } else {
        detached.clone()
    }
}
