//! Request-scoped context passed down a call chain.
//!
//! A [`Context`] carries an optional cancellation signal, an optional deadline
//! and a chain of typed values. Deriving a context never mutates its parent, so
//! a context can be cloned freely and handed to concurrently running tasks.

use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::models::ContextError;

#[derive(Clone, Default)]
pub struct Context {
    signal: Option<Signal>,
    values: Option<Arc<ValueNode>>,
}

#[derive(Clone)]
struct Signal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

struct ValueNode {
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<ValueNode>>,
}

impl Context {
    /// Root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that is cancelled when the returned token is
    /// cancelled or when this context is cancelled.
    pub fn with_cancel(&self) -> (Self, CancellationToken) {
        self.derive_signal(self.deadline())
    }

    /// Like [`Context::with_cancel`], and additionally expires at `deadline`
    /// unless this context already expires earlier.
    pub fn with_deadline(&self, deadline: Instant) -> (Self, CancellationToken) {
        let effective = match self.deadline() {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        self.derive_signal(Some(effective))
    }

    pub fn with_timeout(&self, timeout: Duration) -> (Self, CancellationToken) {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Binds `value` under its type. Later bindings of the same type shadow
    /// earlier ones for this context and everything derived from it.
    pub fn with_value<T>(&self, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            signal: self.signal.clone(),
            values: Some(Arc::new(ValueNode {
                value: Box::new(value),
                parent: self.values.clone(),
            })),
        }
    }

    pub fn value<T>(&self) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        let mut node = self.values.as_deref();
        while let Some(current) = node {
            if let Some(value) = current.value.downcast_ref::<T>() {
                return Some(value);
            }
            node = current.parent.as_deref();
        }
        None
    }

    /// Returns a context with the same values that is never cancelled and has
    /// no deadline, regardless of what happens to `self`.
    pub fn without_cancel(&self) -> Self {
        Self {
            signal: None,
            values: self.values.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.signal.as_ref().and_then(|signal| signal.deadline)
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    pub fn err(&self) -> Option<ContextError> {
        let signal = self.signal.as_ref()?;
        if signal.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match signal.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once this context is cancelled or its deadline passes.
    /// Never resolves for background or detached contexts.
    pub async fn cancelled(&self) {
        let Some(signal) = &self.signal else {
            return pending().await;
        };

        match signal.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal.token.cancelled() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            None => signal.token.cancelled().await,
        }
    }

    fn derive_signal(&self, deadline: Option<Instant>) -> (Self, CancellationToken) {
        let token = match &self.signal {
            Some(signal) => signal.token.child_token(),
            None => CancellationToken::new(),
        };
        let context = Self {
            signal: Some(Signal {
                token: token.clone(),
                deadline,
            }),
            values: self.values.clone(),
        };
        (context, token)
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut values = 0usize;
        let mut node = self.values.as_deref();
        while let Some(current) = node {
            values += 1;
            node = current.parent.as_deref();
        }

        f.debug_struct("Context")
            .field("cancellable", &self.signal.is_some())
            .field("err", &self.err())
            .field("deadline", &self.deadline())
            .field("values", &values)
            .finish()
    }
}
