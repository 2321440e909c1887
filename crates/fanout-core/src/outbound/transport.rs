//! Pluggable request execution for outbound clients.
//!
//! A [`Transport`] sends one request. [`Interceptor`] turns a closure into a
//! transport, and [`decorate`] stacks [`Decorator`]s over a base transport so
//! requests can be inspected or answered before they reach the network.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::{Client, Request, Response};

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response, reqwest::Error>> + Send + 'a>>;

pub trait Transport: Send + Sync {
    fn round_trip(&self, request: Request) -> TransportFuture<'_>;
}

impl Transport for Client {
    fn round_trip(&self, request: Request) -> TransportFuture<'_> {
        Box::pin(self.execute(request))
    }
}

pub struct Interceptor<F> {
    handler: F,
}

impl<F> Interceptor<F>
where
    F: Fn(Request) -> TransportFuture<'static> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Transport for Interceptor<F>
where
    F: Fn(Request) -> TransportFuture<'static> + Send + Sync,
{
    fn round_trip(&self, request: Request) -> TransportFuture<'_> {
        (self.handler)(request)
    }
}

pub type Decorator = Box<dyn FnOnce(Arc<dyn Transport>) -> Arc<dyn Transport> + Send>;

/// Wraps `transport` so the first decorator sees each request first.
pub fn decorate(
    transport: Arc<dyn Transport>,
    decorators: impl IntoIterator<Item = Decorator>,
) -> Arc<dyn Transport> {
    let decorators: Vec<Decorator> = decorators.into_iter().collect();
    decorators
        .into_iter()
        .rev()
        .fold(transport, |inner, decorator| decorator(inner))
}

/// Decorator that runs `inspect` on every request before passing it on.
pub fn inspect_requests<F>(inspect: F) -> Decorator
where
    F: Fn(&Request) + Send + Sync + 'static,
{
    Box::new(move |next: Arc<dyn Transport>| -> Arc<dyn Transport> {
        Arc::new(Interceptor::new(move |request: Request| {
            inspect(&request);
            let next = next.clone();
            Box::pin(async move { next.round_trip(request).await }) as TransportFuture<'static>
        }))
    })
}
