use std::fmt::{Display, Formatter};

use tracing::Span;
use tracing::field::Empty;
use tracing_subscriber::EnvFilter;

use crate::context::Context;

pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Installs the process-wide fmt subscriber. `RUST_LOG` wins over
/// `default_directive` when it parses.
///
/// Returns `false` when a global subscriber was already installed, by an
/// earlier call or by the embedding application, and leaves it in place.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(true)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RequestId(pub String);

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn with_request_id(ctx: &Context, request_id: impl Into<String>) -> Context {
    ctx.with_value(RequestId(request_id.into()))
}

pub fn request_id(ctx: &Context) -> Option<&RequestId> {
    ctx.value::<RequestId>()
}

/// Span that stamps the context's request id, if any, onto every event
/// recorded inside it.
pub fn request_span(ctx: &Context) -> Span {
    match request_id(ctx) {
        Some(id) => tracing::info_span!("run_tasks", request_id = %id),
        None => tracing::info_span!("run_tasks", request_id = Empty),
    }
}
