use std::sync::Arc;

use fanout_core::outbound::{Decorator, Transport, decorate, inspect_requests};
use reqwest::{Client, Method};

/// Real HTTP transport wrapped in the given decorators, outermost first.
pub fn client_transport(decorators: impl IntoIterator<Item = Decorator>) -> Arc<dyn Transport> {
    decorate(Arc::new(Client::new()), decorators)
}

pub fn assert_host(want: impl Into<String>) -> Decorator {
    let want = want.into();
    inspect_requests(move |request| {
        assert_eq!(request.url().authority(), want.as_str(), "unexpected host");
    })
}

pub fn assert_method(want: Method) -> Decorator {
    inspect_requests(move |request| {
        assert_eq!(request.method(), &want, "unexpected method");
    })
}

pub fn assert_path(want: impl Into<String>) -> Decorator {
    let want = want.into();
    inspect_requests(move |request| {
        assert_eq!(request.url().path(), want.as_str(), "unexpected path");
    })
}
