use reqwest::StatusCode;
use thiserror::Error;

/// Reason a [`Context`](crate::context::Context) is no longer live.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("couldn't build request url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("couldn't do request to {url:?}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url:?} abandoned: {source}")]
    Abandoned {
        url: String,
        #[source]
        source: ContextError,
    },

    #[error("request to {url:?} returned {status}, raw body={body:?}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("couldn't decode response body as JSON, raw body={body:?}: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}
