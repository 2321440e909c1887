pub mod transport;

pub use transport::{
    Decorator, Interceptor, Transport, TransportFuture, decorate, inspect_requests,
};

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Method, Request, Url};
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::models::{ContextError, OutboundError, Post};

pub type OutboundResult<T> = Result<T, OutboundError>;

/// Client for the JSONPlaceholder posts API rooted at `base_url`.
#[derive(Clone)]
pub struct JsonPlaceholderClient {
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl JsonPlaceholderClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self::with_transport(Arc::new(client), base_url)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn posts(&self, ctx: &Context) -> OutboundResult<Vec<Post>> {
        self.fetch(ctx, "/posts").await
    }

    pub async fn post(&self, ctx: &Context, id: i64) -> OutboundResult<Post> {
        self.fetch(ctx, &format!("/posts/{id}")).await
    }

    async fn fetch<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> OutboundResult<T> {
        let url = format!("{}{path}", self.base_url);
        let parsed = Url::parse(&url).map_err(|error| OutboundError::InvalidUrl {
            url: url.clone(),
            message: error.to_string(),
        })?;

        if let Some(source) = ctx.err() {
            return Err(OutboundError::Abandoned { url, source });
        }

        let mut request = Request::new(Method::GET, parsed);
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        tracing::debug!(%url, "outbound request");
        let response = tokio::select! {
            _ = ctx.cancelled() => None,
            response = self.transport.round_trip(request) => Some(response),
        };
        let response = match response {
            Some(response) => response.map_err(|source| OutboundError::Request {
                url: url.clone(),
                source,
            })?,
            None => {
                return Err(OutboundError::Abandoned {
                    url,
                    source: ctx.err().unwrap_or(ContextError::Cancelled),
                });
            }
        };

        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|source| OutboundError::Request {
                url: url.clone(),
                source,
            })?;
        let body = || String::from_utf8_lossy(&raw).into_owned();

        if !status.is_success() {
            return Err(OutboundError::Status {
                url,
                status,
                body: body(),
            });
        }

        serde_json::from_slice(&raw).map_err(|source| OutboundError::Decode {
            body: body(),
            source,
        })
    }
}
