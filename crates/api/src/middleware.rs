// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing
//!
//! A [`Middleware`] is a transformation from the next [`Handler`] to a new
//! handler that may run code before and after delegating. Middleware are
//! collected into a [`MiddlewareChain`] in an explicit order at startup; the
//! first middleware added is the outermost one, so its "before" code runs first
//! and its "after" code runs last.
//!
//! This module also provides the access log middleware, which reports one
//! [`AccessLogEntry`] per request to an [`AccessLogSink`] after the handler has
//! produced its response.

use std::{fmt, sync::Arc, time::Duration};

use axum::http::{Method, StatusCode};
use tracing::info;
use uuid::Uuid;

use crate::{context::RequestContext, handler::Handler};

type WrapFn = dyn Fn(Handler) -> Handler + Send + Sync;

/// Named handler-to-handler transformation
#[derive(Clone)]
pub struct Middleware {
    name: &'static str,
    wrap: Arc<WrapFn>,
}

impl Middleware {
    /// Create a middleware from a function wrapping the next handler
    pub fn new<F>(name: &'static str, wrap: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self {
            name,
            wrap: Arc::new(wrap),
        }
    }

    /// Middleware name, used for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrap `next`, returning the new handler
    pub fn apply(&self, next: Handler) -> Handler {
        (self.wrap)(next)
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered list of middleware, outermost first
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<Middleware>,
}

impl MiddlewareChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `middleware` inside every middleware already in the chain
    #[must_use]
    pub fn with(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Whether the chain has no middleware
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Middleware names, outermost first
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(Middleware::name).collect()
    }

    /// Wrap `handler` in every middleware of the chain
    pub fn then(&self, handler: Handler) -> Handler {
        self.middleware
            .iter()
            .rev()
            .fold(handler, |next, middleware| middleware.apply(next))
    }
}

impl FromIterator<Middleware> for MiddlewareChain {
    fn from_iter<I: IntoIterator<Item = Middleware>>(iter: I) -> Self {
        Self {
            middleware: iter.into_iter().collect(),
        }
    }
}

/// One access log record, built from a completed request's context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    /// Trace identifier of the request
    pub request_id: Uuid,
    /// Method of the matched route
    pub method: Method,
    /// Route pattern, or raw path for unmatched requests
    pub path: String,
    /// Status written to the client
    pub status: Option<StatusCode>,
    /// Time between request entry and response completion
    pub duration: Duration,
}

impl AccessLogEntry {
    /// Snapshot the state of `context`
    pub fn from_context(context: &RequestContext) -> Self {
        Self {
            request_id: context.trace_id(),
            method: context.method().clone(),
            path: context.path().to_string(),
            status: context.status(),
            duration: context.elapsed(),
        }
    }
}

/// Destination for access log entries
pub trait AccessLogSink: Send + Sync + fmt::Debug {
    /// Record one completed request
    fn record(&self, entry: &AccessLogEntry);
}

/// Access log sink emitting structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AccessLogSink for TracingSink {
    fn record(&self, entry: &AccessLogEntry) {
        info!(
            request_id = %entry.request_id,
            method = %entry.method,
            path = %entry.path,
            status = entry.status.map_or(0, |status| status.as_u16()),
            duration = ?entry.duration,
            "request"
        );
    }
}

/// Access logging middleware
///
/// Runs the rest of the chain, then reports the request's context record to
/// `sink`. When nothing inside recorded a status, the response status is
/// recorded first. Requests without a context record are skipped.
pub fn access_log(sink: Arc<dyn AccessLogSink>) -> Middleware {
    Middleware::new("access_log", move |next| {
        let sink = Arc::clone(&sink);
        Handler::new(move |request| {
            let next = next.clone();
            let sink = Arc::clone(&sink);
            async move {
                let context = RequestContext::from_request(&request);
                let response = next.call(request).await;
                if let Some(context) = context {
                    context.record_status(response.status());
                    sink.record(&AccessLogEntry::from_context(&context));
                }
                response
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{body::Body, extract::Request, response::IntoResponse};

    use super::*;
    use crate::context::attach;

    #[derive(Debug, Default)]
    struct MemorySink {
        entries: Mutex<Vec<AccessLogEntry>>,
    }

    impl AccessLogSink for MemorySink {
        fn record(&self, entry: &AccessLogEntry) {
            self.entries
                .lock()
                .expect("sink lock poisoned")
                .push(entry.clone());
        }
    }

    fn tracing_middleware(name: &'static str, events: Arc<Mutex<Vec<String>>>) -> Middleware {
        Middleware::new(name, move |next| {
            let events = Arc::clone(&events);
            Handler::new(move |request| {
                let next = next.clone();
                let events = Arc::clone(&events);
                async move {
                    events
                        .lock()
                        .expect("events lock poisoned")
                        .push(format!("{name}:before"));
                    let response = next.call(request).await;
                    events
                        .lock()
                        .expect("events lock poisoned")
                        .push(format!("{name}:after"));
                    response
                }
            })
        })
    }

    fn request() -> Request {
        Request::builder()
            .uri("/accounts/1")
            .body(Body::empty())
            .expect("request should build")
    }

    #[tokio::test]
    async fn chain_runs_first_registered_outermost() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new()
            .with(tracing_middleware("outer", Arc::clone(&events)))
            .with(tracing_middleware("inner", Arc::clone(&events)));

        assert_eq!(chain.names(), vec!["outer", "inner"]);
        assert_eq!(chain.len(), 2);

        let handler_events = Arc::clone(&events);
        let handler = chain.then(Handler::new(move |_request| {
            let events = Arc::clone(&handler_events);
            async move {
                events
                    .lock()
                    .expect("events lock poisoned")
                    .push("handler".to_string());
                StatusCode::OK.into_response()
            }
        }));

        let response = handler.call(request()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let events = events.lock().expect("events lock poisoned").clone();
        assert_eq!(
            events,
            vec![
                "outer:before",
                "inner:before",
                "handler",
                "inner:after",
                "outer:after"
            ]
        );
    }

    #[tokio::test]
    async fn empty_chain_returns_handler_unchanged() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());

        let handler = chain.then(Handler::new(|_request| async {
            StatusCode::IM_A_TEAPOT.into_response()
        }));
        assert_eq!(
            handler.call(request()).await.status(),
            StatusCode::IM_A_TEAPOT
        );
    }

    #[tokio::test]
    async fn access_log_records_status_after_handler() {
        let sink = Arc::new(MemorySink::default());
        let chain: MiddlewareChain = [access_log(sink.clone())].into_iter().collect();

        let handler = chain.then(Handler::new(|request: Request| async move {
            let context = RequestContext::from_request(&request).expect("context attached");
            assert_eq!(context.status(), None);
            context.record_status(StatusCode::CREATED);
            StatusCode::CREATED.into_response()
        }));

        let context = Arc::new(RequestContext::new(Method::GET, "/accounts/:id"));
        let response = handler.call(attach(request(), Arc::clone(&context))).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let entries = sink.entries.lock().expect("sink lock poisoned");
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.request_id, context.trace_id());
        assert_eq!(entry.method, Method::GET);
        assert_eq!(entry.path, "/accounts/:id");
        assert_eq!(entry.status, Some(StatusCode::CREATED));
    }

    #[tokio::test]
    async fn access_log_records_response_status_when_unset() {
        let sink = Arc::new(MemorySink::default());
        let handler = access_log(sink.clone()).apply(Handler::new(|_request| async {
            StatusCode::TOO_MANY_REQUESTS.into_response()
        }));

        let context = Arc::new(RequestContext::new(Method::GET, "/accounts/:id"));
        handler.call(attach(request(), Arc::clone(&context))).await;

        assert_eq!(context.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        let entries = sink.entries.lock().expect("sink lock poisoned");
        assert_eq!(entries[0].status, Some(StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn access_log_skips_requests_without_context() {
        let sink = Arc::new(MemorySink::default());
        let handler = access_log(sink.clone()).apply(Handler::new(|_request| async {
            StatusCode::OK.into_response()
        }));

        let response = handler.call(request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(sink.entries.lock().expect("sink lock poisoned").is_empty());
    }
}
