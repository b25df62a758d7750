// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-request context record
//!
//! Every request handled by the [`Server`](crate::server::Server) carries one
//! [`RequestContext`] in its extensions. The record is created before the
//! middleware chain runs, is shared only within that request's call chain, and
//! collects the outcome (the status code) for the middleware that observe it
//! after the handler returns.

use std::{
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use axum::{
    extract::Request,
    http::{Method, StatusCode},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timing, identity and outcome of a single in-flight request
#[derive(Debug)]
pub struct RequestContext {
    created_at: DateTime<Utc>,
    started: Instant,
    trace_id: Uuid,
    method: Method,
    path: Arc<str>,
    matched: bool,
    status: OnceLock<StatusCode>,
}

impl RequestContext {
    /// Create a record for a request entering the server now
    ///
    /// `path` is the registered route pattern, not the interpolated request
    /// path, so that log entries group by route.
    pub fn new(method: Method, path: impl Into<Arc<str>>) -> Self {
        Self {
            created_at: Utc::now(),
            started: Instant::now(),
            trace_id: Uuid::new_v4(),
            method,
            path: path.into(),
            matched: true,
            status: OnceLock::new(),
        }
    }

    /// Create a record for a request no route matched
    ///
    /// `path` is the raw request path. It is kept for the access log but must
    /// not be used as a metrics label.
    pub fn unmatched(method: Method, path: impl Into<Arc<str>>) -> Self {
        Self {
            matched: false,
            ..Self::new(method, path)
        }
    }

    /// Read the record attached to `request`, if any
    pub fn from_request(request: &Request) -> Option<Arc<Self>> {
        request.extensions().get::<Arc<Self>>().cloned()
    }

    /// Record the response status
    ///
    /// Only the first call takes effect. Returns `false` when a status was
    /// already recorded.
    pub fn record_status(&self, status: StatusCode) -> bool {
        self.status.set(status).is_ok()
    }

    /// Recorded response status, `None` while the request is in flight
    pub fn status(&self) -> Option<StatusCode> {
        self.status.get().copied()
    }

    /// Wall-clock time the request entered the server
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time elapsed since the request entered the server
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Trace identifier used to correlate log entries
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Method of the matched route
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Registered pattern of the matched route, or the raw path when no route
    /// matched
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a registered route matched the request
    pub fn is_matched(&self) -> bool {
        self.matched
    }
}

/// Attach `context` to `request`, returning the request carrying it
pub fn attach(mut request: Request, context: Arc<RequestContext>) -> Request {
    request.extensions_mut().insert(context);
    request
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request() -> Request {
        Request::builder()
            .uri("/accounts/1")
            .body(Body::empty())
            .expect("request should build")
    }

    #[test]
    fn absent_before_attachment() {
        assert!(RequestContext::from_request(&request()).is_none());
    }

    #[test]
    fn attached_record_is_shared() {
        let context = Arc::new(RequestContext::new(Method::GET, "/accounts/:id"));
        let request = attach(request(), Arc::clone(&context));

        let read = RequestContext::from_request(&request).expect("context should be attached");
        assert!(Arc::ptr_eq(&read, &context));
        assert_eq!(*read.method(), Method::GET);
        assert_eq!(read.path(), "/accounts/:id");
        assert!(read.is_matched());
    }

    #[test]
    fn unmatched_record_keeps_raw_path() {
        let context = RequestContext::unmatched(Method::GET, "/nowhere/17");
        assert!(!context.is_matched());
        assert_eq!(context.path(), "/nowhere/17");
        assert_eq!(context.status(), None);
    }

    #[test]
    fn status_is_recorded_once() {
        let context = RequestContext::new(Method::GET, "/accounts/:id");
        assert_eq!(context.status(), None);

        assert!(context.record_status(StatusCode::OK));
        assert!(!context.record_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(context.status(), Some(StatusCode::OK));
    }

    #[test]
    fn trace_ids_are_unique() {
        let first = RequestContext::new(Method::GET, "/");
        let second = RequestContext::new(Method::GET, "/");
        assert_ne!(first.trace_id(), second.trace_id());
    }

    #[test]
    fn elapsed_is_monotonic() {
        let context = RequestContext::new(Method::GET, "/");
        let first = context.elapsed();
        let second = context.elapsed();
        assert!(second >= first);
        assert!(context.created_at() <= Utc::now());
    }
}
