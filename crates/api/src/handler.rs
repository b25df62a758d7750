// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Type-erased request handlers
//!
//! A [`Handler`] turns one request into one response. Route handlers,
//! middleware-wrapped handlers and the server's fallbacks all share this type,
//! which is what lets [`Middleware`](crate::middleware::Middleware) wrap any of
//! them.

use std::{fmt, pin::Pin, sync::Arc};

use axum::{extract::Request, response::Response};

/// Boxed, sendable future as produced by a [`Handler`]
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type HandlerFn = dyn Fn(Request) -> BoxFuture<Response> + Send + Sync;

/// Cloneable asynchronous request handler
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async function or closure as a handler
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |request| Box::pin(f(request))),
        }
    }

    /// Handle a single request
    pub fn call(&self, request: Request) -> BoxFuture<Response> {
        (self.inner)(request)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::StatusCode, response::IntoResponse};

    use super::*;

    #[tokio::test]
    async fn clones_share_the_same_function() {
        let handler = Handler::new(|_request| async { StatusCode::ACCEPTED.into_response() });
        let clone = handler.clone();

        let request = Request::builder()
            .body(Body::empty())
            .expect("request should build");
        let response = clone.call(request).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
