// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request lifecycle composition
//!
//! [`Server`] is the single entry point for inbound requests. For every
//! request it dispatches by method and path, creates the request's
//! [`RequestContext`], attaches it together with the bound path parameters,
//! and runs the pre-composed handler: the server-wide middleware chain around
//! the endpoint's own middleware around the route handler.
//!
//! Requests that match no route run through the same middleware chain with a
//! not-found handler, so they are logged like any other request. `OPTIONS`
//! requests for a known path without an explicit `OPTIONS` route are answered
//! with the allowed methods.
//!
//! `Server` implements [`tower::Service`], so it can be mounted under any
//! transport that speaks `http` requests.

use std::{convert::Infallible, sync::Arc, task::Poll};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::Response,
};
use tracing::debug;

use crate::{
    context::{self, RequestContext},
    handler::{BoxFuture, Handler},
    middleware::{Middleware, MiddlewareChain},
    response::Responder,
    router::{PathParams, RouteError, Router},
    routes::{Endpoint, Endpoints},
};

/// Response header carrying the request's trace identifier
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Composition root of the request path
#[derive(Debug, Clone)]
pub struct Server {
    router: Arc<Router>,
    not_found: Handler,
    options: Handler,
}

impl Server {
    /// Start building a server
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Handle one inbound request and produce its response
    pub async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (handler, context, params) = match self.router.dispatch(&method, &path) {
            Some(matched) => (
                matched.handler,
                RequestContext::new(method, matched.pattern),
                matched.params,
            ),
            None => {
                let handler = if method == Method::OPTIONS
                    && !self.router.allowed_methods(&path).is_empty()
                {
                    self.options.clone()
                } else {
                    debug!(%method, %path, "no route matched");
                    self.not_found.clone()
                };
                (
                    handler,
                    RequestContext::unmatched(method, path),
                    PathParams::default(),
                )
            }
        };

        let context = Arc::new(context);
        let mut request = context::attach(request, Arc::clone(&context));
        request.extensions_mut().insert(params);

        let mut response = handler.call(request).await;

        if let Ok(value) = HeaderValue::from_str(&context.trace_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    fn allow_handler(router: Arc<Router>) -> Handler {
        Handler::new(move |request: Request| {
            let router = Arc::clone(&router);
            async move {
                let allowed = router
                    .allowed_methods(request.uri().path())
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");

                let mut response = Responder::for_request(&request).empty(StatusCode::OK);
                if let Ok(value) = HeaderValue::from_str(&allowed) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
        })
    }
}

impl tower::Service<Request> for Server {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let server = self.clone();
        Box::pin(async move { Ok(server.handle(request).await) })
    }
}

/// Builder assembling the middleware chain and route table of a [`Server`]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    chain: MiddlewareChain,
    endpoints: Vec<Endpoint>,
}

impl ServerBuilder {
    /// Append a server-wide middleware, inside those already added
    #[must_use]
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.chain = self.chain.with(middleware);
        self
    }

    /// Replace the server-wide middleware chain
    #[must_use]
    pub fn with_chain(mut self, chain: MiddlewareChain) -> Self {
        self.chain = chain;
        self
    }

    /// Add every endpoint of `api`
    #[must_use]
    pub fn with_endpoints(mut self, api: &impl Endpoints) -> Self {
        self.endpoints.extend(api.endpoints());
        self
    }

    /// Add a single endpoint
    #[must_use]
    pub fn route(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Compose every handler and build the route table
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if an endpoint pattern is invalid or registered
    /// twice.
    pub fn build(self) -> Result<Server, RouteError> {
        let mut router = Router::new();
        for endpoint in self.endpoints {
            let handler = record_outcome(endpoint.middleware.then(endpoint.handler));
            router.register(endpoint.method, &endpoint.path, self.chain.then(handler))?;
        }

        debug!(
            routes = router.len(),
            middleware = ?self.chain.names(),
            "request pipeline composed"
        );

        let router = Arc::new(router);
        let not_found = Handler::new(|request: Request| async move {
            Responder::for_request(&request).empty(StatusCode::NOT_FOUND)
        });

        Ok(Server {
            not_found: self.chain.then(not_found),
            options: self.chain.then(Server::allow_handler(Arc::clone(&router))),
            router,
        })
    }
}

/// Record the produced response's status for handlers that bypassed the
/// [`Responder`]
///
/// Wraps the endpoint middleware as well, so a short-circuiting endpoint
/// middleware still leaves a status for the server-wide chain.
fn record_outcome(next: Handler) -> Handler {
    Handler::new(move |request: Request| {
        let next = next.clone();
        async move {
            let context = RequestContext::from_request(&request);
            let response = next.call(request).await;
            if let Some(context) = context {
                context.record_status(response.status());
            }
            response
        }
    })
}
