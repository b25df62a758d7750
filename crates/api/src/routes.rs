// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! An API exposes its HTTP surface as a list of [`Endpoint`]s through the
//! [`Endpoints`] trait. The [`Server`](crate::server::Server) registers them
//! at startup.

pub mod accounts;

use axum::http::Method;

pub use accounts::AccountApi;

use crate::{
    handler::Handler,
    middleware::{Middleware, MiddlewareChain},
};

/// A handler bound to one method and path pattern
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Request method
    pub method: Method,
    /// Path pattern, e.g. `/accounts/:id`
    pub path: String,
    /// Route handler
    pub handler: Handler,
    /// Middleware applied to this endpoint only, inside the server-wide chain
    pub middleware: MiddlewareChain,
}

impl Endpoint {
    /// Create an endpoint without endpoint-specific middleware
    pub fn new(method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            middleware: MiddlewareChain::new(),
        }
    }

    /// Add endpoint-specific middleware, innermost last
    #[must_use]
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware = self.middleware.with(middleware);
        self
    }
}

/// A set of endpoints exposed together
pub trait Endpoints {
    /// All endpoints of this API
    fn endpoints(&self) -> Vec<Endpoint>;
}
