// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Method and path based request dispatch
//!
//! Routes are registered once at startup as `(method, pattern, handler)`
//! triples. A pattern is a `/`-separated list of segments where `:name` binds
//! the corresponding request segment and every other segment must match
//! literally. Matching is structural: the request path must have the same
//! number of segments as the pattern, so `/accounts` and `/accounts/` are
//! distinct paths. Routes are tried in registration order.
//!
//! Request segments are percent-decoded after splitting, so an encoded `/`
//! (`%2F`) stays inside its segment. Invalid UTF-8 is decoded lossily.

use std::{collections::HashSet, sync::Arc};

use axum::{extract::Request, http::Method};
use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::handler::Handler;

/// Route registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern does not start with `/`
    #[error("route pattern `{pattern}` must start with '/'")]
    MissingLeadingSlash {
        /// Offending pattern
        pattern: String,
    },

    /// Parameter segment without a name
    #[error("route pattern `{pattern}` has an unnamed parameter")]
    EmptyParameterName {
        /// Offending pattern
        pattern: String,
    },

    /// Same parameter name bound twice
    #[error("route pattern `{pattern}` binds parameter `{name}` more than once")]
    DuplicateParameter {
        /// Offending pattern
        pattern: String,
        /// Repeated parameter name
        name: String,
    },

    /// Method and pattern already registered
    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute {
        /// Route method
        method: Method,
        /// Route pattern
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(Arc<str>),
}

/// Parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: Arc<str>,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern such as `/accounts/:id`
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern does not start with `/`, has a
    /// parameter without a name, or binds a name twice.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        };

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        for segment in rest.split('/') {
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::EmptyParameterName {
                        pattern: pattern.to_string(),
                    });
                }
                if !names.insert(name) {
                    return Err(RouteError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                segments.push(Segment::Param(Arc::from(name)));
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        Ok(Self {
            raw: Arc::from(pattern),
            segments,
        })
    }

    /// The pattern as registered
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning the bound parameters
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut params = PathParams::default();

        for segment in &self.segments {
            let part = percent_decode_str(parts.next()?).decode_utf8_lossy();
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push(Arc::clone(name), part.into_owned()),
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Parameters bound by a matched route, in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(Arc<str>, String)>,
}

impl PathParams {
    fn push(&mut self, name: Arc<str>, value: String) {
        self.params.push((name, value));
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of bound parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether no parameters were bound
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters the server attached to `request`
    pub fn from_request(request: &Request) -> Option<&Self> {
        request.extensions().get::<Self>()
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Handler,
}

/// Result of a successful dispatch
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Handler registered for the route
    pub handler: Handler,
    /// Registered pattern of the route
    pub pattern: Arc<str>,
    /// Parameters bound from the request path
    pub params: PathParams,
}

/// Registration table mapping `(method, pattern)` to handlers
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] if the pattern is invalid or the same method and
    /// pattern are already registered.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), RouteError> {
        let pattern = PathPattern::parse(pattern)?;

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern == pattern)
        {
            return Err(RouteError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }

        self.routes.push(Route {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Find the handler for a request
    pub fn dispatch(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.pattern.matches(path).map(|params| RouteMatch {
                    handler: route.handler.clone(),
                    pattern: Arc::clone(&route.pattern.raw),
                    params,
                })
            })
    }

    /// Methods registered for routes matching `path`, in registration order
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if !methods.contains(&route.method) && route.pattern.matches(path).is_some() {
                methods.push(route.method.clone());
            }
        }
        methods
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
