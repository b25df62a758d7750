// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Uniform response encoding
//!
//! Route handlers produce their response through a [`Responder`]. The responder
//! is consumed when it writes, so a handler holding one can produce at most one
//! response, and the written status is recorded into the request's
//! [`RequestContext`] for the middleware that run afterwards.
//!
//! Serialization failures never abort the request: they are logged and
//! degraded to an empty `500 Internal Server Error`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::context::RequestContext;

const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// Write-once response encoder bound to one request
#[derive(Debug, Default)]
pub struct Responder {
    context: Option<Arc<RequestContext>>,
}

impl Responder {
    /// Create a responder for `request`, recording into its context if attached
    pub fn for_request(request: &Request) -> Self {
        Self {
            context: RequestContext::from_request(request),
        }
    }

    /// Respond with `status` and an optional JSON body
    pub fn respond<T>(self, status: StatusCode, body: Option<&T>) -> Response
    where
        T: Serialize + ?Sized,
    {
        match body {
            Some(body) => self.json(status, body),
            None => self.empty(status),
        }
    }

    /// Respond with `status` and `body` serialized as JSON
    pub fn json<T>(self, status: StatusCode, body: &T) -> Response
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                let mut response = self.finish(status, Body::from(bytes));
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, APPLICATION_JSON);
                response
            }
            Err(e) => {
                error!(
                    error = %e,
                    intended_status = status.as_u16(),
                    "failed to encode response body"
                );
                self.finish(StatusCode::INTERNAL_SERVER_ERROR, Body::empty())
            }
        }
    }

    /// Respond with `status` and an empty body
    pub fn empty(self, status: StatusCode) -> Response {
        self.finish(status, Body::empty())
    }

    fn finish(self, status: StatusCode, body: Body) -> Response {
        if let Some(context) = &self.context
            && !context.record_status(status)
        {
            warn!(
                request_id = %context.trace_id(),
                status = status.as_u16(),
                recorded = ?context.status(),
                "response status already recorded for request"
            );
        }

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
    }
}
