// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Accounts API Server Implementation
//!
//! This crate exposes an [`accounts::AccountService`] over HTTP through a small
//! request-lifecycle layer: routing with named path segments, a per-request
//! context record, an explicit middleware chain and uniform JSON responses.
//!
//! # Module Structure
//!
//! - [`context`]: Per-request context record and its request-scoped carrier
//! - [`handler`]: Type-erased asynchronous request handlers
//! - [`middleware`]: Middleware chain and the access log middleware
//! - [`router`]: Method and path pattern dispatch
//! - [`response`]: Write-once JSON response encoding
//! - [`routes`]: Endpoint definitions and the account API
//! - [`server`]: Composition root implementing the inbound request contract
//! - [`metrics`]: Prometheus request metrics and exposition handler
//! - [`config`]: Process configuration with hierarchical loading
//! - [`error`]: Error types and domain failure status mapping
//! - [`app`]: Listener lifecycle, debug listener and coordinated shutdown
//!
//! # Request Flow
//!
//! ```text
//! request -> Server (dispatch, create RequestContext)
//!         -> access_log -> request_metrics -> endpoint middleware
//!         -> route handler -> Responder (records status)
//!         <- access_log emits {request_id, method, path, status, duration}
//! ```

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;

pub use app::App;
pub use config::{Environment, LogFormat, ServerConfig};
pub use context::RequestContext;
pub use error::{ServerError, ServerResult};
pub use handler::Handler;
pub use middleware::{AccessLogEntry, AccessLogSink, Middleware, MiddlewareChain, TracingSink};
pub use response::Responder;
pub use router::{PathParams, RouteError, Router};
pub use routes::{AccountApi, Endpoint, Endpoints};
pub use server::{Server, ServerBuilder};
