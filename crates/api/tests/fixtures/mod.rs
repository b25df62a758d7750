// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for request lifecycle testing
//!
//! Account service doubles, an in-memory access log sink and helpers for
//! driving a [`Server`] in-process.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use accounts::{Account, AccountError, AccountService};
use accounts_api::{AccessLogEntry, AccessLogSink, AccountApi, Server, middleware::access_log};
use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::Response,
};
use tower::ServiceExt;

/// Access log sink keeping every entry in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<AccessLogEntry>>,
}

impl MemorySink {
    pub fn entries(&self) -> Vec<AccessLogEntry> {
        self.entries.lock().expect("sink lock poisoned").clone()
    }
}

impl AccessLogSink for MemorySink {
    fn record(&self, entry: &AccessLogEntry) {
        self.entries
            .lock()
            .expect("sink lock poisoned")
            .push(entry.clone());
    }
}

/// Account service failing every lookup with a fixed error
#[derive(Debug)]
pub struct FailingService {
    error: AccountError,
    calls: AtomicUsize,
}

impl FailingService {
    pub fn new(error: AccountError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_found() -> Self {
        Self::new(AccountError::NotFound { id: 0 })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccountService for FailingService {
    async fn account(&self, _id: i64) -> Result<Account, AccountError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

/// Server for `service` with access logging into `sink`
pub fn server_with_sink<S>(service: Arc<S>, sink: Arc<MemorySink>) -> Server
where
    S: AccountService + 'static,
{
    Server::builder()
        .with_middleware(access_log(sink))
        .with_endpoints(&AccountApi::from_shared(service))
        .build()
        .expect("server should build")
}

pub fn get(uri: &str) -> Request {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

/// Send `request` through `server`, returning status and body bytes
pub async fn send(server: &Server, request: Request) -> (Response, Vec<u8>) {
    let response = server
        .clone()
        .oneshot(request)
        .await
        .expect("service is infallible");
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("body should be readable")
        .to_vec();
    (Response::from_parts(parts, Body::empty()), bytes)
}

pub fn assert_empty_status(response: &Response, body: &[u8], status: StatusCode) {
    assert_eq!(response.status(), status);
    assert!(body.is_empty(), "expected empty body, got {body:?}");
}
