// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account endpoints
//!
//! Exposes an [`AccountService`] over HTTP.

use std::sync::Arc;

use accounts::AccountService;
use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::Response,
};
use tracing::{debug, error};

use super::{Endpoint, Endpoints};
use crate::{
    error::account_error_status, handler::Handler, response::Responder, router::PathParams,
};

/// HTTP API over an account service
#[derive(Debug)]
pub struct AccountApi<S> {
    service: Arc<S>,
}

impl<S> Clone for AccountApi<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> AccountApi<S>
where
    S: AccountService + 'static,
{
    /// Create the API for `service`
    pub fn new(service: S) -> Self {
        Self::from_shared(Arc::new(service))
    }

    /// Create the API for an already shared service
    pub fn from_shared(service: Arc<S>) -> Self {
        Self { service }
    }

    fn get_account_handler(&self) -> Handler {
        let service = Arc::clone(&self.service);
        Handler::new(move |request| {
            let service = Arc::clone(&service);
            async move { get_account(service.as_ref(), request).await }
        })
    }
}

impl<S> Endpoints for AccountApi<S>
where
    S: AccountService + 'static,
{
    fn endpoints(&self) -> Vec<Endpoint> {
        vec![Endpoint::new(
            Method::GET,
            "/accounts/:id",
            self.get_account_handler(),
        )]
    }
}

/// Handle `GET /accounts/:id`
async fn get_account<S: AccountService>(service: &S, request: Request) -> Response {
    let responder = Responder::for_request(&request);

    let raw_id = PathParams::from_request(&request)
        .and_then(|params| params.get("id"))
        .unwrap_or_default();

    let Ok(id) = raw_id.parse::<i64>() else {
        debug!(id = raw_id, "account id is not an integer");
        return responder.empty(StatusCode::BAD_REQUEST);
    };

    match service.account(id).await {
        Ok(account) => responder.json(StatusCode::OK, &account),
        Err(e) => {
            let status = account_error_status(&e);
            if status.is_server_error() {
                error!(id, error = %e, "account lookup failed");
            } else {
                debug!(id, error = %e, "account lookup rejected");
            }
            responder.empty(status)
        }
    }
}
