// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for server operations and the mapping
//! from domain failures to HTTP status codes.

use std::net::SocketAddr;

use accounts::AccountError;
use axum::http::StatusCode;
use thiserror::Error;

use crate::router::RouteError;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Invalid route table
    #[error("Route registration failed: {0}")]
    Route(#[from] RouteError),

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

/// HTTP status for a failed account lookup
pub fn account_error_status(error: &AccountError) -> StatusCode {
    match error {
        AccountError::NotFound { .. } => StatusCode::NOT_FOUND,
        AccountError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        AccountError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_errors_map_independently() {
        assert_eq!(
            account_error_status(&AccountError::NotFound { id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            account_error_status(&AccountError::InvalidInput {
                message: "negative id".to_string()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            account_error_status(&AccountError::Internal {
                message: "timeout".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn route_errors_convert() {
        let error: ServerError = RouteError::MissingLeadingSlash {
            pattern: "x".to_string(),
        }
        .into();
        assert!(matches!(error, ServerError::Route(_)));
        assert!(error.to_string().starts_with("Route registration failed"));
    }
}
