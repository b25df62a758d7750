// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account lookup service
//!
//! The [`AccountService`] trait is the only domain operation the HTTP layer
//! calls. Failures are tagged so callers can tell an absent account apart from
//! bad input or a malfunctioning backend.

use thiserror::Error;
use tracing::debug;

use crate::Account;

/// Errors returned by an [`AccountService`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// No account exists for the identifier
    #[error("account {id} not found")]
    NotFound {
        /// Identifier that was looked up
        id: i64,
    },

    /// The identifier is syntactically valid but not acceptable to the service
    #[error("invalid account lookup: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// The service failed for reasons unrelated to the request
    #[error("account service failure: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

/// Account lookup capability
///
/// Implementations must be safe to call concurrently from many requests.
pub trait AccountService: Send + Sync {
    /// Look up a single account by identifier
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] when no account matches `id`,
    /// [`AccountError::InvalidInput`] when the service rejects the identifier,
    /// and [`AccountError::Internal`] for any other failure.
    fn account(&self, id: i64) -> impl Future<Output = Result<Account, AccountError>> + Send;
}

/// Stateless account service returning a fixed account for every identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct StubAccountService;

impl StubAccountService {
    /// Create a new stub service
    pub fn new() -> Self {
        Self
    }
}

impl AccountService for StubAccountService {
    async fn account(&self, id: i64) -> Result<Account, AccountError> {
        debug!(id, "serving stub account");
        Ok(Account {
            id,
            hash: "hash".to_string(),
            title: "Title".to_string(),
            url: "https://google.com".to_string(),
        })
    }
}
