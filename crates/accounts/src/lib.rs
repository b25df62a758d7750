// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account domain for the accounts API
//!
//! This crate owns the account value type and the lookup capability the HTTP
//! layer depends on. The HTTP crate only transports accounts; it never creates
//! or mutates them.
//!
//! - [`account`]: the [`Account`] value
//! - [`service`]: the [`AccountService`] trait, its [`AccountError`] and the
//!   stateless [`StubAccountService`]

pub mod account;
pub mod service;

pub use account::Account;
pub use service::{AccountError, AccountService, StubAccountService};
