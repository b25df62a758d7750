// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account value type

use serde::{Deserialize, Serialize};

/// A client account as returned by an [`AccountService`](crate::AccountService)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: i64,
    /// Opaque account hash
    pub hash: String,
    /// Display title
    pub title: String,
    /// Account home URL
    pub url: String,
}
