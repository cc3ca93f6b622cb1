// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for ledger operations and persistence.

use crate::base::AccountId;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Ledger operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Referenced account id does not exist
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// Debit would exceed the account balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Amount is zero or negative where a positive amount is required
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Account name contains a line break, which the log cannot store
    #[error("account name must not contain line breaks")]
    InvalidName,

    /// An account with this id is already stored.
    ///
    /// Only reachable if the id issuer falls behind the store, which is a bug.
    #[error("duplicate account id {0}")]
    DuplicateId(AccountId),
}

/// Durable log read/write failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to replace log file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Categorical outcome of a transfer, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    AccountNotFound,
    InsufficientFunds,
    /// Only produced under [`AmountPolicy::RequirePositive`](crate::AmountPolicy).
    InvalidAmount,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Transfer successful.",
            Self::AccountNotFound => "Account not found.",
            Self::InsufficientFunds => "Insufficient funds.",
            Self::InvalidAmount => "Invalid amount.",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Result<(), LedgerError>> for TransferStatus {
    fn from(result: Result<(), LedgerError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(LedgerError::AccountNotFound(_)) => Self::AccountNotFound,
            Err(LedgerError::InsufficientFunds) => Self::InsufficientFunds,
            Err(LedgerError::InvalidAmount) => Self::InvalidAmount,
            // Transfers neither insert nor name accounts; reaching this is a bug.
            Err(e @ (LedgerError::DuplicateId(_) | LedgerError::InvalidName)) => {
                error!(error = %e, "unexpected error from transfer");
                Self::AccountNotFound
            }
        }
    }
}
