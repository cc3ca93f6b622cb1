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

//! Ledger configuration.

use crate::durable_log::DurableLog;
use std::path::PathBuf;

/// How transfer amounts that are zero or negative are treated.
///
/// The historical behavior is [`Permissive`](Self::Permissive): a transfer
/// only checks `balance >= amount`, so a negative amount passes and moves
/// money from the destination to the source. [`RequirePositive`](Self::RequirePositive)
/// rejects such transfers with [`LedgerError::InvalidAmount`](crate::LedgerError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountPolicy {
    #[default]
    Permissive,
    RequirePositive,
}

/// Settings for opening a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Location of the durable log.
    pub log_path: PathBuf,
    pub amount_policy: AmountPolicy,
}

impl LedgerConfig {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            ..Self::default()
        }
    }

    pub fn with_amount_policy(mut self, amount_policy: AmountPolicy) -> Self {
        self.amount_policy = amount_policy;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DurableLog::DEFAULT_FILE_NAME),
            amount_policy: AmountPolicy::default(),
        }
    }
}
