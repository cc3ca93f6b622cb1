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

//! In-memory account store.
//!
//! The store is a plain map with no locking of its own. The
//! [`Ledger`](crate::Ledger) owns it behind a single lock, so every mutation
//! here is already serialized by the time it runs.

use crate::account::Account;
use crate::base::AccountId;
use crate::error::LedgerError;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Authoritative mapping from account id to account record.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<AccountId, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new account under its id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if the id is already present.
    pub fn insert(&mut self, account: Account) -> Result<(), LedgerError> {
        match self.accounts.entry(account.id()) {
            Entry::Occupied(entry) => Err(LedgerError::DuplicateId(*entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(account);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts.get(&id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Snapshot of every account. Iteration order is unspecified.
    pub fn list(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Overwrites the balance of an existing account.
    pub fn set_balance(&mut self, id: AccountId, balance: Decimal) -> Result<(), LedgerError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.set_balance(balance);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
