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

//! Ledger service.
//!
//! The [`Ledger`] is the single entry point for account state. It owns the
//! [`AccountStore`], the [`IdIssuer`] and, optionally, a [`DurableLog`], and
//! it is the only component that changes balances.
//!
//! # Operations
//!
//! - **Create**: Issue a new id, insert the account, persist.
//! - **Get / List**: Return detached copies of account records.
//! - **Transfer**: Debit one account and credit another as one unit, persist.
//! - **Deposit / Withdraw**: Single-account credit or debit of a positive amount, persist.
//!
//! # Thread Safety
//!
//! All account state sits behind one [`RwLock`]. Mutations hold the write
//! guard for the whole validate, mutate, persist sequence, so two transfers
//! never interleave and every saved snapshot is quiescent. Reads share the
//! read guard and clone what they return.

use crate::account::Account;
use crate::base::AccountId;
use crate::config::{AmountPolicy, LedgerConfig};
use crate::durable_log::DurableLog;
use crate::error::{LedgerError, PersistenceError, TransferStatus};
use crate::id_issuer::IdIssuer;
use crate::store::AccountStore;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, error, info};

/// Account ledger with optional durable persistence.
///
/// # Invariants
///
/// - Every issued id is strictly greater than every id issued or recovered before it.
/// - A successful transfer leaves the sum of the two balances unchanged.
/// - A transfer never takes the source balance below zero, unless the
///   [`AmountPolicy::Permissive`] policy lets a negative amount through.
/// - A rejected operation changes no balances and writes nothing.
pub struct Ledger {
    store: RwLock<AccountStore>,
    issuer: IdIssuer,
    log: Option<DurableLog>,
    amount_policy: AmountPolicy,
}

impl Ledger {
    /// Creates an empty ledger that never touches disk.
    pub fn in_memory(amount_policy: AmountPolicy) -> Self {
        Ledger {
            store: RwLock::new(AccountStore::new()),
            issuer: IdIssuer::new(),
            log: None,
            amount_policy,
        }
    }

    /// Opens the ledger described by `config`, replaying its log.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the log exists but cannot be read.
    /// A missing log yields an empty ledger.
    pub fn open(config: &LedgerConfig) -> Result<Self, PersistenceError> {
        Self::with_log(DurableLog::new(config.log_path.clone()), config.amount_policy)
    }

    /// Builds a ledger backed by `log`, reconstructing the store and the id
    /// issuer from its contents.
    pub fn with_log(log: DurableLog, amount_policy: AmountPolicy) -> Result<Self, PersistenceError> {
        let issuer = IdIssuer::new();
        let mut store = AccountStore::new();

        for account in log.load(&issuer)? {
            let inserted = store.insert(account);
            debug_assert!(inserted.is_ok(), "replayed ids are unique");
        }

        info!(
            path = %log.path().display(),
            accounts = store.len(),
            next_id = issuer.current().0.saturating_add(1),
            "ledger loaded"
        );

        Ok(Ledger {
            store: RwLock::new(store),
            issuer,
            log: Some(log),
            amount_policy,
        })
    }

    pub fn amount_policy(&self) -> AmountPolicy {
        self.amount_policy
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(DurableLog::path)
    }

    /// Creates an account with a freshly issued id.
    ///
    /// The name and initial balance are accepted as given: blank names and
    /// negative opening balances are allowed. Only line breaks are refused,
    /// since the log stores one account per line.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidName`] - Name contains `\n` or `\r`.
    /// - [`LedgerError::DuplicateId`] - Only if the id issuer has fallen behind
    ///   the store, which indicates a bug.
    pub fn create_account(
        &self,
        name: impl Into<String>,
        initial_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let name = name.into();
        if name.contains(['\n', '\r']) {
            return Err(LedgerError::InvalidName);
        }

        let mut store = self.store.write();

        let account = Account::new(self.issuer.next(), name, initial_balance);
        store.insert(account.clone())?;
        self.persist(&store);

        info!(id = %account.id(), balance = %account.balance(), "account created");
        Ok(account)
    }

    /// Returns a copy of the account with the given id.
    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.read().get(id).cloned()
    }

    /// Returns a snapshot of all accounts in unspecified order.
    pub fn list_accounts(&self) -> Vec<Account> {
        self.store.read().list()
    }

    /// Moves `amount` from one account to another and reports the outcome.
    ///
    /// | Outcome | Status |
    /// |---------|--------|
    /// | Applied | `"Transfer successful."` |
    /// | Either id unknown | `"Account not found."` |
    /// | Source balance below amount | `"Insufficient funds."` |
    /// | Non-positive amount under [`AmountPolicy::RequirePositive`] | `"Invalid amount."` |
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> TransferStatus {
        TransferStatus::from(self.try_transfer(from, to, amount))
    }

    /// Moves `amount` from one account to another.
    ///
    /// Checks run in order: amount policy, both accounts exist, source
    /// balance covers the amount. The debit and credit are applied under
    /// one write guard and persisted before it is released.
    ///
    /// A transfer from an account to itself passes the same checks and
    /// leaves the balance unchanged.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - Amount rejected by policy, or arithmetic overflow.
    /// - [`LedgerError::AccountNotFound`] - `from` or `to` does not exist.
    /// - [`LedgerError::InsufficientFunds`] - Source balance is below `amount`.
    pub fn try_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if self.amount_policy == AmountPolicy::RequirePositive && amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut store = self.store.write();

        let from_balance = store.get(from)?.balance();
        let to_balance = store.get(to)?.balance();

        if from_balance < amount {
            debug!(%from, %to, %amount, "transfer rejected: insufficient funds");
            return Err(LedgerError::InsufficientFunds);
        }

        // Compute both sides before touching the store so an overflow
        // rejects the transfer instead of applying half of it.
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InvalidAmount)?;
        let credit_base = if from == to { debited } else { to_balance };
        let credited = credit_base
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount)?;

        store.set_balance(from, debited)?;
        store.set_balance(to, credited)?;
        self.persist(&store);

        info!(%from, %to, %amount, "transfer applied");
        Ok(())
    }

    /// Credits a positive amount to an account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - Amount is zero, negative, or overflows the balance.
    /// - [`LedgerError::AccountNotFound`] - Account does not exist.
    pub fn deposit(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut store = self.store.write();
        let balance = store
            .get(id)?
            .balance()
            .checked_add(amount)
            .ok_or(LedgerError::InvalidAmount)?;
        store.set_balance(id, balance)?;
        self.persist(&store);

        info!(%id, %amount, "deposit applied");
        store.get(id).cloned()
    }

    /// Debits a positive amount from an account.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] - Amount is zero or negative.
    /// - [`LedgerError::AccountNotFound`] - Account does not exist.
    /// - [`LedgerError::InsufficientFunds`] - Balance is below `amount`.
    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let mut store = self.store.write();
        let balance = store.get(id)?.balance();
        if balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        store.set_balance(id, balance - amount)?;
        self.persist(&store);

        info!(%id, %amount, "withdrawal applied");
        store.get(id).cloned()
    }

    /// Sum of all balances.
    pub fn total_balance(&self) -> Decimal {
        self.store.read().iter().map(Account::balance).sum()
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Rewrites the durable log from the current state.
    ///
    /// Unlike the write that follows each mutation, failures are returned
    /// to the caller. A ledger without a log succeeds trivially.
    pub fn save(&self) -> Result<(), PersistenceError> {
        match &self.log {
            Some(log) => log.save(self.store.read().iter()),
            None => Ok(()),
        }
    }

    /// Writes the snapshot after a mutation. Failures are logged, not
    /// returned: the in-memory state stays correct, just not yet durable.
    fn persist(&self, store: &AccountStore) {
        let Some(log) = &self.log else {
            return;
        };
        if let Err(e) = log.save(store.iter()) {
            error!(path = %log.path().display(), error = %e, "failed to persist ledger");
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::in_memory(AmountPolicy::default())
    }
}
