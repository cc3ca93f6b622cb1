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

//! # Bank Ledger
//!
//! This library provides a single-node account ledger: an in-memory account
//! store with monotonic id issuance, transfers that never expose a half-applied
//! state, and a durable snapshot log that is replayed on startup.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Service owning all account state; the only place balances change
//! - [`AccountStore`]: In-memory map from [`AccountId`] to [`Account`]
//! - [`IdIssuer`]: Unique, strictly increasing account ids
//! - [`DurableLog`]: `id,name,balance` text snapshot rewritten after each mutation
//! - [`LedgerError`] / [`TransferStatus`]: Categorical failure outcomes
//!
//! ## Example
//!
//! ```
//! use bank_ledger_rs::{AmountPolicy, Ledger, TransferStatus};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::in_memory(AmountPolicy::Permissive);
//!
//! let alice = ledger.create_account("Alice", dec!(100)).unwrap();
//! let bob = ledger.create_account("Bob", dec!(50)).unwrap();
//!
//! let status = ledger.transfer(alice.id(), bob.id(), dec!(30));
//! assert_eq!(status, TransferStatus::Success);
//! assert_eq!(status.to_string(), "Transfer successful.");
//!
//! assert_eq!(ledger.get_account(alice.id()).unwrap().balance(), dec!(70));
//! assert_eq!(ledger.get_account(bob.id()).unwrap().balance(), dec!(80));
//! ```
//!
//! ## Thread Safety
//!
//! [`Ledger`] is `Send + Sync`. Mutations are serialized through one lock and
//! persisted before the lock is released; reads run concurrently.

pub mod account;
mod base;
mod config;
pub mod durable_log;
pub mod error;
mod id_issuer;
mod ledger;
pub mod logging;
mod store;

pub use account::Account;
pub use base::AccountId;
pub use config::{AmountPolicy, LedgerConfig};
pub use durable_log::DurableLog;
pub use error::{LedgerError, PersistenceError, TransferStatus};
pub use id_issuer::IdIssuer;
pub use ledger::Ledger;
pub use store::AccountStore;
