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

//! Property-based tests for the ledger.
//!
//! These tests verify invariants that should hold for any sequence of
//! creates and transfers.

use bank_ledger_rs::{
    AccountId, AmountPolicy, DurableLog, IdIssuer, Ledger, LedgerConfig, TransferStatus,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tempfile::TempDir;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a non-negative amount (0 to 10000 with 4 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Generate a signed amount, including zero and negatives.
fn arb_signed_amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..=100_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

/// Account names, including commas, quotes and blanks.
fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z ]{0,12}",
        "[A-Za-z]{1,5}, [A-Za-z]{1,5}",
        Just("\"quoted\"".to_string()),
        Just(String::new()),
    ]
}

/// A transfer between two of `n` accounts, possibly referencing unknown ids.
fn arb_transfer(n: u64) -> impl Strategy<Value = (u64, u64, Decimal)> {
    (1..=n + 1, 1..=n + 1, arb_amount())
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Created ids are strictly greater than every earlier id.
    #[test]
    fn created_ids_strictly_increase(
        accounts in prop::collection::vec((arb_name(), arb_signed_amount()), 1..30),
    ) {
        let ledger = Ledger::in_memory(AmountPolicy::Permissive);
        let mut last = AccountId(0);

        for (name, balance) in accounts {
            let account = ledger.create_account(name, balance).unwrap();
            prop_assert!(account.id() > last);
            last = account.id();
        }
    }

    /// A transfer within balance moves exactly `amount` and keeps the pair sum.
    #[test]
    fn transfer_moves_exact_amount(
        from_balance in arb_amount(),
        to_balance in arb_signed_amount(),
        fraction in 0u32..=100,
    ) {
        let ledger = Ledger::in_memory(AmountPolicy::Permissive);
        let from = ledger.create_account("from", from_balance).unwrap().id();
        let to = ledger.create_account("to", to_balance).unwrap().id();
        let amount = (from_balance * Decimal::from(fraction) / Decimal::from(100)).round_dp(4);

        prop_assert_eq!(ledger.transfer(from, to, amount), TransferStatus::Success);

        let after_from = ledger.get_account(from).unwrap().balance();
        let after_to = ledger.get_account(to).unwrap().balance();
        prop_assert_eq!(after_from, from_balance - amount);
        prop_assert_eq!(after_to, to_balance + amount);
        prop_assert_eq!(after_from + after_to, from_balance + to_balance);
    }

    /// Over-balance transfers are rejected and change nothing.
    #[test]
    fn over_balance_transfer_changes_nothing(
        from_balance in arb_amount(),
        excess in 1i64..1_000_000i64,
    ) {
        let ledger = Ledger::in_memory(AmountPolicy::Permissive);
        let from = ledger.create_account("from", from_balance).unwrap().id();
        let to = ledger.create_account("to", Decimal::ZERO).unwrap().id();
        let amount = from_balance + Decimal::new(excess, 4);

        prop_assert_eq!(ledger.transfer(from, to, amount), TransferStatus::InsufficientFunds);
        prop_assert_eq!(ledger.get_account(from).unwrap().balance(), from_balance);
        prop_assert_eq!(ledger.get_account(to).unwrap().balance(), Decimal::ZERO);
    }

    /// Any sequence of non-negative transfers keeps the total constant and
    /// never drives a non-negative account below zero.
    #[test]
    fn random_transfers_conserve_total(
        balances in prop::collection::vec(arb_amount(), 2..6),
        transfers in prop::collection::vec(arb_transfer(6), 0..50),
    ) {
        let ledger = Ledger::in_memory(AmountPolicy::RequirePositive);
        for (i, balance) in balances.iter().enumerate() {
            ledger.create_account(format!("acct-{i}"), *balance).unwrap();
        }
        let total: Decimal = balances.iter().copied().sum();

        for (from, to, amount) in transfers {
            let before = ledger.list_accounts();
            let status = ledger.transfer(AccountId(from), AccountId(to), amount);
            if status != TransferStatus::Success {
                prop_assert_eq!(ledger.list_accounts().len(), before.len());
                let after: HashMap<_, _> =
                    ledger.list_accounts().into_iter().map(|a| (a.id(), a.balance())).collect();
                for account in before {
                    prop_assert_eq!(after[&account.id()], account.balance());
                }
            }
        }

        prop_assert_eq!(ledger.total_balance(), total);
        for account in ledger.list_accounts() {
            prop_assert!(account.balance() >= Decimal::ZERO);
        }
    }

    /// Saving and reloading reproduces the same id -> (name, balance) mapping.
    #[test]
    fn persistence_round_trip(
        accounts in prop::collection::vec((arb_name(), arb_signed_amount()), 0..20),
    ) {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig::new(dir.path().join("accounts.txt"));

        let ledger = Ledger::open(&config).unwrap();
        for (name, balance) in &accounts {
            ledger.create_account(name.clone(), *balance).unwrap();
        }
        let expected: HashMap<_, _> = ledger
            .list_accounts()
            .into_iter()
            .map(|a| (a.id(), (a.name().to_string(), a.balance())))
            .collect();
        drop(ledger);

        let issuer = IdIssuer::new();
        let reloaded: HashMap<_, _> = DurableLog::new(&config.log_path)
            .load(&issuer)
            .unwrap()
            .into_iter()
            .map(|a| (a.id(), (a.name().to_string(), a.balance())))
            .collect();

        prop_assert_eq!(reloaded, expected);
        prop_assert_eq!(issuer.next(), AccountId(accounts.len() as u64 + 1));
    }

    /// After reload, the next id is one past the largest id in the log.
    #[test]
    fn next_id_after_reload_exceeds_max(
        ids in prop::collection::hash_set(1u64..10_000, 1..20),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("accounts.txt");
        let content: String = ids.iter().map(|id| format!("{id},n{id},1\n")).collect();
        std::fs::write(&path, content).unwrap();

        let ledger = Ledger::open(&LedgerConfig::new(&path)).unwrap();
        let max = *ids.iter().max().unwrap();
        let created = ledger.create_account("new", Decimal::ZERO).unwrap();

        prop_assert_eq!(created.id(), AccountId(max + 1));
        prop_assert_eq!(ledger.len(), ids.len() + 1);
    }
}
