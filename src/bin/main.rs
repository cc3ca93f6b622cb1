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

use bank_ledger_rs::{Account, AccountId, AmountPolicy, Ledger, LedgerConfig, logging};
use clap::{Parser, Subcommand};
use csv::Writer;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::process;

/// Bank Ledger - Manage accounts backed by a durable log
///
/// Every command loads the log, applies one operation, and (for mutations)
/// rewrites the log before exiting. Account output is CSV on stdout.
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "A crash-recoverable account ledger", long_about = None)]
struct Args {
    /// Path to the account log
    #[arg(long, value_name = "FILE", default_value = "accounts.txt")]
    log: PathBuf,

    /// Reject transfers of zero or negative amounts
    #[arg(long)]
    require_positive_amounts: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and print it
    Create {
        name: String,
        #[arg(allow_negative_numbers = true)]
        balance: Decimal,
    },
    /// Print one account
    Get { id: AccountId },
    /// Print all accounts
    List,
    /// Move funds between two accounts
    Transfer {
        from: AccountId,
        to: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    /// Credit a positive amount to an account
    Deposit { id: AccountId, amount: Decimal },
    /// Debit a positive amount from an account
    Withdraw { id: AccountId, amount: Decimal },
}

impl Args {
    fn config(&self) -> LedgerConfig {
        let policy = if self.require_positive_amounts {
            AmountPolicy::RequirePositive
        } else {
            AmountPolicy::Permissive
        };
        LedgerConfig::new(self.log.clone()).with_amount_policy(policy)
    }
}

fn main() {
    logging::init();
    let args = Args::parse();

    let ledger = match Ledger::open(&args.config()) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error loading '{}': {}", args.log.display(), e);
            process::exit(1);
        }
    };

    if let Err(message) = run(&ledger, args.command, std::io::stdout()) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

/// Executes one command against the ledger, writing results to `out`.
///
/// Returns the message to report on failure.
fn run<W: Write>(ledger: &Ledger, command: Command, mut out: W) -> Result<(), String> {
    let accounts = match command {
        Command::Create { name, balance } => {
            vec![ledger.create_account(name, balance).map_err(|e| e.to_string())?]
        }
        Command::Get { id } => vec![ledger.get_account(id).map_err(|e| e.to_string())?],
        Command::List => {
            let mut accounts = ledger.list_accounts();
            accounts.sort_by_key(Account::id);
            accounts
        }
        Command::Transfer { from, to, amount } => {
            let status = ledger.transfer(from, to, amount);
            if !status.is_success() {
                return Err(status.to_string());
            }
            writeln!(out, "{}", status).map_err(|e| e.to_string())?;
            return Ok(());
        }
        Command::Deposit { id, amount } => {
            vec![ledger.deposit(id, amount).map_err(|e| e.to_string())?]
        }
        Command::Withdraw { id, amount } => {
            vec![ledger.withdraw(id, amount).map_err(|e| e.to_string())?]
        }
    };

    write_accounts(&accounts, out).map_err(|e| format!("Error writing output: {}", e))
}

/// Write accounts to a CSV writer
///
/// # CSV Format
///
/// Columns: `id, name, balance`
///
/// ```csv
/// id,name,balance
/// 1,Alice,70
/// 2,Bob,80
/// ```
fn write_accounts<W: Write>(accounts: &[Account], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for account in accounts {
        wtr.serialize(account)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn run_to_string(ledger: &Ledger, command: Command) -> Result<String, String> {
        let mut out = Vec::new();
        run(ledger, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn create_prints_account_with_header() {
        let ledger = Ledger::default();
        let output = run_to_string(
            &ledger,
            Command::Create {
                name: "Alice".to_string(),
                balance: dec!(100),
            },
        )
        .unwrap();

        assert_eq!(output, "id,name,balance\n1,Alice,100\n");
    }

    #[test]
    fn list_is_sorted_by_id() {
        let ledger = Ledger::default();
        for name in ["Carol", "Alice", "Bob"] {
            ledger.create_account(name, dec!(1)).unwrap();
        }

        let output = run_to_string(&ledger, Command::List).unwrap();
        assert_eq!(output, "id,name,balance\n1,Carol,1\n2,Alice,1\n3,Bob,1\n");
    }

    #[test]
    fn transfer_prints_status() {
        let ledger = Ledger::default();
        ledger.create_account("Alice", dec!(100)).unwrap();
        ledger.create_account("Bob", dec!(50)).unwrap();

        let output = run_to_string(
            &ledger,
            Command::Transfer {
                from: AccountId(1),
                to: AccountId(2),
                amount: dec!(30),
            },
        )
        .unwrap();
        assert_eq!(output, "Transfer successful.\n");

        let failure = run_to_string(
            &ledger,
            Command::Transfer {
                from: AccountId(1),
                to: AccountId(2),
                amount: dec!(1000),
            },
        );
        assert_eq!(failure, Err("Insufficient funds.".to_string()));
    }

    #[test]
    fn get_missing_account_fails() {
        let ledger = Ledger::default();
        let result = run_to_string(&ledger, Command::Get { id: AccountId(9) });
        assert_eq!(result, Err("account 9 not found".to_string()));
    }

    #[test]
    fn parses_negative_amounts() {
        let args = Args::try_parse_from(["bank-ledger", "transfer", "1", "2", "-5"]).unwrap();
        match &args.command {
            Command::Transfer { amount, .. } => assert_eq!(*amount, dec!(-5)),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.config().amount_policy, AmountPolicy::Permissive);
    }

    #[test]
    fn parses_log_and_policy_flags() {
        let args = Args::try_parse_from([
            "bank-ledger",
            "--log",
            "/tmp/ledger.txt",
            "--require-positive-amounts",
            "list",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.log_path, PathBuf::from("/tmp/ledger.txt"));
        assert_eq!(config.amount_policy, AmountPolicy::RequirePositive);
    }
}
