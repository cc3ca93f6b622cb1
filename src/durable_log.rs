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

//! Durable snapshot log.
//!
//! The log is a plain text file holding one `id,name,balance` line per
//! account, with no header. Every mutation rewrites the whole file.
//!
//! Lines are written with CSV quoting, so a name that contains a comma or a
//! double quote is quoted and escaped instead of corrupting the record.
//! Names without those characters produce the bare `id,name,balance` form.
//! Names never contain line breaks (the [`Ledger`](crate::Ledger) rejects
//! them), so one account is always one physical line.
//!
//! # Crash safety
//!
//! [`DurableLog::save`] writes the snapshot to a temporary file next to the
//! log, syncs it, then renames it over the log. A crash mid-write leaves the
//! previous snapshot intact.
//!
//! # Recovery
//!
//! [`DurableLog::load`] is tolerant: a missing file is an empty ledger, and
//! lines with the wrong field count or unparseable id/balance are skipped
//! with a warning rather than failing the whole load.
//!
//! Each physical line is decoded on its own. A line is read as CSV only if
//! it is exactly what the writer would have produced for its fields;
//! anything else (hand edits, a stray quote, lines from the plain
//! comma-joined format) is split on every comma instead. A broken quote can
//! therefore never swallow the lines after it.

use crate::account::Account;
use crate::base::AccountId;
use crate::error::PersistenceError;
use crate::id_issuer::IdIssuer;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Writer, WriterBuilder};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Number of fields in a log record: `id`, `name`, `balance`.
const FIELD_COUNT: usize = 3;

/// File-backed snapshot of the account store.
#[derive(Debug, Clone)]
pub struct DurableLog {
    path: PathBuf,
}

impl DurableLog {
    pub const DEFAULT_FILE_NAME: &'static str = "accounts.txt";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the log with one line per account.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the temporary file cannot be
    /// written or renamed. The existing log is left untouched in that case.
    pub fn save<'a, I>(&self, accounts: I) -> Result<(), PersistenceError>
    where
        I: IntoIterator<Item = &'a Account>,
    {
        let mut tmp = NamedTempFile::new_in(self.parent_dir())?;
        let written = write_records(tmp.as_file_mut(), accounts)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!(path = %self.path.display(), accounts = written, "log saved");
        Ok(())
    }

    /// Reads every recoverable account from the log.
    ///
    /// Each recovered id is fed to `issuer`, so ids issued afterwards are
    /// strictly greater than anything on disk. If an id appears on more than
    /// one line, the last line wins.
    ///
    /// # Errors
    ///
    /// Only I/O failures while opening or reading the file are returned.
    /// Malformed lines are skipped.
    pub fn load(&self, issuer: &IdIssuer) -> Result<Vec<Account>, PersistenceError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no log found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let accounts = read_records(BufReader::new(file))?;
        for id in accounts.keys() {
            issuer.observe(*id);
        }
        Ok(accounts.into_values().collect())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl Default for DurableLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILE_NAME)
    }
}

fn line_writer<W: Write>(writer: W) -> Writer<W> {
    WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer)
}

/// Writes accounts as header-less CSV lines. Returns the number written.
fn write_records<'a, W, I>(writer: W, accounts: I) -> Result<usize, PersistenceError>
where
    W: Write,
    I: IntoIterator<Item = &'a Account>,
{
    let mut wtr = line_writer(writer);

    let mut written = 0;
    for account in accounts {
        wtr.write_record([
            account.id().to_string(),
            account.name().to_owned(),
            account.balance().to_string(),
        ])?;
        written += 1;
    }

    wtr.flush()?;
    Ok(written)
}

/// Parses log lines, skipping anything that is not a valid account record.
fn read_records<R: BufRead>(reader: R) -> Result<HashMap<AccountId, Account>, PersistenceError> {
    let mut accounts = HashMap::new();
    let mut skipped = 0usize;

    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let Ok(text) = std::str::from_utf8(line) else {
            warn!(line = index + 1, "skipping log line with invalid UTF-8");
            skipped += 1;
            continue;
        };

        match decode_line(text) {
            Some(account) => {
                accounts.insert(account.id(), account);
            }
            None => {
                warn!(line = index + 1, "skipping malformed log line");
                skipped += 1;
            }
        }
    }

    debug!(recovered = accounts.len(), skipped, "log replayed");
    Ok(accounts)
}

fn decode_line(line: &str) -> Option<Account> {
    let fields = canonical_fields(line)
        .unwrap_or_else(|| line.split(',').map(str::to_owned).collect());
    if fields.len() != FIELD_COUNT {
        return None;
    }
    let id = fields[0].parse::<AccountId>().ok()?;
    let balance = fields[2].parse::<Decimal>().ok()?;
    Some(Account::new(id, fields[1].as_str(), balance))
}

/// Returns the CSV fields of `line` if writing them back reproduces the
/// line byte for byte. Lenient parses such as `"Quoted" Name` or an
/// unterminated quote do not qualify.
fn canonical_fields(line: &str) -> Option<Vec<String>> {
    if !line.contains('"') {
        return None;
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    if !rdr.read_record(&mut record).ok()? {
        return None;
    }

    let mut encoded = Vec::with_capacity(line.len() + 1);
    {
        let mut wtr = line_writer(&mut encoded);
        wtr.write_record(&record).ok()?;
        wtr.flush().ok()?;
    }
    if encoded.strip_suffix(b"\n") != Some(line.as_bytes()) {
        return None;
    }

    Some(record.iter().map(str::to_owned).collect())
}
