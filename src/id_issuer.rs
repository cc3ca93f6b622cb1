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

//! Monotonic account id issuance.

use crate::base::AccountId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out unique, strictly increasing account ids.
///
/// The issuer tracks the highest id it has issued or observed. A fresh
/// issuer starts at zero, so the first id is 1. During log replay every
/// recovered id is passed to [`observe`](Self::observe), which guarantees
/// ids issued after a restart never collide with persisted ones.
#[derive(Debug, Default)]
pub struct IdIssuer {
    high_water: AtomicU64,
}

impl IdIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `previous max + 1` and records it as the new max.
    pub fn next(&self) -> AccountId {
        AccountId(self.high_water.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Raises the high-water mark to at least `id`. Lower ids are ignored.
    pub fn observe(&self, id: AccountId) {
        self.high_water.fetch_max(id.0, Ordering::SeqCst);
    }

    /// Highest id issued or observed so far (0 if none).
    pub fn current(&self) -> AccountId {
        AccountId(self.high_water.load(Ordering::SeqCst))
    }
}
