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

//! Stock adjustments.
//!
//! | Adjustment | available | reserved | Fails when |
//! |------------|-----------|----------|------------|
//! | [`Reserve`](StockAdjustment::Reserve) | `- q` | `+ q` | available < q |
//! | [`Fulfill`](StockAdjustment::Fulfill) | - | `- q` | reserved < q |
//! | [`Release`](StockAdjustment::Release) | `+ q` | `- q` | reserved < q |
//! | [`Deduct`](StockAdjustment::Deduct) | `- q` | - | available < q |

use crate::base::ItemId;
use crate::error::StockError;
use crate::item::InventoryRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One `(item, quantity)` entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl StockLine {
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAdjustment {
    /// Order creation.
    Reserve,
    /// Order converted into a sale.
    Fulfill,
    /// Order cancelled, deleted, or rolled back.
    Release,
    /// Direct sale without an order.
    Deduct,
}

impl StockAdjustment {
    pub const ALL: [StockAdjustment; 4] = [
        StockAdjustment::Reserve,
        StockAdjustment::Fulfill,
        StockAdjustment::Release,
        StockAdjustment::Deduct,
    ];

    /// Applies one line to a record. On error the record is unchanged.
    pub fn apply(self, record: &mut InventoryRecord, quantity: u32) -> Result<(), StockError> {
        match self {
            Self::Reserve => record.reserve(quantity),
            Self::Fulfill => record.fulfill(quantity),
            Self::Release => record.release(quantity),
            Self::Deduct => record.deduct(quantity),
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Reserve => "Stock reserved successfully.",
            Self::Fulfill => "Stock fulfilled successfully.",
            Self::Release => "Stock released successfully.",
            Self::Deduct => "Stock deducted successfully.",
        }
    }
}

impl fmt::Display for StockAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reserve => "reserve",
            Self::Fulfill => "fulfill",
            Self::Release => "release",
            Self::Deduct => "deduct",
        };
        f.write_str(name)
    }
}

impl FromStr for StockAdjustment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reserve" => Ok(Self::Reserve),
            "fulfill" => Ok(Self::Fulfill),
            "release" => Ok(Self::Release),
            "deduct" | "sale" => Ok(Self::Deduct),
            other => Err(format!("unknown stock adjustment '{other}'")),
        }
    }
}
