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

//! Stock adjustment ledger.
//!
//! The [`StockLedger`] turns a batch of [`StockLine`]s into updated
//! inventory records and persists them with a single bulk upsert.
//!
//! # Batch Processing
//!
//! 1. Each line's record is looked up in the caller's snapshot.
//! 2. The adjustment is applied to a working copy. Lines naming the same item
//!    accumulate on that copy.
//! 3. Any lookup or arithmetic failure aborts the batch before the store is
//!    touched.
//! 4. The modified records are written with one
//!    [`bulk_upsert`](InventoryStore::bulk_upsert). Records carry the version
//!    they were read at, so a stale snapshot is rejected by the store instead
//!    of silently overwriting newer stock.

use crate::adjustment::{StockAdjustment, StockLine};
use crate::base::ItemId;
use crate::error::StockError;
use crate::item::InventoryRecord;
use crate::store::InventoryStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a persisted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUpdate {
    pub adjustment: StockAdjustment,
    /// Records as written by the store.
    pub records: Vec<InventoryRecord>,
    pub message: &'static str,
}

/// Applies stock adjustments against an [`InventoryStore`].
///
/// # Invariants
///
/// - `available_stock` and `reserved_stock` never go negative.
/// - Reserve followed by the matching Release leaves `available + reserved`
///   unchanged.
/// - A batch is persisted entirely or not at all.
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn InventoryStore>,
}

impl StockLedger {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn InventoryStore> {
        &self.store
    }

    /// Reads the current inventory to use as the snapshot for later batches.
    pub fn snapshot(&self) -> Result<Vec<InventoryRecord>, StockError> {
        Ok(self.store.fetch_all()?)
    }

    /// Computes the records a batch would write, without writing them.
    ///
    /// Returns one record per distinct item, in first-seen order.
    ///
    /// # Errors
    ///
    /// - [`StockError::NotFound`] - a line's item is not in the snapshot.
    /// - [`StockError::InsufficientStock`] - a counter would go negative.
    /// - [`StockError::InvalidQuantity`] - a line has quantity zero.
    /// - [`StockError::StockOverflow`] - a counter would exceed `u32::MAX`.
    pub fn plan(
        adjustment: StockAdjustment,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<Vec<InventoryRecord>, StockError> {
        let index: HashMap<&ItemId, &InventoryRecord> =
            snapshot.iter().map(|record| (record.id(), record)).collect();

        let mut working: Vec<InventoryRecord> = Vec::with_capacity(lines.len());
        let mut positions: HashMap<ItemId, usize> = HashMap::with_capacity(lines.len());

        for line in lines {
            let position = match positions.get(&line.item_id) {
                Some(&position) => position,
                None => {
                    let record = index.get(&line.item_id).ok_or_else(|| StockError::NotFound {
                        item_id: line.item_id.clone(),
                    })?;
                    working.push((*record).clone());
                    positions.insert(line.item_id.clone(), working.len() - 1);
                    working.len() - 1
                }
            };
            adjustment.apply(&mut working[position], line.quantity)?;
        }

        Ok(working)
    }

    /// Plans and persists a batch.
    pub fn apply(
        &self,
        adjustment: StockAdjustment,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<StockUpdate, StockError> {
        let planned = Self::plan(adjustment, lines, snapshot).inspect_err(|error| {
            warn!(%adjustment, lines = lines.len(), %error, "stock batch rejected");
        })?;

        let records = if planned.is_empty() {
            Vec::new()
        } else {
            self.bulk_update(planned).inspect_err(|error| {
                warn!(%adjustment, %error, "stock batch not persisted");
            })?
        };

        debug!(%adjustment, items = records.len(), "stock batch persisted");
        Ok(StockUpdate {
            adjustment,
            records,
            message: adjustment.success_message(),
        })
    }

    /// Reserves stock for a new order: `available -= q`, `reserved += q`.
    pub fn reserve(
        &self,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<StockUpdate, StockError> {
        self.apply(StockAdjustment::Reserve, lines, snapshot)
    }

    /// Fulfills reserved stock when an order becomes a sale: `reserved -= q`.
    pub fn fulfill(
        &self,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<StockUpdate, StockError> {
        self.apply(StockAdjustment::Fulfill, lines, snapshot)
    }

    /// Releases reserved stock back to available: `available += q`,
    /// `reserved -= q`.
    pub fn release(
        &self,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<StockUpdate, StockError> {
        self.apply(StockAdjustment::Release, lines, snapshot)
    }

    /// Deducts stock for a direct sale: `available -= q`.
    pub fn deduct(
        &self,
        lines: &[StockLine],
        snapshot: &[InventoryRecord],
    ) -> Result<StockUpdate, StockError> {
        self.apply(StockAdjustment::Deduct, lines, snapshot)
    }

    /// Persists records as given. No stock invariants are checked here.
    pub fn bulk_update(
        &self,
        records: Vec<InventoryRecord>,
    ) -> Result<Vec<InventoryRecord>, StockError> {
        Ok(self.store.bulk_upsert(records)?)
    }
}
