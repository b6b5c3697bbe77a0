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

//! Inventory record persistence.
//!
//! [`InventoryStore`] is the seam to whatever database holds the inventory
//! table. [`MemoryStore`] is the in-process implementation used by the CLI,
//! the demo server and the tests.
//!
//! Writes are version checked: a record is only replaced if the caller read
//! it at the version currently stored. A batch is validated and checked as a
//! whole before anything is written.

use crate::base::{ItemId, Version};
use crate::error::StoreError;
use crate::item::InventoryRecord;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Persistent inventory table keyed by item id.
pub trait InventoryStore: Send + Sync {
    /// Reads every record.
    fn fetch_all(&self) -> Result<Vec<InventoryRecord>, StoreError>;

    /// Reads one record.
    fn get(&self, id: &ItemId) -> Result<Option<InventoryRecord>, StoreError>;

    /// Inserts records that are absent and replaces those that are present,
    /// keyed by id. Returns the records as written, with their new versions.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidRecord`] - a record fails shape validation or an
    ///   id appears twice in the batch.
    /// - [`StoreError::VersionConflict`] - a record was read at a stale version.
    /// - [`StoreError::Unavailable`] - the backend failed.
    fn bulk_upsert(&self, records: Vec<InventoryRecord>)
    -> Result<Vec<InventoryRecord>, StoreError>;

    /// Removes a record. Returns whether it existed.
    fn delete(&self, id: &ItemId) -> Result<bool, StoreError>;
}

/// In-memory inventory table.
///
/// A single mutex guards the whole table so a batch is checked and applied
/// atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<ItemId, InventoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with new records.
    pub fn with_records(records: Vec<InventoryRecord>) -> Result<Self, StoreError> {
        let store = Self::new();
        store.bulk_upsert(records)?;
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl InventoryStore for MemoryStore {
    fn fetch_all(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn get(&self, id: &ItemId) -> Result<Option<InventoryRecord>, StoreError> {
        Ok(self.records.lock().get(id).cloned())
    }

    fn bulk_upsert(
        &self,
        records: Vec<InventoryRecord>,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut table = self.records.lock();

        check_batch(&table, &records)?;

        let written: Vec<InventoryRecord> = records
            .into_iter()
            .map(|record| {
                let next = record.version().next();
                record.with_version(next)
            })
            .collect();
        for record in &written {
            table.insert(record.id().clone(), record.clone());
        }
        debug!(records = written.len(), "inventory upserted");

        Ok(written)
    }

    fn delete(&self, id: &ItemId) -> Result<bool, StoreError> {
        Ok(self.records.lock().remove(id).is_some())
    }
}

/// Validates a batch against the current table without writing anything.
fn check_batch(
    table: &BTreeMap<ItemId, InventoryRecord>,
    records: &[InventoryRecord],
) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.id()) {
            return Err(StoreError::InvalidRecord {
                item_id: record.id().clone(),
                reason: "duplicate id in batch".to_string(),
            });
        }
        let actual = table
            .get(record.id())
            .map(InventoryRecord::version)
            .unwrap_or(Version::NEW);
        if record.version() != actual {
            return Err(StoreError::VersionConflict {
                item_id: record.id().clone(),
                expected: record.version(),
                actual,
            });
        }
    }
    Ok(())
}
