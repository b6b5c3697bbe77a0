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

//! Inventory records.
//!
//! Each record tracks two stock counters:
//!
//! ```text
//!            reserve                      fulfill
//!  available ────────► reserved ─────────────────► (sold)
//!      ▲                  │
//!      └──── release ─────┘
//!
//!  available ──deduct──► (sold)
//! ```
//!
//! # Example
//!
//! ```
//! use dispensary_stock::{InventoryRecord, ItemId};
//!
//! let mut record = InventoryRecord::new(ItemId::from("gelato"), "Gelato 41").with_stock(10, 0);
//! record.reserve(4).unwrap();
//! assert_eq!(record.available_stock(), 6);
//! assert_eq!(record.reserved_stock(), 4);
//! ```

use crate::base::{ItemId, Version};
use crate::error::{StockError, StoreError};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which of the two stock counters a shortfall refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockCounter {
    Available,
    Reserved,
}

impl fmt::Display for StockCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Reserved => write!(f, "reserved"),
        }
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

/// One way of selling an item, e.g. "Per Gram" at 12.00 per `g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingOption {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub unit: String,
}

impl PricingOption {
    pub fn new(id: &str, name: &str, price: Decimal, unit: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            unit: unit.to_string(),
        }
    }
}

/// A persisted inventory item with its stock counters.
///
/// Stock counters only change through [`reserve`](Self::reserve),
/// [`fulfill`](Self::fulfill), [`release`](Self::release) and
/// [`deduct`](Self::deduct). Each either applies fully or leaves the record
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub pricing_options: Vec<PricingOption>,
    #[serde(default, deserialize_with = "null_as_zero")]
    available_stock: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    reserved_stock: u32,
    #[serde(default)]
    version: Version,
}

impl InventoryRecord {
    pub fn new(id: ItemId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: String::new(),
            category: String::new(),
            pricing_options: Vec::new(),
            available_stock: 0,
            reserved_stock: 0,
            version: Version::NEW,
        }
    }

    pub fn with_stock(mut self, available: u32, reserved: u32) -> Self {
        self.available_stock = available;
        self.reserved_stock = reserved;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_pricing_option(mut self, option: PricingOption) -> Self {
        self.pricing_options.push(option);
        self
    }

    /// Stamps the version the record was read at. Stores call this on write.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn available_stock(&self) -> u32 {
        self.available_stock
    }

    pub fn reserved_stock(&self) -> u32 {
        self.reserved_stock
    }

    /// Returns `available + reserved`, the physical units on the shelf.
    pub fn total_stock(&self) -> u64 {
        u64::from(self.available_stock) + u64::from(self.reserved_stock)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn pricing_option(&self, option_id: &str) -> Option<&PricingOption> {
        self.pricing_options.iter().find(|option| option.id == option_id)
    }

    /// Checks the shape a store requires before accepting the record.
    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |reason: &str| StoreError::InvalidRecord {
            item_id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.as_str().trim().is_empty() {
            return Err(invalid("missing id"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("missing name"));
        }
        if self.pricing_options.is_empty() {
            return Err(invalid("at least one pricing option is required"));
        }
        if self.pricing_options.iter().any(|option| {
            option.name.trim().is_empty()
                || option.unit.trim().is_empty()
                || option.price <= Decimal::ZERO
        }) {
            return Err(invalid(
                "each pricing option must have a name, positive price, and unit",
            ));
        }
        Ok(())
    }

    fn check_quantity(&self, quantity: u32) -> Result<(), StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity {
                item_id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn shortfall(&self, counter: StockCounter, requested: u32) -> StockError {
        let on_hand = match counter {
            StockCounter::Available => self.available_stock,
            StockCounter::Reserved => self.reserved_stock,
        };
        StockError::InsufficientStock {
            item_id: self.id.clone(),
            name: self.name.clone(),
            counter,
            requested,
            on_hand,
        }
    }

    fn overflow(&self) -> StockError {
        StockError::StockOverflow {
            item_id: self.id.clone(),
        }
    }

    /// Moves units from available to reserved (order creation).
    pub fn reserve(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_quantity(quantity)?;
        let available = self
            .available_stock
            .checked_sub(quantity)
            .ok_or_else(|| self.shortfall(StockCounter::Available, quantity))?;
        let reserved = self
            .reserved_stock
            .checked_add(quantity)
            .ok_or_else(|| self.overflow())?;
        self.available_stock = available;
        self.reserved_stock = reserved;
        Ok(())
    }

    /// Clears reserved units for a completed sale. Available was already
    /// decremented at reservation time.
    pub fn fulfill(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_quantity(quantity)?;
        self.reserved_stock = self
            .reserved_stock
            .checked_sub(quantity)
            .ok_or_else(|| self.shortfall(StockCounter::Reserved, quantity))?;
        Ok(())
    }

    /// Returns reserved units to available (cancellation or rollback).
    pub fn release(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_quantity(quantity)?;
        let reserved = self
            .reserved_stock
            .checked_sub(quantity)
            .ok_or_else(|| self.shortfall(StockCounter::Reserved, quantity))?;
        let available = self
            .available_stock
            .checked_add(quantity)
            .ok_or_else(|| self.overflow())?;
        self.available_stock = available;
        self.reserved_stock = reserved;
        Ok(())
    }

    /// Removes units from available for a sale with no prior reservation.
    pub fn deduct(&mut self, quantity: u32) -> Result<(), StockError> {
        self.check_quantity(quantity)?;
        self.available_stock = self
            .available_stock
            .checked_sub(quantity)
            .ok_or_else(|| self.shortfall(StockCounter::Available, quantity))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(available: u32, reserved: u32) -> InventoryRecord {
        InventoryRecord::new(ItemId::from("gelato"), "Gelato 41")
            .with_category("Flower")
            .with_pricing_option(PricingOption::new("g", "Per Gram", dec!(12.00), "g"))
            .with_stock(available, reserved)
    }

    #[test]
    fn reserve_moves_available_to_reserved() {
        let mut item = record(10, 0);
        item.reserve(4).unwrap();
        assert_eq!(item.available_stock(), 6);
        assert_eq!(item.reserved_stock(), 4);
    }

    #[test]
    fn fulfill_only_touches_reserved() {
        let mut item = record(6, 4);
        item.fulfill(4).unwrap();
        assert_eq!(item.available_stock(), 6);
        assert_eq!(item.reserved_stock(), 0);
    }

    #[test]
    fn release_moves_reserved_to_available() {
        let mut item = record(3, 4);
        item.release(4).unwrap();
        assert_eq!(item.available_stock(), 7);
        assert_eq!(item.reserved_stock(), 0);
    }

    #[test]
    fn deduct_only_touches_available() {
        let mut item = record(10, 2);
        item.deduct(2).unwrap();
        assert_eq!(item.available_stock(), 8);
        assert_eq!(item.reserved_stock(), 2);
    }

    #[test]
    fn reserve_insufficient_leaves_record_unchanged() {
        let mut item = record(5, 0);
        let result = item.reserve(6);
        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                item_id: ItemId::from("gelato"),
                name: "Gelato 41".to_string(),
                counter: StockCounter::Available,
                requested: 6,
                on_hand: 5,
            })
        );
        assert_eq!(item, record(5, 0));
    }

    #[test]
    fn release_insufficient_reserved_returns_error() {
        let mut item = record(3, 4);
        let result = item.release(5);
        assert!(matches!(
            result,
            Err(StockError::InsufficientStock {
                counter: StockCounter::Reserved,
                ..
            })
        ));
        assert_eq!(item, record(3, 4));
    }

    #[test]
    fn fulfill_without_reservation_is_rejected() {
        let mut item = record(10, 0);
        assert!(item.fulfill(1).is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut item = record(10, 0);
        assert_eq!(
            item.reserve(0),
            Err(StockError::InvalidQuantity {
                item_id: ItemId::from("gelato")
            })
        );
    }

    #[test]
    fn release_overflow_is_reported() {
        let mut item = record(u32::MAX, 1);
        assert_eq!(
            item.release(1),
            Err(StockError::StockOverflow {
                item_id: ItemId::from("gelato")
            })
        );
        assert_eq!(item.reserved_stock(), 1);
    }

    #[test]
    fn total_stock_does_not_overflow() {
        let item = record(u32::MAX, u32::MAX);
        assert_eq!(item.total_stock(), 2 * u64::from(u32::MAX));
    }

    // === Validation ===

    #[test]
    fn validate_accepts_complete_record() {
        assert_eq!(record(1, 0).validate(), Ok(()));
    }

    #[test]
    fn validate_requires_pricing_option() {
        let item = InventoryRecord::new(ItemId::from("x"), "Pre-roll");
        assert!(matches!(
            item.validate(),
            Err(StoreError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_positive_price() {
        let item = InventoryRecord::new(ItemId::from("x"), "Pre-roll")
            .with_pricing_option(PricingOption::new("p", "Per Piece", dec!(0), "piece"));
        assert!(item.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let item = InventoryRecord::new(ItemId::from("x"), "  ")
            .with_pricing_option(PricingOption::new("p", "Per Piece", dec!(5), "piece"));
        assert!(item.validate().is_err());
    }

    #[test]
    fn deserializes_missing_counters_as_zero() {
        let json = r#"{"id":"x","name":"Pre-roll","pricing_options":[]}"#;
        let item: InventoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(item.available_stock(), 0);
        assert_eq!(item.reserved_stock(), 0);
        assert_eq!(item.version(), Version::NEW);
    }

    #[test]
    fn deserializes_null_reserved_as_zero() {
        let json = r#"{"id":"x","name":"Pre-roll","available_stock":3,"reserved_stock":null}"#;
        let item: InventoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(item.available_stock(), 3);
        assert_eq!(item.reserved_stock(), 0);
    }

    #[test]
    fn pricing_option_lookup() {
        let item = record(1, 0);
        assert_eq!(item.pricing_option("g").unwrap().unit, "g");
        assert!(item.pricing_option("oz").is_none());
    }
}
