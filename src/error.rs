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

//! Error types for stock adjustment, persistence and order workflows.

use crate::base::{ItemId, OrderId, Version};
use crate::item::StockCounter;
use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by an [`InventoryStore`](crate::store::InventoryStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record failed shape validation (id, name, pricing options)
    #[error("invalid inventory record {item_id}: {reason}")]
    InvalidRecord { item_id: ItemId, reason: String },

    /// Record was computed from a snapshot that is no longer current
    #[error("inventory record {item_id} changed since it was read (expected {expected}, found {actual})")]
    VersionConflict {
        item_id: ItemId,
        expected: Version,
        actual: Version,
    },

    /// Backend could not be reached or refused the write
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Stock adjustment errors.
///
/// Every variant aborts the whole batch. Only [`StockError::Store`] is raised
/// after a write was attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    /// Line references an item absent from the snapshot
    #[error("item with id {item_id} not found")]
    NotFound { item_id: ItemId },

    /// Candidate counter value would go negative
    #[error(
        "not enough {counter} stock for {name} ({item_id}): requested {requested}, on hand {on_hand}"
    )]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        counter: StockCounter,
        requested: u32,
        on_hand: u32,
    },

    /// Quantity is zero
    #[error("invalid quantity for item {item_id} (must be positive)")]
    InvalidQuantity { item_id: ItemId },

    /// Candidate counter value would exceed the counter range
    #[error("stock counter overflow for item {item_id}")]
    StockOverflow { item_id: ItemId },

    /// Bulk upsert itself failed
    #[error("failed to update stock: {0}")]
    Store(#[from] StoreError),
}

/// Order and checkout workflow errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Order or cart has no lines
    #[error("at least one item is required")]
    EmptyOrder,

    /// Order was submitted without a member UID
    #[error("a member UID is required for an order")]
    MissingMember,

    /// Referenced order does not exist
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// Order id already taken
    #[error("duplicate order ID {0}")]
    DuplicateOrder(OrderId),

    /// Order is no longer pending
    #[error("order {0} is not pending")]
    NotPending(OrderId),

    /// Stock adjustment rejected the order's lines
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Pricing option chosen for a cart line does not exist on the item
    #[error("item {item_id} has no pricing option {option_id}")]
    UnknownPricingOption { item_id: ItemId, option_id: String },

    /// Order line price differs from the item's current option price
    #[error("price {actual} for item {item_id} option {option_id} does not match current price {expected}")]
    PriceMismatch {
        item_id: ItemId,
        option_id: String,
        expected: Decimal,
        actual: Decimal,
    },

    /// A line subtotal or a total does not fit a decimal
    #[error("amount for item {item_id} is too large")]
    PriceOverflow { item_id: ItemId },

    /// Discount or tax pushed the total past what a decimal holds
    #[error("order total is too large")]
    TotalOverflow,

    /// Order was deleted but its reserved stock could not be returned
    #[error("order {order_id} deleted, but failed to release stock: {source}. Check inventory manually")]
    StockNotReleased {
        order_id: OrderId,
        source: StockError,
    },

    /// A step failed and the action undoing the earlier steps failed too
    #[error("{cause}; compensating action also failed: {compensation}. Check inventory manually")]
    CompensationFailed {
        cause: Box<OrderError>,
        compensation: Box<OrderError>,
    },

    /// Order backend could not be reached or refused the write
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Pricing configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration is not valid JSON for the expected shape
    #[error("invalid pricing configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A rate is outside its allowed range
    #[error("invalid pricing configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            StockError::NotFound {
                item_id: ItemId::from("gelato")
            }
            .to_string(),
            "item with id gelato not found"
        );
        assert_eq!(
            StockError::InsufficientStock {
                item_id: ItemId::from("gelato"),
                name: "Gelato 41".to_string(),
                counter: StockCounter::Available,
                requested: 6,
                on_hand: 5,
            }
            .to_string(),
            "not enough available stock for Gelato 41 (gelato): requested 6, on hand 5"
        );
        assert_eq!(
            StockError::InvalidQuantity {
                item_id: ItemId::from("gelato")
            }
            .to_string(),
            "invalid quantity for item gelato (must be positive)"
        );
        assert_eq!(
            StockError::Store(StoreError::Unavailable("timeout".to_string())).to_string(),
            "failed to update stock: inventory store unavailable: timeout"
        );
        assert_eq!(
            StoreError::VersionConflict {
                item_id: ItemId::from("gelato"),
                expected: Version(1),
                actual: Version(2),
            }
            .to_string(),
            "inventory record gelato changed since it was read (expected v1, found v2)"
        );
        assert_eq!(OrderError::EmptyOrder.to_string(), "at least one item is required");
        assert_eq!(
            OrderError::PriceOverflow {
                item_id: ItemId::from("gelato")
            }
            .to_string(),
            "amount for item gelato is too large"
        );
        assert_eq!(
            OrderError::NotPending(OrderId::from("o-9")).to_string(),
            "order o-9 is not pending"
        );
    }

    #[test]
    fn compensation_failure_names_both_causes() {
        let error = OrderError::CompensationFailed {
            cause: Box::new(OrderError::Unavailable("insert refused".to_string())),
            compensation: Box::new(OrderError::Stock(StockError::NotFound {
                item_id: ItemId::from("gelato"),
            })),
        };
        let message = error.to_string();
        assert!(message.contains("insert refused"));
        assert!(message.contains("item with id gelato not found"));
    }

    #[test]
    fn errors_are_cloneable() {
        let error = StockError::Store(StoreError::Unavailable("down".to_string()));
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
