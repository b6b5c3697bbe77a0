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

//! # Dispensary Stock
//!
//! This library provides the stock bookkeeping behind a dispensary
//! point-of-sale: reserving stock for pending orders, fulfilling or releasing
//! those reservations, and deducting stock for direct sales.
//!
//! ## Core Components
//!
//! - [`StockLedger`]: Applies stock adjustment batches against an inventory store
//! - [`InventoryRecord`]: Inventory item with available and reserved counters
//! - [`StockAdjustment`]: Supported adjustments (reserve, fulfill, release, deduct)
//! - [`InventoryStore`]: Persistence seam, with the in-memory [`MemoryStore`]
//! - [`PointOfSale`]: Order and sale workflows driving the ledger
//! - [`StockError`]: Error types for stock adjustment failures
//!
//! ## Example
//!
//! ```
//! use dispensary_stock::{InventoryRecord, ItemId, MemoryStore, PricingOption, StockLedger, StockLine};
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//!
//! let item = InventoryRecord::new(ItemId::from("gelato"), "Gelato 41")
//!     .with_pricing_option(PricingOption::new("g", "Per Gram", dec!(12.00), "g"))
//!     .with_stock(10, 0);
//! let ledger = StockLedger::new(Arc::new(MemoryStore::with_records(vec![item]).unwrap()));
//!
//! // Reserve stock for an order
//! let snapshot = ledger.snapshot().unwrap();
//! let update = ledger.reserve(&[StockLine::new("gelato", 4)], &snapshot).unwrap();
//!
//! assert_eq!(update.records[0].available_stock(), 6);
//! assert_eq!(update.records[0].reserved_stock(), 4);
//! ```
//!
//! ## Thread Safety
//!
//! Stores are shared behind `Arc`. Every record carries a version and the
//! store rejects writes computed from a stale snapshot, so concurrent
//! adjustments of the same item cannot silently overwrite each other.

mod adjustment;
mod base;
pub mod checkout;
pub mod config;
pub mod error;
pub mod item;
mod ledger;
pub mod order;
pub mod report;
pub mod store;
mod workflow;

pub use adjustment::{StockAdjustment, StockLine};
pub use base::{ItemId, MemberUid, OrderId, SaleId, Version};
pub use checkout::{Cart, Member, MemberTier, PaymentMethod, Sale, Totals};
pub use config::PricingConfig;
pub use error::{ConfigError, OrderError, StockError, StoreError};
pub use item::{InventoryRecord, PricingOption, StockCounter};
pub use ledger::{StockLedger, StockUpdate};
pub use order::{Order, OrderBook, OrderLine, OrderStatus, OrderStore};
pub use report::{SalesReport, StockSummary};
pub use store::{InventoryStore, MemoryStore};
pub use workflow::{Checkout, NewOrder, PointOfSale};
