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

//! Pending orders.
//!
//! Orders follow a small state machine:
//! - [`Pending`](OrderStatus::Pending) → [`Fulfilled`](OrderStatus::Fulfilled)
//!   (loaded into checkout and paid)
//! - [`Pending`](OrderStatus::Pending) → [`Cancelled`](OrderStatus::Cancelled)
//!
//! Only pending orders live in an [`OrderStore`]; fulfilled and cancelled
//! orders are removed from it.

use crate::adjustment::StockLine;
use crate::base::{ItemId, MemberUid, OrderId};
use crate::error::OrderError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
}

/// One item of an order, priced with the option chosen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub unit: String,
    #[serde(default)]
    pub category: String,
    pub selected_option_id: String,
}

impl OrderLine {
    /// Price times quantity; `None` when the product overflows.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    pub fn stock_line(&self) -> StockLine {
        StockLine::new(self.item_id.clone(), self.quantity)
    }
}

/// Sum of the lines' subtotals, unrounded.
pub fn lines_subtotal(lines: &[OrderLine]) -> Result<Decimal, OrderError> {
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        line.subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| OrderError::PriceOverflow {
                item_id: line.item_id.clone(),
            })
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub member_uid: MemberUid,
    pub items: Vec<OrderLine>,
    pub total_price: Decimal,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Creates a pending order; the total is the sum of line subtotals,
    /// rounded to cents.
    ///
    /// # Errors
    ///
    /// [`OrderError::PriceOverflow`] when the total does not fit a decimal.
    pub fn new(
        id: OrderId,
        member_uid: MemberUid,
        items: Vec<OrderLine>,
    ) -> Result<Self, OrderError> {
        let total_price = lines_subtotal(&items)?.round_dp(2);
        Ok(Self {
            id,
            member_uid,
            items,
            total_price,
            comment: None,
            status: OrderStatus::Pending,
        })
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.items.iter().map(OrderLine::stock_line).collect()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Persistent order table.
pub trait OrderStore: Send + Sync {
    /// Stores a new order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::DuplicateOrder`] if the id is already taken.
    fn insert(&self, order: Order) -> Result<(), OrderError>;

    fn get(&self, id: &OrderId) -> Result<Option<Order>, OrderError>;

    /// Removes an order, returning it if it existed.
    fn remove(&self, id: &OrderId) -> Result<Option<Order>, OrderError>;

    /// Lists stored orders in insertion order.
    fn list(&self) -> Result<Vec<Order>, OrderError>;

    /// Lists pending orders of one member in insertion order.
    fn pending_for_member(&self, member_uid: &MemberUid) -> Result<Vec<Order>, OrderError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|order| order.is_pending() && &order.member_uid == member_uid)
            .collect())
    }
}

/// A thread-safe in-memory order table with duplicate detection.
///
/// Each order is stamped with a sequence number on insert so listings keep
/// insertion order.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: DashMap<OrderId, (u64, Order)>,
    sequence: AtomicU64,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl OrderStore for OrderBook {
    fn insert(&self, order: Order) -> Result<(), OrderError> {
        // Entry API for atomic check-and-insert.
        match self.orders.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(OrderError::DuplicateOrder(order.id)),
            Entry::Vacant(entry) => {
                let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
                entry.insert((sequence, order));
                Ok(())
            }
        }
    }

    fn get(&self, id: &OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.get(id).map(|entry| entry.value().1.clone()))
    }

    fn remove(&self, id: &OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.remove(id).map(|(_, (_, order))| order))
    }

    fn list(&self) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<(u64, Order)> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|(sequence, _)| *sequence);
        Ok(orders.into_iter().map(|(_, order)| order).collect())
    }
}
