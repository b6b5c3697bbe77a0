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

//! Checkout: carts, totals and completed sales.
//!
//! Totals follow the till's arithmetic:
//!
//! ```text
//! subtotal        = Σ price × quantity
//! discount_amount = subtotal × tier discount rate
//! tax_amount      = (subtotal - discount_amount) × tax rate
//! final_total     = subtotal - discount_amount + tax_amount
//! ```
//!
//! Intermediate values are exact; each stored figure is rounded to cents.
//! Arithmetic is checked, so an overflowing total is an error, never a panic.

use crate::adjustment::StockLine;
use crate::base::{MemberUid, OrderId, SaleId};
use crate::config::PricingConfig;
use crate::error::{OrderError, StockError};
use crate::item::{InventoryRecord, StockCounter};
use crate::order::{self, OrderLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Loyalty tier of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberTier {
    Basic,
    Gold,
    Supreme,
}

/// The parts of a member record checkout needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub uid: MemberUid,
    pub name: String,
    pub tier: MemberTier,
    #[serde(default)]
    pub total_purchases: Decimal,
}

impl Member {
    pub fn new(uid: MemberUid, name: &str, tier: MemberTier) -> Self {
        Self {
            uid,
            name: name.to_string(),
            tier,
            total_purchases: Decimal::ZERO,
        }
    }

    /// Adds a completed sale to the member's running purchase total.
    pub fn record_purchase(&mut self, sale: &Sale) {
        self.total_purchases = self
            .total_purchases
            .saturating_add(sale.totals.final_total)
            .round_dp(2);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    QrCode,
    Crypto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount_rate: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub final_total: Decimal,
}

impl Totals {
    /// # Errors
    ///
    /// - [`OrderError::PriceOverflow`] - a line subtotal or their sum overflows.
    /// - [`OrderError::TotalOverflow`] - discount or tax arithmetic overflows.
    pub fn compute(
        lines: &[OrderLine],
        tier: Option<MemberTier>,
        pricing: &PricingConfig,
    ) -> Result<Self, OrderError> {
        let subtotal = order::lines_subtotal(lines)?;
        let discount_rate = pricing.discount_rate(tier);
        let discount_amount = subtotal
            .checked_mul(discount_rate)
            .ok_or(OrderError::TotalOverflow)?;
        let after_discount = subtotal
            .checked_sub(discount_amount)
            .ok_or(OrderError::TotalOverflow)?;
        let tax_amount = after_discount
            .checked_mul(pricing.tax_rate)
            .ok_or(OrderError::TotalOverflow)?;
        let final_total = after_discount
            .checked_add(tax_amount)
            .ok_or(OrderError::TotalOverflow)?;

        Ok(Self {
            subtotal: subtotal.round_dp(2),
            discount_rate,
            discount_amount: discount_amount.round_dp(2),
            tax_amount: tax_amount.round_dp(2),
            final_total: final_total.round_dp(2),
        })
    }
}

/// A completed sale, either direct or from a fulfilled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub member_uid: Option<MemberUid>,
    /// Set when the sale fulfilled a pending order.
    pub order_id: Option<OrderId>,
    pub items: Vec<OrderLine>,
    #[serde(flatten)]
    pub totals: Totals,
    pub payment_method: PaymentMethod,
}

/// Items being rung up at the till.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<OrderLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<OrderLine>) -> Self {
        Self { lines }
    }

    /// Adds `quantity` of an item priced with one of its options.
    ///
    /// Quantities already in the cart for the same item count against the
    /// record's available stock.
    pub fn add_item(
        &mut self,
        record: &InventoryRecord,
        option_id: &str,
        quantity: u32,
    ) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity {
                item_id: record.id().clone(),
            }
            .into());
        }
        let option = record
            .pricing_option(option_id)
            .ok_or_else(|| OrderError::UnknownPricingOption {
                item_id: record.id().clone(),
                option_id: option_id.to_string(),
            })?;

        let in_cart: u32 = self
            .lines
            .iter()
            .filter(|line| &line.item_id == record.id())
            .fold(0u32, |total, line| total.saturating_add(line.quantity));
        let remaining = record.available_stock().saturating_sub(in_cart);
        if quantity > remaining {
            return Err(StockError::InsufficientStock {
                item_id: record.id().clone(),
                name: record.name.clone(),
                counter: StockCounter::Available,
                requested: quantity,
                on_hand: remaining,
            }
            .into());
        }

        self.lines.push(OrderLine {
            item_id: record.id().clone(),
            name: record.name.clone(),
            quantity,
            price: option.price,
            unit: option.unit.clone(),
            category: record.category.clone(),
            selected_option_id: option.id.clone(),
        });
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<OrderLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.lines.iter().map(OrderLine::stock_line).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<OrderLine> {
        self.lines
    }
}
