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

//! Order and sale workflows.
//!
//! [`PointOfSale`] is the application state handlers work against. It calls
//! the [`StockLedger`] at each point of an order's life:
//!
//! | Workflow | Stock | Order | If a later step fails |
//! |----------|-------|-------|-----------------------|
//! | create order | reserve | insert | release the reservation |
//! | cancel order | release | remove | put the order back |
//! | delete order | release | remove | report stock stuck in reserved |
//! | fulfill order | fulfill | remove | put the order back |
//! | direct sale | deduct | - | - |
//!
//! Compensation is best effort. When it fails too, both errors are returned
//! in [`OrderError::CompensationFailed`] and nothing further is attempted.

use crate::adjustment::StockLine;
use crate::base::{MemberUid, OrderId, SaleId};
use crate::checkout::{Cart, Member, PaymentMethod, Sale, Totals};
use crate::config::PricingConfig;
use crate::error::OrderError;
use crate::item::InventoryRecord;
use crate::ledger::{StockLedger, StockUpdate};
use crate::order::{Order, OrderLine, OrderStatus, OrderStore};
use crate::store::InventoryStore;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Request to place a pending order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<OrderId>,
    pub member_uid: MemberUid,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A completed checkout.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub sale: Sale,
    pub stock: StockUpdate,
}

/// Point-of-sale application state.
pub struct PointOfSale {
    ledger: StockLedger,
    orders: Arc<dyn OrderStore>,
    pricing: PricingConfig,
    sales: Mutex<Vec<Sale>>,
}

impl PointOfSale {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        orders: Arc<dyn OrderStore>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            ledger: StockLedger::new(inventory),
            orders,
            pricing,
            sales: Mutex::new(Vec::new()),
        }
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    pub fn orders(&self) -> &Arc<dyn OrderStore> {
        &self.orders
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Sales recorded so far, oldest first.
    pub fn sales(&self) -> Vec<Sale> {
        self.sales.lock().clone()
    }

    /// Reserves stock for the order's lines, then stores the order.
    ///
    /// Each line's option and price are checked against the item's current
    /// pricing before anything is reserved. If the order cannot be stored the
    /// reservation is released again.
    ///
    /// # Errors
    ///
    /// - [`OrderError::MissingMember`] / [`OrderError::EmptyOrder`] - invalid request.
    /// - [`OrderError::UnknownPricingOption`] / [`OrderError::PriceMismatch`] /
    ///   [`OrderError::PriceOverflow`] - a line is mispriced; nothing changed.
    /// - [`OrderError::Stock`] - the reservation was rejected; nothing changed.
    /// - Any order store error, after the reservation was released.
    /// - [`OrderError::CompensationFailed`] - the release failed as well.
    pub fn create_order(&self, request: NewOrder) -> Result<Order, OrderError> {
        if request.member_uid.0.trim().is_empty() {
            return Err(OrderError::MissingMember);
        }
        if request.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let id = request.id.unwrap_or_else(OrderId::generate);
        let mut order = Order::new(id, request.member_uid, request.items)?;
        order.comment = request.comment;
        let lines = order.stock_lines();

        let snapshot = self.ledger.snapshot()?;
        check_prices(&order.items, &snapshot)?;
        let reservation = self.ledger.reserve(&lines, &snapshot)?;

        if let Err(cause) = self.orders.insert(order.clone()) {
            // Released against the records as the reservation wrote them.
            return match self.ledger.release(&lines, &reservation.records) {
                Ok(_) => {
                    warn!(order_id = %order.id, error = %cause, "order not stored, reservation released");
                    Err(cause)
                }
                Err(compensation) => {
                    error!(
                        order_id = %order.id,
                        error = %cause,
                        %compensation,
                        "order not stored and reservation could not be released"
                    );
                    Err(OrderError::CompensationFailed {
                        cause: Box::new(cause),
                        compensation: Box::new(compensation.into()),
                    })
                }
            };
        }

        info!(order_id = %order.id, member = %order.member_uid, total = %order.total_price, "order created");
        Ok(order)
    }

    /// Cancels a pending order and returns its reserved stock to available.
    ///
    /// If the stock cannot be released the order stays pending.
    pub fn cancel_order(&self, id: &OrderId) -> Result<Order, OrderError> {
        let mut order = self.claim_pending(id)?;

        if let Err(cause) = self.release_lines(&order.stock_lines()) {
            return Err(self.restore(order, cause));
        }

        order.status = OrderStatus::Cancelled;
        info!(order_id = %order.id, "order cancelled, stock released");
        Ok(order)
    }

    /// Removes an order outright. A pending order's reserved stock is then
    /// released; if that fails the order stays deleted and the failure is
    /// reported.
    pub fn delete_order(&self, id: &OrderId) -> Result<Order, OrderError> {
        let order = self
            .orders
            .remove(id)?
            .ok_or_else(|| OrderError::OrderNotFound(id.clone()))?;

        if order.is_pending() {
            let released = self
                .ledger
                .snapshot()
                .and_then(|snapshot| self.ledger.release(&order.stock_lines(), &snapshot));
            if let Err(source) = released {
                error!(order_id = %order.id, error = %source, "order deleted but stock not released");
                return Err(OrderError::StockNotReleased {
                    order_id: order.id,
                    source,
                });
            }
        }

        info!(order_id = %order.id, "order deleted");
        Ok(order)
    }

    /// Converts a pending order into a sale: clears its reserved stock and
    /// records the sale.
    ///
    /// Totals are computed before any stock is written. If they overflow, or
    /// the reserved stock cannot be fulfilled, the order stays pending.
    pub fn fulfill_order(
        &self,
        id: &OrderId,
        member: Option<&Member>,
        payment_method: PaymentMethod,
    ) -> Result<Checkout, OrderError> {
        let order = self.claim_pending(id)?;
        let lines = order.stock_lines();

        let tier = member.map(|member| member.tier);
        let totals = match Totals::compute(&order.items, tier, &self.pricing) {
            Ok(totals) => totals,
            Err(cause) => return Err(self.restore(order, cause)),
        };

        let stock = match self
            .ledger
            .snapshot()
            .and_then(|snapshot| self.ledger.fulfill(&lines, &snapshot))
        {
            Ok(stock) => stock,
            Err(cause) => return Err(self.restore(order, cause.into())),
        };

        let member_uid = member.map_or_else(|| order.member_uid.clone(), |member| member.uid.clone());
        let sale = self.record_sale(
            order.items,
            totals,
            Some(member_uid),
            Some(order.id.clone()),
            payment_method,
        );
        info!(order_id = %order.id, sale_id = %sale.id, total = %sale.totals.final_total, "order fulfilled");
        Ok(Checkout { sale, stock })
    }

    /// Sells the cart's items straight from available stock. An overflowing
    /// total fails the sale before stock is deducted.
    pub fn direct_sale(
        &self,
        cart: Cart,
        member: Option<&Member>,
        payment_method: PaymentMethod,
    ) -> Result<Checkout, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let tier = member.map(|member| member.tier);
        let totals = Totals::compute(cart.lines(), tier, &self.pricing)?;
        let snapshot = self.ledger.snapshot()?;
        let stock = self.ledger.deduct(&cart.stock_lines(), &snapshot)?;

        let member_uid = member.map(|member| member.uid.clone());
        let sale = self.record_sale(cart.into_lines(), totals, member_uid, None, payment_method);
        info!(sale_id = %sale.id, total = %sale.totals.final_total, "direct sale completed");
        Ok(Checkout { sale, stock })
    }

    fn release_lines(&self, lines: &[StockLine]) -> Result<StockUpdate, OrderError> {
        let snapshot = self.ledger.snapshot()?;
        Ok(self.ledger.release(lines, &snapshot)?)
    }

    /// Removes a pending order so no concurrent workflow can act on it.
    fn claim_pending(&self, id: &OrderId) -> Result<Order, OrderError> {
        let order = self
            .orders
            .remove(id)?
            .ok_or_else(|| OrderError::OrderNotFound(id.clone()))?;
        if !order.is_pending() {
            let not_pending = OrderError::NotPending(order.id.clone());
            return Err(self.restore(order, not_pending));
        }
        Ok(order)
    }

    /// Puts a claimed order back after a failed step and returns the error to
    /// report.
    fn restore(&self, order: Order, cause: OrderError) -> OrderError {
        let order_id = order.id.clone();
        match self.orders.insert(order) {
            Ok(()) => {
                warn!(%order_id, error = %cause, "order workflow failed, order kept");
                cause
            }
            Err(compensation) => {
                error!(%order_id, error = %cause, %compensation, "order workflow failed and order could not be restored");
                OrderError::CompensationFailed {
                    cause: Box::new(cause),
                    compensation: Box::new(compensation),
                }
            }
        }
    }

    fn record_sale(
        &self,
        items: Vec<OrderLine>,
        totals: Totals,
        member_uid: Option<MemberUid>,
        order_id: Option<OrderId>,
        payment_method: PaymentMethod,
    ) -> Sale {
        let sale = Sale {
            id: SaleId::generate(),
            member_uid,
            order_id,
            items,
            totals,
            payment_method,
        };
        self.sales.lock().push(sale.clone());
        sale
    }
}

/// Checks each line's pricing option and price against the snapshot.
///
/// Lines for items absent from the snapshot are left to the ledger, which
/// reports them as not found.
fn check_prices(items: &[OrderLine], snapshot: &[InventoryRecord]) -> Result<(), OrderError> {
    for line in items {
        let Some(record) = snapshot.iter().find(|record| record.id() == &line.item_id) else {
            continue;
        };
        let option = record
            .pricing_option(&line.selected_option_id)
            .ok_or_else(|| OrderError::UnknownPricingOption {
                item_id: line.item_id.clone(),
                option_id: line.selected_option_id.clone(),
            })?;
        if option.price != line.price {
            return Err(OrderError::PriceMismatch {
                item_id: line.item_id.clone(),
                option_id: option.id.clone(),
                expected: option.price,
                actual: line.price,
            });
        }
    }
    Ok(())
}
