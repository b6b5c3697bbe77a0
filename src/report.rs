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

//! Stock and sales reporting.

use crate::base::{ItemId, MemberUid};
use crate::checkout::Sale;
use crate::item::InventoryRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Stock totals across the whole inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub items: usize,
    pub total_available: u64,
    pub total_reserved: u64,
}

impl StockSummary {
    pub fn from_records(records: &[InventoryRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.items += 1;
            summary.total_available += u64::from(record.available_stock());
            summary.total_reserved += u64::from(record.reserved_stock());
            summary
        })
    }

    pub fn total(&self) -> u64 {
        self.total_available + self.total_reserved
    }
}

/// Units and revenue of one item across a set of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub transactions: usize,
    /// Sum of final totals.
    pub revenue: Decimal,
    /// Pre-discount line revenue per category.
    pub by_category: BTreeMap<String, Decimal>,
    /// Best sellers by line revenue, highest first.
    pub top_items: Vec<ItemSales>,
}

impl SalesReport {
    pub const TOP_ITEMS: usize = 5;

    /// Builds a report over `sales`, optionally limited to one member.
    pub fn build(sales: &[Sale], member: Option<&MemberUid>) -> Self {
        let selected: Vec<&Sale> = sales
            .iter()
            .filter(|sale| member.is_none_or(|uid| sale.member_uid.as_ref() == Some(uid)))
            .collect();

        let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut by_item: HashMap<&ItemId, ItemSales> = HashMap::new();
        for line in selected.iter().flat_map(|sale| &sale.items) {
            // Recorded sales were totalled with checked arithmetic; sums saturate.
            let subtotal = line.subtotal().unwrap_or(Decimal::MAX);
            let category = by_category.entry(line.category.clone()).or_default();
            *category = category.saturating_add(subtotal);
            let entry = by_item.entry(&line.item_id).or_insert_with(|| ItemSales {
                item_id: line.item_id.clone(),
                name: line.name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += u64::from(line.quantity);
            entry.revenue = entry.revenue.saturating_add(subtotal);
        }

        let mut top_items: Vec<ItemSales> = by_item.into_values().collect();
        top_items.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        top_items.truncate(Self::TOP_ITEMS);

        Self {
            transactions: selected.len(),
            revenue: selected
                .iter()
                .fold(Decimal::ZERO, |total, sale| total.saturating_add(sale.totals.final_total)),
            by_category,
            top_items,
        }
    }
}
