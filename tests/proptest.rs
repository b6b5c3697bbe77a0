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

//! Property-based tests for the stock ledger.
//!
//! These tests verify invariants that should hold for any sequence of
//! stock adjustments.

use dispensary_stock::{
    InventoryRecord, InventoryStore, ItemId, MemoryStore, PricingOption, StockAdjustment,
    StockError, StockLedger, StockLine, StockSummary,
};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use std::sync::Arc;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

const ITEMS: [&str; 4] = ["a", "b", "c", "d"];

fn arb_quantity() -> impl Strategy<Value = u32> {
    1u32..=50
}

fn arb_adjustment() -> impl Strategy<Value = StockAdjustment> {
    prop::sample::select(StockAdjustment::ALL.to_vec())
}

fn arb_line() -> impl Strategy<Value = StockLine> {
    (prop::sample::select(ITEMS.to_vec()), arb_quantity())
        .prop_map(|(id, quantity)| StockLine::new(id, quantity))
}

fn arb_stock() -> impl Strategy<Value = (u32, u32)> {
    (0u32..=100, 0u32..=100)
}

fn make_item(id: &str, (available, reserved): (u32, u32)) -> InventoryRecord {
    InventoryRecord::new(ItemId::from(id), &format!("Item {id}"))
        .with_pricing_option(PricingOption::new("u", "Each", dec!(5.00), "unit"))
        .with_stock(available, reserved)
}

fn setup(stock: &[(u32, u32)]) -> (Arc<MemoryStore>, StockLedger) {
    let records = ITEMS
        .iter()
        .zip(stock)
        .map(|(id, counters)| make_item(id, *counters))
        .collect();
    let store = Arc::new(MemoryStore::with_records(records).unwrap());
    let ledger = StockLedger::new(store.clone());
    (store, ledger)
}

// =============================================================================
// Single Record Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Each adjustment moves the counters exactly as described, or fails
    /// leaving the record untouched.
    #[test]
    fn adjustment_postconditions(
        (available, reserved) in arb_stock(),
        adjustment in arb_adjustment(),
        quantity in arb_quantity(),
    ) {
        let before = make_item("a", (available, reserved));
        let mut record = before.clone();

        match adjustment.apply(&mut record, quantity) {
            Ok(()) => {
                let (a, r) = (record.available_stock(), record.reserved_stock());
                match adjustment {
                    StockAdjustment::Reserve => prop_assert_eq!((a, r), (available - quantity, reserved + quantity)),
                    StockAdjustment::Fulfill => prop_assert_eq!((a, r), (available, reserved - quantity)),
                    StockAdjustment::Release => prop_assert_eq!((a, r), (available + quantity, reserved - quantity)),
                    StockAdjustment::Deduct => prop_assert_eq!((a, r), (available - quantity, reserved)),
                }
            }
            Err(StockError::InsufficientStock { requested, on_hand, .. }) => {
                prop_assert_eq!(requested, quantity);
                prop_assert!(on_hand < quantity);
                prop_assert_eq!(&record, &before);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    /// Reserve followed by the matching release conserves the total.
    #[test]
    fn reserve_release_round_trip(
        stock in arb_stock(),
        quantity in arb_quantity(),
    ) {
        let mut record = make_item("a", stock);
        let total = record.total_stock();

        if StockAdjustment::Reserve.apply(&mut record, quantity).is_ok() {
            prop_assert_eq!(record.total_stock(), total);
            StockAdjustment::Release.apply(&mut record, quantity).unwrap();
        }

        prop_assert_eq!((record.available_stock(), record.reserved_stock()), stock);
    }
}

// =============================================================================
// Batch Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// A failed batch leaves the store exactly as it was.
    #[test]
    fn failed_batch_writes_nothing(
        stock in prop::collection::vec(arb_stock(), ITEMS.len()),
        adjustment in arb_adjustment(),
        lines in prop::collection::vec(arb_line(), 1..8),
    ) {
        let (store, ledger) = setup(&stock);
        let before = store.fetch_all().unwrap();

        if ledger.apply(adjustment, &lines, &before).is_err() {
            prop_assert_eq!(store.fetch_all().unwrap(), before);
        }
    }

    /// A batch succeeds exactly when applying its lines one by one would.
    #[test]
    fn batch_matches_sequential_application(
        stock in prop::collection::vec(arb_stock(), ITEMS.len()),
        adjustment in arb_adjustment(),
        lines in prop::collection::vec(arb_line(), 1..8),
    ) {
        let (store, ledger) = setup(&stock);
        let mut expected = store.fetch_all().unwrap();
        let sequential = lines.iter().try_for_each(|line| {
            let record = expected
                .iter_mut()
                .find(|record| record.id() == &line.item_id)
                .unwrap();
            adjustment.apply(record, line.quantity)
        });

        let batch = ledger.apply(adjustment, &lines, &store.fetch_all().unwrap());
        prop_assert_eq!(batch.is_ok(), sequential.is_ok());

        if batch.is_ok() {
            let after = store.fetch_all().unwrap();
            for (written, wanted) in after.iter().zip(&expected) {
                prop_assert_eq!(written.available_stock(), wanted.available_stock());
                prop_assert_eq!(written.reserved_stock(), wanted.reserved_stock());
            }
        }
    }

    /// Counters stay within range across any sequence of batches, and only
    /// fulfill and deduct reduce total stock.
    #[test]
    fn totals_move_only_by_outflow(
        stock in prop::collection::vec(arb_stock(), ITEMS.len()),
        batches in prop::collection::vec((arb_adjustment(), prop::collection::vec(arb_line(), 1..4)), 1..20),
    ) {
        let (store, ledger) = setup(&stock);
        let mut expected_total = StockSummary::from_records(&store.fetch_all().unwrap()).total();

        for (adjustment, lines) in &batches {
            let snapshot = ledger.snapshot().unwrap();
            if ledger.apply(*adjustment, lines, &snapshot).is_ok()
                && matches!(adjustment, StockAdjustment::Fulfill | StockAdjustment::Deduct)
            {
                expected_total -= lines.iter().map(|line| u64::from(line.quantity)).sum::<u64>();
            }
        }

        let summary = StockSummary::from_records(&store.fetch_all().unwrap());
        prop_assert_eq!(summary.total(), expected_total);
    }
}
