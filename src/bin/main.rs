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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use dispensary_stock::{
    InventoryRecord, InventoryStore, ItemId, MemoryStore, PricingOption, StockAdjustment,
    StockLedger, StockLine, StoreError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stock Ledger - Replay stock operations against an inventory
///
/// Reads an inventory CSV and an operations CSV, applies each operation in
/// order and writes the resulting inventory to stdout.
/// Supports reserve, fulfill, release and deduct.
#[derive(Parser, Debug)]
#[command(name = "dispensary-stock")]
#[command(about = "Replays stock operations against an inventory CSV", long_about = None)]
struct Args {
    /// Path to the inventory CSV
    ///
    /// Expected format: id,name,category,unit,price,available,reserved
    #[arg(short, long, value_name = "FILE")]
    inventory: PathBuf,

    /// Path to CSV file with stock operations
    ///
    /// Expected format: op,item,quantity
    /// Example: cargo run -- --inventory inventory.csv operations.csv > stock.csv
    #[arg(value_name = "FILE")]
    operations: PathBuf,
}

fn main() {
    // Logs go to stderr so stdout stays valid CSV.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let inventory = open(&args.inventory);
    let store = match load_inventory(BufReader::new(inventory)) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error loading inventory: {}", e);
            process::exit(1);
        }
    };

    let ledger = StockLedger::new(store.clone());
    let operations = open(&args.operations);
    if let Err(e) = process_operations(&ledger, BufReader::new(operations)) {
        eprintln!("Error processing operations: {}", e);
        process::exit(1);
    }

    if let Err(e) = write_inventory(store.as_ref(), std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> File {
    match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

#[derive(Debug, Error)]
enum LoadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raw inventory row. Each row becomes a record with a single pricing option.
#[derive(Debug, Deserialize)]
struct InventoryRow {
    id: String,
    name: String,
    #[serde(default)]
    category: String,
    unit: String,
    price: Decimal,
    available: u32,
    #[serde(default)]
    reserved: u32,
}

impl InventoryRow {
    fn into_record(self) -> InventoryRecord {
        let option = PricingOption::new("default", &format!("Per {}", self.unit), self.price, &self.unit);
        InventoryRecord::new(ItemId(self.id), &self.name)
            .with_category(&self.category)
            .with_pricing_option(option)
            .with_stock(self.available, self.reserved)
    }
}

/// Loads an inventory CSV into a fresh store.
///
/// Unlike operations, inventory rows are not skipped: a malformed row or an
/// invalid record fails the load.
fn load_inventory<R: Read>(reader: R) -> Result<MemoryStore, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let records = rdr
        .deserialize::<InventoryRow>()
        .map(|row| row.map(InventoryRow::into_record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MemoryStore::with_records(records)?)
}

/// Raw CSV record matching the operations format.
///
/// Fields: `op, item, quantity`
#[derive(Debug, Deserialize)]
struct OperationRow {
    op: String,
    item: String,
    quantity: u32,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Replay {
    applied: usize,
    skipped: usize,
}

/// Applies operations from a CSV reader, one single-line batch per row.
///
/// Rows are streamed. Malformed rows and rejected operations are logged and
/// skipped; each row sees the stock left by the rows before it.
///
/// # CSV Format
///
/// Expected columns: `op, item, quantity`
/// - `op`: reserve, fulfill, release or deduct
/// - `item`: inventory item id
/// - `quantity`: positive whole units
///
/// # Errors
///
/// Returns a CSV error only if the reader itself fails.
fn process_operations<R: Read>(ledger: &StockLedger, reader: R) -> Result<Replay, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let mut replay = Replay::default();
    for (row, result) in rdr.deserialize::<OperationRow>().enumerate() {
        let line = row + 2; // header is line 1
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!(line, error = %e, "skipping malformed row");
                replay.skipped += 1;
                continue;
            }
        };

        let adjustment = match record.op.parse::<StockAdjustment>() {
            Ok(adjustment) => adjustment,
            Err(e) => {
                warn!(line, error = %e, "skipping row");
                replay.skipped += 1;
                continue;
            }
        };

        let lines = [StockLine::new(ItemId(record.item), record.quantity)];
        let outcome = ledger
            .snapshot()
            .and_then(|snapshot| ledger.apply(adjustment, &lines, &snapshot));
        match outcome {
            Ok(_) => replay.applied += 1,
            Err(e) => {
                warn!(line, %adjustment, error = %e, "skipping operation");
                replay.skipped += 1;
            }
        }
    }

    info!(applied = replay.applied, skipped = replay.skipped, "operations replayed");
    Ok(replay)
}

/// Output row for one inventory record.
#[derive(Debug, Serialize)]
struct StockRow<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    available: u32,
    reserved: u32,
    total: u64,
}

/// Write inventory stock levels to a CSV writer.
///
/// # CSV Format
///
/// Columns: `id, name, category, available, reserved, total`
///
/// ```csv
/// id,name,category,available,reserved,total
/// gelato,Gelato 41,Flower,6,4,10
/// ```
fn write_inventory<W: Write>(store: &dyn InventoryStore, writer: W) -> Result<(), LoadError> {
    let mut wtr = Writer::from_writer(writer);

    for record in store.fetch_all()? {
        wtr.serialize(StockRow {
            id: record.id().as_str(),
            name: &record.name,
            category: &record.category,
            available: record.available_stock(),
            reserved: record.reserved_stock(),
            total: record.total_stock(),
        })?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INVENTORY: &str = "id,name,category,unit,price,available,reserved\n\
                             gelato,Gelato 41,Flower,g,12.00,10,0\n\
                             gummies,Mango Gummies,Edibles,pack,20.00,5,2\n";

    fn ledger() -> (Arc<MemoryStore>, StockLedger) {
        let store = Arc::new(load_inventory(Cursor::new(INVENTORY)).unwrap());
        let ledger = StockLedger::new(store.clone());
        (store, ledger)
    }

    fn stock(store: &MemoryStore, id: &str) -> (u32, u32) {
        let record = store.get(&ItemId::from(id)).unwrap().unwrap();
        (record.available_stock(), record.reserved_stock())
    }

    #[test]
    fn load_simple_inventory() {
        let (store, _) = ledger();
        assert_eq!(store.len(), 2);
        assert_eq!(stock(&store, "gelato"), (10, 0));
        assert_eq!(stock(&store, "gummies"), (5, 2));
    }

    #[test]
    fn load_rejects_malformed_inventory() {
        let csv = "id,name,category,unit,price,available,reserved\n\
                   gelato,Gelato 41,Flower,g,twelve,10,0\n";
        assert!(matches!(
            load_inventory(Cursor::new(csv)),
            Err(LoadError::Csv(_))
        ));
    }

    #[test]
    fn load_rejects_non_positive_price() {
        let csv = "id,name,category,unit,price,available,reserved\n\
                   gelato,Gelato 41,Flower,g,0,10,0\n";
        assert!(matches!(
            load_inventory(Cursor::new(csv)),
            Err(LoadError::Store(StoreError::InvalidRecord { .. }))
        ));
    }

    #[test]
    fn replay_reserve_then_fulfill() {
        let (store, ledger) = ledger();
        let ops = "op,item,quantity\n\
                   reserve,gelato,4\n\
                   fulfill,gelato,4\n";

        let replay = process_operations(&ledger, Cursor::new(ops)).unwrap();

        assert_eq!(replay, Replay { applied: 2, skipped: 0 });
        assert_eq!(stock(&store, "gelato"), (6, 0));
    }

    #[test]
    fn replay_release_and_deduct() {
        let (store, ledger) = ledger();
        let ops = "op,item,quantity\n\
                   release,gummies,2\n\
                   deduct,gummies,3\n";

        process_operations(&ledger, Cursor::new(ops)).unwrap();

        assert_eq!(stock(&store, "gummies"), (4, 0));
    }

    #[test]
    fn replay_with_whitespace() {
        let (store, ledger) = ledger();
        let ops = "op,item,quantity\n Reserve , gelato , 1 \n";

        process_operations(&ledger, Cursor::new(ops)).unwrap();

        assert_eq!(stock(&store, "gelato"), (9, 1));
    }

    #[test]
    fn skip_rejected_and_malformed_rows() {
        let (store, ledger) = ledger();
        let ops = "op,item,quantity\n\
                   reserve,gelato,20\n\
                   restock,gelato,1\n\
                   reserve,unknown,1\n\
                   reserve,gelato,lots\n\
                   deduct,gelato,2\n";

        let replay = process_operations(&ledger, Cursor::new(ops)).unwrap();

        assert_eq!(replay, Replay { applied: 1, skipped: 4 });
        assert_eq!(stock(&store, "gelato"), (8, 0));
    }

    #[test]
    fn write_inventory_to_csv() {
        let (store, ledger) = ledger();
        process_operations(&ledger, Cursor::new("op,item,quantity\nreserve,gelato,4\n")).unwrap();

        let mut output = Vec::new();
        write_inventory(store.as_ref(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert_eq!(
            output_str,
            "id,name,category,available,reserved,total\n\
             gelato,Gelato 41,Flower,6,4,10\n\
             gummies,Mango Gummies,Edibles,5,2,7\n"
        );
    }
}
