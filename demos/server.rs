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

//! REST API server example for the dispensary point-of-sale.
//!
//! Run with: `cargo run --example server [pricing.json]`
//!
//! # Example Requests
//!
//! ```bash
//! # Inventory
//! curl http://localhost:3000/inventory
//!
//! # Place an order (reserves stock)
//! curl -X POST http://localhost:3000/orders \
//!   -H "Content-Type: application/json" \
//!   -d '{"member_uid": "04A1B2", "items": [{"item_id": "og-kush", "name": "OG Kush",
//!        "quantity": 2, "price": "12.00", "unit": "g", "selected_option_id": "g"}]}'
//!
//! # Fulfill it (clears the reservation, records a sale)
//! curl -X POST http://localhost:3000/orders/<id>/fulfill \
//!   -H "Content-Type: application/json" \
//!   -d '{"payment_method": "cash"}'
//!
//! # Direct sale from available stock
//! curl -X POST http://localhost:3000/sales \
//!   -H "Content-Type: application/json" \
//!   -d '{"items": [{"item_id": "og-kush", "option_id": "g", "quantity": 1}],
//!        "payment_method": "qr_code"}'
//!
//! # Stock totals
//! curl http://localhost:3000/report/stock
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use dispensary_stock::{
    Cart, InventoryRecord, ItemId, Member, MemberUid, MemoryStore, NewOrder, Order, OrderBook,
    OrderError, OrderId, OrderStore, PaymentMethod, PointOfSale, PricingConfig, PricingOption,
    Sale, SalesReport, StockError, StockSummary, StoreError,
};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path as FilePath;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

// === Request/Response DTOs ===

/// Request body for fulfilling an order.
#[derive(Debug, Deserialize)]
pub struct FulfillRequest {
    /// Member record for the tier discount. Omitted for walk-in pricing.
    #[serde(default)]
    pub member: Option<Member>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub item_id: ItemId,
    pub option_id: String,
    pub quantity: u32,
}

/// Request body for a direct sale.
#[derive(Debug, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<CartItemRequest>,
    #[serde(default)]
    pub member: Option<Member>,
    pub payment_method: PaymentMethod,
}

/// Response body for a completed checkout.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub message: &'static str,
    pub sale: Sale,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub message: &'static str,
    pub records: Vec<InventoryRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    pub member: Option<MemberUid>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the point of sale.
#[derive(Clone)]
pub struct AppState {
    pub pos: Arc<PointOfSale>,
}

// === Error Handling ===

/// Wrapper for converting `OrderError` into HTTP responses.
pub struct AppError(OrderError);

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        AppError(err)
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        AppError(err.into())
    }
}

fn stock_status(err: &StockError) -> (StatusCode, &'static str) {
    match err {
        StockError::NotFound { .. } => (StatusCode::NOT_FOUND, "ITEM_NOT_FOUND"),
        StockError::InsufficientStock { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK")
        }
        StockError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
        StockError::StockOverflow { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "STOCK_OVERFLOW"),
        StockError::Store(StoreError::InvalidRecord { .. }) => {
            (StatusCode::BAD_REQUEST, "INVALID_RECORD")
        }
        StockError::Store(StoreError::VersionConflict { .. }) => {
            (StatusCode::CONFLICT, "VERSION_CONFLICT")
        }
        StockError::Store(StoreError::Unavailable(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            OrderError::EmptyOrder => (StatusCode::BAD_REQUEST, "EMPTY_ORDER"),
            OrderError::MissingMember => (StatusCode::BAD_REQUEST, "MISSING_MEMBER"),
            OrderError::UnknownPricingOption { .. } => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_PRICING_OPTION")
            }
            OrderError::PriceMismatch { .. } => (StatusCode::BAD_REQUEST, "PRICE_MISMATCH"),
            OrderError::PriceOverflow { .. } | OrderError::TotalOverflow => {
                (StatusCode::BAD_REQUEST, "PRICE_OVERFLOW")
            }
            OrderError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            OrderError::DuplicateOrder(_) => (StatusCode::CONFLICT, "DUPLICATE_ORDER"),
            OrderError::NotPending(_) => (StatusCode::CONFLICT, "NOT_PENDING"),
            OrderError::Stock(err) => stock_status(err),
            OrderError::StockNotReleased { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STOCK_NOT_RELEASED")
            }
            OrderError::CompensationFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "COMPENSATION_FAILED")
            }
            OrderError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "ORDERS_UNAVAILABLE"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// GET /inventory - List all inventory records.
async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryRecord>>, AppError> {
    Ok(Json(state.pos.ledger().snapshot()?))
}

/// PUT /inventory - Bulk upsert records as given.
async fn upsert_inventory(
    State(state): State<AppState>,
    Json(records): Json<Vec<InventoryRecord>>,
) -> Result<Json<InventoryResponse>, AppError> {
    let records = state.pos.ledger().bulk_update(records)?;
    Ok(Json(InventoryResponse {
        message: "Inventory updated successfully.",
        records,
    }))
}

/// GET /orders - List stored orders.
async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.pos.orders().list()?))
}

/// POST /orders - Place an order and reserve its stock.
async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.pos.create_order(request)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /orders/{id}/cancel - Cancel a pending order and release its stock.
async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.pos.cancel_order(&OrderId(id))?))
}

/// DELETE /orders/{id} - Delete an order, releasing stock it still holds.
async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.pos.delete_order(&OrderId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /orders/{id}/fulfill - Turn a pending order into a sale.
async fn fulfill_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FulfillRequest>,
) -> Result<Json<SaleResponse>, AppError> {
    let checkout =
        state
            .pos
            .fulfill_order(&OrderId(id), request.member.as_ref(), request.payment_method)?;
    Ok(Json(SaleResponse {
        message: checkout.stock.message,
        sale: checkout.sale,
    }))
}

/// POST /sales - Sell straight from available stock.
async fn direct_sale(
    State(state): State<AppState>,
    Json(request): Json<SaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let store = state.pos.ledger().store();
    let mut cart = Cart::new();
    for item in &request.items {
        let record = store
            .get(&item.item_id)
            .map_err(StockError::from)?
            .ok_or_else(|| StockError::NotFound {
                item_id: item.item_id.clone(),
            })?;
        cart.add_item(&record, &item.option_id, item.quantity)?;
    }

    let checkout = state
        .pos
        .direct_sale(cart, request.member.as_ref(), request.payment_method)?;
    Ok((
        StatusCode::CREATED,
        Json(SaleResponse {
            message: checkout.stock.message,
            sale: checkout.sale,
        }),
    ))
}

/// GET /report/stock - Stock totals across all items.
async fn stock_report(State(state): State<AppState>) -> Result<Json<StockSummary>, AppError> {
    let records = state.pos.ledger().snapshot()?;
    Ok(Json(StockSummary::from_records(&records)))
}

/// GET /report/sales - Sales totals, optionally for one member.
async fn sales_report(
    State(state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> Json<SalesReport> {
    Json(SalesReport::build(&state.pos.sales(), query.member.as_ref()))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/inventory", get(list_inventory).put(upsert_inventory))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", delete(delete_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/fulfill", post(fulfill_order))
        .route("/sales", post(direct_sale))
        .route("/report/stock", get(stock_report))
        .route("/report/sales", get(sales_report))
        .with_state(state)
}

// === Main ===

fn demo_inventory() -> Vec<InventoryRecord> {
    vec![
        InventoryRecord::new(ItemId::from("og-kush"), "OG Kush")
            .with_category("Flower")
            .with_pricing_option(PricingOption::new("g", "Per Gram", dec!(12.00), "g"))
            .with_pricing_option(PricingOption::new("eighth", "Eighth", dec!(40.00), "3.5g"))
            .with_stock(200, 0),
        InventoryRecord::new(ItemId::from("blue-dream-pre-roll"), "Blue Dream Pre-Roll")
            .with_category("Pre-Rolls")
            .with_pricing_option(PricingOption::new("each", "Single", dec!(8.50), "unit"))
            .with_stock(50, 0),
        InventoryRecord::new(ItemId::from("mint-gummies"), "Mint Gummies")
            .with_category("Edibles")
            .with_pricing_option(PricingOption::new("pack", "Pack of 10", dec!(25.00), "pack"))
            .with_stock(30, 0),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pricing = match std::env::args().nth(1) {
        Some(path) => PricingConfig::load(FilePath::new(&path))?,
        None => PricingConfig::default(),
    };

    let state = AppState {
        pos: Arc::new(PointOfSale::new(
            Arc::new(MemoryStore::with_records(demo_inventory())?),
            Arc::new(OrderBook::new()),
            pricing,
        )),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    info!("dispensary API server running on http://127.0.0.1:3000");
    println!("Endpoints:");
    println!("  GET    /inventory             - List inventory");
    println!("  PUT    /inventory             - Bulk upsert inventory records");
    println!("  GET    /orders                - List orders");
    println!("  POST   /orders                - Place an order (reserves stock)");
    println!("  POST   /orders/:id/cancel     - Cancel an order (releases stock)");
    println!("  POST   /orders/:id/fulfill    - Fulfill an order (records a sale)");
    println!("  DELETE /orders/:id            - Delete an order");
    println!("  POST   /sales                 - Direct sale (deducts stock)");
    println!("  GET    /report/stock          - Stock totals");
    println!("  GET    /report/sales          - Sales report (?member=UID)");

    axum::serve(listener, app).await?;
    Ok(())
}
