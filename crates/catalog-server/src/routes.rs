//! Catalog route handlers.
//!
//! - `GET /health` - liveness check
//! - `GET /products` - all products
//! - `GET /products/{id}` - one product
//! - `GET /stock` - all stock levels
//! - `GET /stock/{id}` - one stock level

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use rocketshoes_core::{Product, ProductId, Stock};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the catalog router with tracing middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/{id}", get(show_product))
        .route("/stock", get(list_stock))
        .route("/stock/{id}", get(show_stock))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

fn parse_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {raw}")))
}

async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.db().products().to_vec())
}

#[instrument(skip(state))]
async fn show_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>> {
    let id = parse_id(&raw_id)?;
    state
        .db()
        .product(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

async fn list_stock(State(state): State<AppState>) -> Json<Vec<Stock>> {
    Json(state.db().stock().to_vec())
}

#[instrument(skip(state))]
async fn show_stock(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Stock>> {
    let id = parse_id(&raw_id)?;
    state
        .db()
        .stock_of(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("stock for product {id}")))
}
