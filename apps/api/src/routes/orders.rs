//! Customer order routes: bill preview, checkout, order history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Attributes, Bill, CartLine, Order, OrderDetails, OrderItem, OrderStatus};

use super::{ApiJson, ApiPath};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/bill", post(preview_bill))
        .route("/:id", get(get_order))
}

// =============================================================================
// DTOs
// =============================================================================

/// Body of both bill preview and order creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub address_id: i64,
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: i64,
    pub order_number: String,
    pub address_id: i64,
    pub original_amount: i64,
    pub discount_amount: i64,
    pub delivery_fee: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        OrderSummary {
            order_id: order.id,
            order_number: order.order_number,
            address_id: order.address_id,
            original_amount: order.original_amount_cents,
            discount_amount: order.discount_amount_cents,
            delivery_fee: order.delivery_fee_cents,
            total_amount: order.total_amount_cents,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub variant_id: i64,
    pub sku: String,
    pub product_name: String,
    pub attributes: Attributes,
    pub quantity: i64,
    pub original_unit_price: i64,
    pub unit_price: i64,
    pub discount_amount: i64,
    pub total_price: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            variant_id: item.variant_id,
            sku: item.sku_snapshot,
            product_name: item.product_name_snapshot,
            attributes: item.attributes_snapshot,
            quantity: item.quantity,
            original_unit_price: item.original_unit_price_cents,
            unit_price: item.unit_price_cents,
            discount_amount: item.discount_cents,
            total_price: item.line_total_cents,
        }
    }
}

/// A committed order with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        OrderResponse {
            summary: details.order.into(),
            order_items: details.items.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn preview_bill(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<OrderRequest>,
) -> ApiResult<Json<Bill>> {
    let bill = state
        .db
        .checkout()
        .preview_bill(actor.user_id, req.address_id, &req.items)
        .await?;
    Ok(Json(bill))
}

async fn create_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(req): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let details = state
        .db
        .checkout()
        .place_order(actor.user_id, req.address_id, &req.items)
        .await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

async fn list_orders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    let orders = state.db.orders().list_for_user(actor.user_id).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

async fn get_order(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiPath(order_id): ApiPath<i64>,
) -> ApiResult<Json<OrderResponse>> {
    let details = state.db.orders().get_for(order_id, &actor).await?;
    Ok(Json(details.into()))
}
