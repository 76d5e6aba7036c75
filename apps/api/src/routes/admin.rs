//! Admin routes: order status, restock, promotion management.
//!
//! Every handler takes [`AdminUser`], so customers get 403 before any work.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use bazaar_core::{
    Discount, Event, EventDetails, EventStatus, NewDiscount, NewEvent, OrderStatus,
    StockAdjustment,
};

use super::orders::OrderResponse;
use super::{ApiJson, ApiPath};
use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/:id/status", patch(update_order_status))
        .route("/variants/:id/stock", post(restock))
        .route("/events", post(create_event))
        .route("/events/:id/status", patch(set_event_status))
        .route("/events/:id/products", put(attach_products))
        .route("/events/:id/discounts", post(add_discount))
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct EventStatusRequest {
    pub status: EventStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachProductsRequest {
    pub product_ids: Vec<i64>,
}

async fn update_order_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(order_id): ApiPath<i64>,
    ApiJson(req): ApiJson<OrderStatusRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let details = state
        .db
        .checkout()
        .update_order_status(order_id, req.status)
        .await?;
    info!(admin_id = admin.user_id, order_id, status = ?req.status, "Admin changed order status");
    Ok(Json(details.into()))
}

async fn restock(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(variant_id): ApiPath<i64>,
    ApiJson(req): ApiJson<RestockRequest>,
) -> ApiResult<Json<StockAdjustment>> {
    let adjustment = state.db.stock().increment(variant_id, req.quantity).await?;
    info!(
        admin_id = admin.user_id,
        variant_id,
        new_stock = adjustment.new_stock,
        "Admin restocked variant"
    );
    Ok(Json(adjustment))
}

async fn create_event(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiJson(req): ApiJson<NewEvent>,
) -> ApiResult<(StatusCode, Json<EventDetails>)> {
    let event = state.db.promotions().create_event(&req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn set_event_status(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(req): ApiJson<EventStatusRequest>,
) -> ApiResult<Json<Event>> {
    let event = state
        .db
        .promotions()
        .set_event_status(event_id, req.status)
        .await?;
    Ok(Json(event))
}

async fn attach_products(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AttachProductsRequest>,
) -> ApiResult<Json<EventDetails>> {
    let event = state
        .db
        .promotions()
        .attach_products(event_id, &req.product_ids)
        .await?;
    Ok(Json(event))
}

async fn add_discount(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    ApiPath(event_id): ApiPath<i64>,
    ApiJson(req): ApiJson<NewDiscount>,
) -> ApiResult<(StatusCode, Json<Discount>)> {
    let discount = state.db.promotions().add_discount(event_id, &req).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}
