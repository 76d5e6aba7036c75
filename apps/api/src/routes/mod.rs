//! Route handlers.
//!
//! Handlers only map JSON to domain calls and back; every rule lives in
//! bazaar-core and every transaction in bazaar-db.

pub mod admin;
pub mod health;
pub mod orders;

use axum::extract::{FromRequest, FromRequestParts};
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

/// `axum::Json` with rejections reported as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections reported as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/orders", orders::router())
        .nest("/api/admin", admin::router())
}
