//! # Bazaar API
//!
//! HTTP surface for bill preview, checkout and promotion administration.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Bazaar API                                   │
//! │                                                                         │
//! │  ┌────────────────────────────┐  ┌──────────────────────────────────┐  │
//! │  │  /api/orders  (customer)   │  │  /api/admin  (admin)             │  │
//! │  │                            │  │                                  │  │
//! │  │ • POST /bill   preview     │  │ • PATCH orders/:id/status        │  │
//! │  │ • POST /       checkout    │  │ • POST  variants/:id/stock       │  │
//! │  │ • GET  /       list own    │  │ • POST  events                   │  │
//! │  │ • GET  /:id    get         │  │ • PATCH events/:id/status        │  │
//! │  └────────────────────────────┘  │ • PUT   events/:id/products      │  │
//! │                                  │ • POST  events/:id/discounts     │  │
//! │  ┌────────────────────────────┐  └──────────────────────────────────┘  │
//! │  │  /health                   │                                        │
//! │  └────────────────────────────┘                                        │
//! │                                                                         │
//! │  Bearer JWT (HS256) ──► CurrentUser / AdminUser ──► bazaar-db           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./data/bazaar.db)
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - HS256 secret
//! - `JWT_ACCESS_LIFETIME_SECS` - lifetime of issued tokens (default: 3600)
//! - `DELIVERY_FEE_CENTS` - flat delivery fee (default: 500)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use bazaar_db::Database;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}

/// Builds the application router with request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
