//! # bazaar-db: Database Layer for Bazaar
//!
//! SQLite persistence for the Bazaar commerce backend, built on sqlx.
//! Owns the stock ledger and the checkout transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Checkout    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │ (checkout.rs)│  │   │
//! │  │   │               │    │ Catalog       │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ StockLedger   │◄───│ preview_bill │  │   │
//! │  │   │ Migrations    │    │ Promotion     │    │ place_order  │  │   │
//! │  │   │               │    │ Address/Order │    │ ImmediateTx  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bazaar-core: price_line, select_best_discount, Bill::assemble        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`tx`] - `BEGIN IMMEDIATE` write transactions
//! - [`repository`] - Repository implementations
//! - [`checkout`] - Bill preview and the order commit pipeline
//! - [`error`] - Database and store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_core::CartLine;
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/bazaar.db")).await?;
//!
//! let lines = [CartLine { variant_id: 7, quantity: 2 }];
//! let bill = db.checkout().preview_bill(user_id, address_id, &lines).await?;
//! let order = db.checkout().place_order(user_id, address_id, &lines).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod tx;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutService;
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use tx::ImmediateTx;

// Repository re-exports for convenience
pub use repository::address::AddressRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::order::{generate_order_number, OrderRepository};
pub use repository::promotion::PromotionRepository;
pub use repository::stock::StockLedger;
