//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Two Entry Points Per Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                  CheckoutService               │
//! │     │ db.catalog().get_variant(7)            │ inside ImmediateTx       │
//! │     ▼                                        ▼                          │
//! │  CatalogRepository (owns a pool)      catalog::fetch_listing(conn, 7)   │
//! │     │ acquires a connection                  ▲                          │
//! │     └────────────────────────────────────────┘                          │
//! │                                                                         │
//! │  Every query is a free function over `&mut SqliteConnection`, so the    │
//! │  repositories and the checkout transaction share the same SQL.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products and variants
//! - [`StockLedger`](stock::StockLedger) - Conditional stock decrement / restock
//! - [`PromotionRepository`](promotion::PromotionRepository) - Events and discounts
//! - [`AddressRepository`](address::AddressRepository) - Delivery addresses
//! - [`OrderRepository`](order::OrderRepository) - Order reads

pub mod address;
pub mod catalog;
pub mod order;
pub mod promotion;
pub mod stock;

#[cfg(test)]
pub(crate) mod test_support;
