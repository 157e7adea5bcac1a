//! # Repository Module
//!
//! Database repository implementations for Kiosco POS.
//!
//! Repositories abstract database access behind a clean API: SQL stays in
//! one place, callers work with domain types. Each repository holds a
//! clone of the shared pool. Modules additionally expose free functions
//! taking `&mut SqliteConnection` for the lookups and writes the checkout
//! transaction needs to run against its own connection.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and stock adjustments
//! - [`category::CategoryRepository`] - Category lookup/insert
//! - [`user::UserRepository`] - User directory (lookup by username)
//! - [`sale::SaleRepository`] - Sale ledger read side

pub mod category;
pub mod product;
pub mod sale;
pub mod user;
