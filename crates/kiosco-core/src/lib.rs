//! # kiosco-core: Pure Business Logic for Kiosco POS
//!
//! This crate is the heart of the system: domain types, exact money
//! arithmetic and validation rules, all as pure code with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Kiosco POS Architecture                       │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                 Boundary layer (out of scope)                 │  │
//! │  │        HTTP routes, auth, DTO mapping to transport            │  │
//! │  └──────────────────────────────┬────────────────────────────────┘  │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐  │
//! │  │              ★ kiosco-core (THIS CRATE) ★                     │  │
//! │  │                                                               │  │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐   │  │
//! │  │   │  types   │  │  money   │  │  error   │  │ validation │   │  │
//! │  │   │ Product  │  │  Money   │  │CoreError │  │   rules    │   │  │
//! │  │   │ Sale ... │  │ (cents)  │  │          │  │            │   │  │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └────────────┘   │  │
//! │  │                                                               │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │  │
//! │  └──────────────────────────────┬────────────────────────────────┘  │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐  │
//! │  │                  kiosco-db (Database Layer)                   │  │
//! │  │      SQLite repositories, migrations, checkout transaction    │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, no side effects
//! 2. **Integer Money**: all amounts are cents (i64), never floats
//! 3. **Explicit Errors**: typed error enums, never strings or panics

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// Re-exports so users can do `use kiosco_core::Money` instead of
// `use kiosco_core::money::Money`.
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum line items allowed in a single sale request.
///
/// Prevents runaway requests and keeps transactions reasonably sized.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single product per sale line.
///
/// Catches obvious typos (e.g. 1000 instead of 10) before they reach
/// the inventory.
pub const MAX_LINE_QUANTITY: i64 = 999;
