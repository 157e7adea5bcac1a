//! # Domain Types
//!
//! Core domain types for Kiosco POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │   Product     │   │     Sale      │   │   SaleLine    │          │
//! │  │  ───────────  │   │  ───────────  │   │  ───────────  │          │
//! │  │  id (UUID)    │   │  id (UUID)    │   │  sale_id (FK) │          │
//! │  │  barcode      │   │  user_id (FK) │   │  product_id   │          │
//! │  │  price_cents  │   │  total_cents  │   │  price frozen │          │
//! │  │  stock_qty    │   │  created_at   │   │  at sale time │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! │                                                                     │
//! │  Category, User, Role            SaleView / SaleLineView            │
//! │  (simple lookup rows)            (read model for callers)           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleLine` copies the product name and unit price at the moment of
//! sale. Historical records therefore never change when the live product
//! is renamed or repriced. Lines reference products by id only; there is
//! no live object graph between sales and inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across categories.
    pub name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode (EAN-13, UPC-A, ...) - unique business identifier.
    pub barcode: String,

    /// Display name shown to the cashier and snapshotted onto sale lines.
    pub name: String,

    /// Unit price in cents. Never negative.
    pub price_cents: i64,

    /// Current stock level. Never negative; every decrement is guarded.
    pub stock_quantity: i64,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from current stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}

// =============================================================================
// User
// =============================================================================

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access: manages products, categories and users.
    Admin,
    /// Registers sales at the counter.
    Seller,
}

/// A user who can register sales.
///
/// The sale path only ever resolves users by name; credential issuance
/// and verification are handled by the surrounding service, so
/// `password_hash` is opaque here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// One requested line of a sale: which product, how many units.
///
/// Transient input to the checkout processor; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// A completed sale (aggregate root, append-only ledger row).
///
/// `total_cents` always equals the sum of the line subtotals exactly;
/// the row is written once together with all its lines and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A persisted line item, owned by exactly one sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// 1-based position preserving the input order.
    pub line_no: i64,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit_price_cents, exact.
    pub subtotal_cents: i64,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Line detail in a sale response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineView {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// A fully resolved sale as returned to callers: header fields plus the
/// acting username and ordered line details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub username: String,
    pub lines: Vec<SaleLineView>,
}
