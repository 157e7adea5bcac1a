//! # Error Types
//!
//! Domain-specific error types for kiosco-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           Error Types                               │
//! │                                                                     │
//! │  kiosco-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  kiosco-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── CheckoutError    - Sale transaction outcomes                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impls)
//! 2. Include context in error messages (product id, requested vs available)
//! 3. Errors are enum variants, never bare strings

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected while processing a sale.
///
/// Every variant carries enough context for the caller to correct and
/// resubmit the same line set.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Acting user cannot be resolved by name.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Product id doesn't exist, or the product was soft-deleted.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A sale line requested a non-positive or out-of-range quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// Requested more units than the inventory holds.
    ///
    /// ```text
    /// Request line: (product, qty: 5)
    ///      │
    ///      ▼
    /// Current stock: 2
    ///      │
    ///      ▼
    /// InsufficientStock { requested: 5, available: 2 }
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        requested: i64,
        available: i64,
    },

    /// A sale must contain at least one line.
    #[error("Sale must contain at least one line")]
    EmptySale,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
