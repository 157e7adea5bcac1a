//! # kiosco-db: Database Layer for Kiosco POS
//!
//! SQLite persistence for the POS: connection pool, embedded migrations,
//! repositories, and the transactional sale checkout.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Kiosco POS Data Flow                         │
//! │                                                                     │
//! │  Caller (boundary layer, out of scope)                              │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                    kiosco-db (THIS CRATE)                     │  │
//! │  │                                                               │  │
//! │  │   ┌────────────┐   ┌──────────────┐   ┌──────────────────┐   │  │
//! │  │   │  Database  │   │ Repositories │   │ CheckoutService  │   │  │
//! │  │   │ (pool.rs)  │◄──│ product/user │   │ validate-all,    │   │  │
//! │  │   │            │   │ category/sale│   │ then commit-all  │   │  │
//! │  │   └────────────┘   └──────────────┘   └──────────────────┘   │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL, foreign keys on, embedded migrations)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kiosco_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./kiosco.db")).await?;
//!
//! // CRUD primitives
//! let products = db.products().list_active(50).await?;
//!
//! // The core operation: atomic multi-line sale
//! let sale = db.checkout().create_sale("maria", &lines).await?;
//! ```

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::{CheckoutError, CheckoutService};
pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
