//! # Sale Checkout
//!
//! The sale transaction processor: turns a list of (product, quantity)
//! requests into a durable sale, atomically.
//!
//! ## Validate All, Then Commit All
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Transaction                           │
//! │                                                                     │
//! │  BEGIN                                                              │
//! │    resolve user by username ──────────────── UserNotFound?          │
//! │    for each line, in input order:                                   │
//! │      validate quantity ───────────────────── InvalidQuantity?       │
//! │      load active product ─────────────────── ProductNotFound?       │
//! │      check stock minus already-staged ────── InsufficientStock?     │
//! │      stage line (freeze name + unit price)                          │
//! │    total = Σ staged subtotals                                       │
//! │    for each staged line:                                            │
//! │      guarded decrement ───────────────────── Conflict? → ROLLBACK   │
//! │    insert sale header + lines                                       │
//! │  COMMIT                                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure before COMMIT drops the transaction, so stock and ledger
//! are untouched: a sale either happens entirely or not at all.
//!
//! ## Conflicts and Retries
//! The guarded decrement failing (or SQLite reporting the database busy)
//! means a concurrent checkout won the race. The whole attempt is retried
//! from scratch with fresh reads, up to [`CHECKOUT_MAX_RETRIES`] times;
//! a loser whose product genuinely ran out surfaces as InsufficientStock
//! on the re-validation pass rather than as a conflict.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{product, sale, user};
use kiosco_core::validation::{validate_quantity, validate_sale_request, validate_uuid};
use kiosco_core::{
    CoreError, Money, Sale, SaleLine, SaleLineRequest, SaleLineView, SaleView,
};

/// Attempts per checkout before giving up on conflicts.
pub const CHECKOUT_MAX_RETRIES: u32 = 3;

/// Outcome of a checkout that didn't produce a sale.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A business rule rejected the request. Not retryable as-is: the
    /// caller must change the request (fix a quantity, drop a line).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Concurrent checkouts kept winning the stock race. Retryable: the
    /// same request may succeed if resubmitted.
    #[error("Sale aborted after {CHECKOUT_MAX_RETRIES} conflicting attempts")]
    Conflict,

    /// The storage layer failed for reasons unrelated to the request.
    #[error("Storage failure: {0}")]
    Db(DbError),
}

impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy => CheckoutError::Conflict,
            other => CheckoutError::Db(other),
        }
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::from(DbError::from(err))
    }
}

/// A validated line waiting for commit, with its snapshots frozen.
struct StagedLine {
    product_id: String,
    name: String,
    quantity: i64,
    unit_price: Money,
    subtotal: Money,
}

/// The sale transaction processor.
///
/// ## Example
/// ```rust,ignore
/// let lines = vec![SaleLineRequest { product_id, quantity: 3 }];
/// let sale = db.checkout().create_sale("maria", &lines).await?;
/// assert_eq!(sale.total_cents, 1500);
/// ```
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Processes a sale for `username` covering `lines`, all-or-nothing.
    ///
    /// On success every requested line has been validated, stock has been
    /// decremented, and the sale with its snapshot lines is durable. On
    /// any error nothing was written.
    pub async fn create_sale(
        &self,
        username: &str,
        lines: &[SaleLineRequest],
    ) -> Result<SaleView, CheckoutError> {
        validate_sale_request(lines).map_err(CheckoutError::Domain)?;

        let mut attempt = 1;
        loop {
            match self.try_create_sale(username, lines).await {
                Err(CheckoutError::Conflict) if attempt < CHECKOUT_MAX_RETRIES => {
                    warn!(attempt, username, "Checkout conflict, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// One transactional attempt: validate against fresh reads, then write.
    async fn try_create_sale(
        &self,
        username: &str,
        lines: &[SaleLineRequest],
    ) -> Result<SaleView, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let user = user::find_by_username(&mut *tx, username)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(username.to_string()))?;

        // Validation pass: resolve and stage every line before touching
        // stock. `pending` tracks units already staged per product so
        // duplicate lines for the same product see a shrinking view.
        let mut pending: HashMap<String, i64> = HashMap::new();
        let mut staged: Vec<StagedLine> = Vec::with_capacity(lines.len());

        for line in lines {
            validate_quantity(line.quantity).map_err(|_| CoreError::InvalidQuantity {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })?;

            // A malformed id cannot name a catalog row; skip the lookup
            if validate_uuid(&line.product_id).is_err() {
                return Err(CoreError::ProductNotFound(line.product_id.clone()).into());
            }

            let product = product::find_active_by_id(&mut *tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let already_staged = pending.get(&product.id).copied().unwrap_or(0);
            let available = product.stock_quantity - already_staged;
            if available < line.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    requested: line.quantity,
                    available,
                }
                .into());
            }

            *pending.entry(product.id.clone()).or_insert(0) += line.quantity;

            let unit_price = product.price();
            staged.push(StagedLine {
                product_id: product.id,
                name: product.name,
                quantity: line.quantity,
                unit_price,
                subtotal: unit_price.multiply_quantity(line.quantity),
            });
        }

        let total: Money = staged.iter().map(|line| line.subtotal).sum();

        // Commit pass: guarded decrements first. A failed guard means a
        // concurrent transaction consumed the stock between our read and
        // this write; dropping the transaction rolls everything back.
        for (product_id, quantity) in &pending {
            if !product::decrement_stock(&mut *tx, product_id, *quantity).await? {
                debug!(%product_id, "Stock guard failed mid-commit");
                return Err(CheckoutError::Conflict);
            }
        }

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            total_cents: total.cents(),
            created_at: Utc::now(),
        };
        sale::insert_sale(&mut *tx, &sale).await?;

        for (idx, line) in staged.iter().enumerate() {
            let persisted = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                line_no: idx as i64 + 1,
                name_snapshot: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
            };
            sale::insert_line(&mut *tx, &persisted).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            username,
            lines = staged.len(),
            total = %total,
            "Sale committed"
        );

        Ok(SaleView {
            id: sale.id,
            created_at: sale.created_at,
            total_cents: sale.total_cents,
            username: username.to_string(),
            lines: staged
                .into_iter()
                .map(|line| SaleLineView {
                    product_id: line.product_id,
                    product_name: line.name,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    subtotal_cents: line.subtotal.cents(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use crate::repository::user::generate_user_id;
    use kiosco_core::{Product, Role, User};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, username: &str) {
        let user = User {
            id: generate_user_id(),
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Seller,
            created_at: Utc::now(),
        };
        db.users().insert(&user).await.unwrap();
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> String {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            barcode: format!("779-{}", name.to_lowercase()),
            name: name.to_string(),
            price_cents,
            stock_quantity: stock,
            category_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product.id
    }

    fn line(product_id: &str, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn test_simple_sale_decrements_and_totals() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;

        let view = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 3)])
            .await
            .unwrap();

        assert_eq!(view.total_cents, 1500);
        assert_eq!(view.username, "maria");
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].product_name, "Alfajor");
        assert_eq!(view.lines[0].unit_price_cents, 500);
        assert_eq!(view.lines[0].subtotal_cents, 1500);

        assert_eq!(stock_of(&db, &alfajor).await, 7);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_reports_context_and_writes_nothing() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let yerba = seed_product(&db, "Yerba", 2500, 2).await;

        let err = db
            .checkout()
            .create_sale("maria", &[line(&yerba, 5)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::Domain(CoreError::InsufficientStock {
                name,
                requested,
                available,
                ..
            }) => {
                assert_eq!(name, "Yerba");
                assert_eq!(requested, 5);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, &yerba).await, 2);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_line_all_or_nothing() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;
        let yerba = seed_product(&db, "Yerba", 2500, 1).await;

        // Second line fails, so the first line's stock must be untouched.
        let err = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 3), line(&yerba, 5)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&db, &alfajor).await, 10);
        assert_eq!(stock_of(&db, &yerba).await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_checked_before_products() {
        let db = test_db().await;

        let err = db
            .checkout()
            .create_sale("nadie", &[line("no-such-product", 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::UserNotFound(ref u)) if u == "nadie"
        ));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = test_db().await;
        seed_user(&db, "maria").await;

        // Well-formed id that simply isn't in the catalog
        let absent = generate_product_id();
        let err = db
            .checkout()
            .create_sale("maria", &[line(&absent, 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_product_id_is_not_found() {
        let db = test_db().await;
        seed_user(&db, "maria").await;

        let err = db
            .checkout()
            .create_sale("maria", &[line("not-a-uuid", 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::ProductNotFound(ref id)) if id == "not-a-uuid"
        ));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_not_sellable() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;
        db.products().soft_delete(&alfajor).await.unwrap();

        let err = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::ProductNotFound(_))
        ));
        assert_eq!(stock_of(&db, &alfajor).await, 10);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;

        let err = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 0)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::Domain(CoreError::InvalidQuantity {
                product_id,
                quantity,
            }) => {
                assert_eq!(product_id, alfajor);
                assert_eq!(quantity, 0);
            }
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
        assert_eq!(stock_of(&db, &alfajor).await, 10);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = test_db().await;
        seed_user(&db, "maria").await;

        let err = db.checkout().create_sale("maria", &[]).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Domain(CoreError::EmptySale)));
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_repricing() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;

        let view = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 2)])
            .await
            .unwrap();

        // Rename and reprice after the sale
        let mut product = db.products().get_by_id(&alfajor).await.unwrap().unwrap();
        product.name = "Alfajor Premium".to_string();
        product.price_cents = 900;
        db.products().update(&product).await.unwrap();

        let replayed = db.sales().get_view(&view.id).await.unwrap().unwrap();
        assert_eq!(replayed.lines[0].product_name, "Alfajor");
        assert_eq!(replayed.lines[0].unit_price_cents, 500);
        assert_eq!(replayed.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_duplicate_lines_share_one_stock_view() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 5).await;

        // 3 + 3 over stock 5: second line sees only 2 left
        let err = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 3), line(&alfajor, 3)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::Domain(CoreError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&db, &alfajor).await, 5);

        // 3 + 2 exactly drains it
        let view = db
            .checkout()
            .create_sale("maria", &[line(&alfajor, 3), line(&alfajor, 2)])
            .await
            .unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.total_cents, 2500);
        assert_eq!(stock_of(&db, &alfajor).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_overdraw_has_one_winner() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        seed_user(&db, "pedro").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 15).await;

        let db_a = db.clone();
        let db_b = db.clone();
        let id_a = alfajor.clone();
        let id_b = alfajor.clone();

        let (a, b) = tokio::join!(
            async move { db_a.checkout().create_sale("maria", &[line(&id_a, 10)]).await },
            async move { db_b.checkout().create_sale("pedro", &[line(&id_b, 10)]).await },
        );

        let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(oks, 1, "exactly one checkout must win");

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser,
            Err(CheckoutError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 10,
                ..
            }))
        ));

        assert_eq!(stock_of(&db, &alfajor).await, 5);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_total_is_sum_of_lines_in_input_order() {
        let db = test_db().await;
        seed_user(&db, "maria").await;
        let alfajor = seed_product(&db, "Alfajor", 500, 10).await;
        let yerba = seed_product(&db, "Yerba", 2500, 4).await;
        let gaseosa = seed_product(&db, "Gaseosa", 1350, 6).await;

        let view = db
            .checkout()
            .create_sale(
                "maria",
                &[line(&yerba, 2), line(&alfajor, 3), line(&gaseosa, 1)],
            )
            .await
            .unwrap();

        let subtotal_sum: i64 = view.lines.iter().map(|l| l.subtotal_cents).sum();
        assert_eq!(view.total_cents, subtotal_sum);
        assert_eq!(view.total_cents, 5000 + 1500 + 1350);

        // Lines come back in the order they were requested
        assert_eq!(view.lines[0].product_name, "Yerba");
        assert_eq!(view.lines[1].product_name, "Alfajor");
        assert_eq!(view.lines[2].product_name, "Gaseosa");

        // And the persisted ledger agrees
        let persisted = db.sales().get_view(&view.id).await.unwrap().unwrap();
        assert_eq!(persisted.total_cents, view.total_cents);
        assert_eq!(persisted.lines.len(), 3);
        assert_eq!(persisted.lines[0].product_name, "Yerba");
    }
}
