//! # Sale Repository
//!
//! Read side of the sale ledger, plus the raw inserts the checkout
//! transaction uses to append to it.
//!
//! Sales are append-only: there is no update or delete here. Views
//! resolve the acting username and render the frozen line snapshots, so
//! history reads the same no matter what happened to the live catalog
//! since.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use chrono::{DateTime, Utc};
use kiosco_core::{Sale, SaleLine, SaleLineView, SaleView};

/// Sale header joined with the acting username.
#[derive(Debug, sqlx::FromRow)]
struct SaleHeaderRow {
    id: String,
    created_at: DateTime<Utc>,
    total_cents: i64,
    username: String,
}

/// Appends a sale header on the caller's connection.
///
/// Used inside the checkout transaction.
pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sales (id, user_id, total_cents, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&sale.id)
    .bind(&sale.user_id)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Appends one sale line on the caller's connection.
///
/// Used inside the checkout transaction, once per line, in input order.
pub async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sale_lines (
            id, sale_id, product_id, line_no, name_snapshot,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(line.line_no)
    .bind(&line.name_snapshot)
    .bind(line.quantity)
    .bind(line.unit_price_cents)
    .bind(line.subtotal_cents)
    .execute(conn)
    .await?;

    Ok(())
}

/// Repository for reading the sale ledger.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists all sales, newest first, each with its ordered lines.
    pub async fn list(&self) -> DbResult<Vec<SaleView>> {
        debug!("Listing sales");

        let headers = sqlx::query_as::<_, SaleHeaderRow>(
            "SELECT s.id, s.created_at, s.total_cents, u.username
             FROM sales s
             JOIN users u ON u.id = s.user_id
             ORDER BY s.created_at DESC, s.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(headers.len());
        for header in headers {
            let lines = self.get_lines(&header.id).await?;
            views.push(assemble_view(header, lines));
        }

        Ok(views)
    }

    /// Gets one sale with its lines, or None if it doesn't exist.
    pub async fn get_view(&self, id: &str) -> DbResult<Option<SaleView>> {
        let header = sqlx::query_as::<_, SaleHeaderRow>(
            "SELECT s.id, s.created_at, s.total_cents, u.username
             FROM sales s
             JOIN users u ON u.id = s.user_id
             WHERE s.id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => {
                let lines = self.get_lines(&header.id).await?;
                Ok(Some(assemble_view(header, lines)))
            }
            None => Ok(None),
        }
    }

    /// Gets the persisted lines of a sale in input order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT id, sale_id, product_id, line_no, name_snapshot,
                    quantity, unit_price_cents, subtotal_cents
             FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Counts sales in the ledger (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn assemble_view(header: SaleHeaderRow, lines: Vec<SaleLine>) -> SaleView {
    SaleView {
        id: header.id,
        created_at: header.created_at,
        total_cents: header.total_cents,
        username: header.username,
        lines: lines
            .into_iter()
            .map(|line| SaleLineView {
                product_id: line.product_id,
                product_name: line.name_snapshot,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
            })
            .collect(),
    }
}

/// Helper to generate a new sale or sale line ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use crate::repository::user::generate_user_id;
    use kiosco_core::{Product, Role, User};

    async fn seed_user(db: &Database, username: &str) -> String {
        let user = User {
            id: generate_user_id(),
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Seller,
            created_at: Utc::now(),
        };
        db.users().insert(&user).await.unwrap();
        user.id
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

    async fn seed_sale(db: &Database, user_id: &str, total: i64, at: DateTime<Utc>) -> String {
        let sale = Sale {
            id: generate_sale_id(),
            user_id: user_id.to_string(),
            total_cents: total,
            created_at: at,
        };
        let mut conn = db.pool().acquire().await.unwrap();
        insert_sale(&mut *conn, &sale).await.unwrap();
        sale.id
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = seed_user(&db, "maria").await;

        let older = Utc::now() - chrono::Duration::minutes(5);
        let first = seed_sale(&db, &user_id, 1000, older).await;
        let second = seed_sale(&db, &user_id, 2500, Utc::now()).await;

        let views = db.sales().list().await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].id, second);
        assert_eq!(views[1].id, first);
        assert_eq!(views[0].username, "maria");
        assert_eq!(views[0].total_cents, 2500);
    }

    #[tokio::test]
    async fn test_get_view_missing_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().get_view("no-such-sale").await.unwrap().is_none());
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lines_come_back_in_input_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = seed_user(&db, "maria").await;
        let sale_id = seed_sale(&db, &user_id, 1700, Utc::now()).await;

        // Lines must reference catalog rows: sale_lines.product_id is a FK
        let yerba = seed_product(&db, "Yerba", 1200, 5).await;
        let alfajor = seed_product(&db, "Alfajor", 500, 5).await;

        let mut conn = db.pool().acquire().await.unwrap();
        // Insert out of order; line_no drives the read order
        for (line_no, product_id, name, qty, price) in
            [(2, &yerba, "Yerba", 1, 1200), (1, &alfajor, "Alfajor", 1, 500)]
        {
            let line = SaleLine {
                id: generate_sale_id(),
                sale_id: sale_id.clone(),
                product_id: product_id.clone(),
                line_no,
                name_snapshot: name.to_string(),
                quantity: qty,
                unit_price_cents: price,
                subtotal_cents: qty * price,
            };
            insert_line(&mut *conn, &line).await.unwrap();
        }
        drop(conn);

        let view = db.sales().get_view(&sale_id).await.unwrap().unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].product_name, "Alfajor");
        assert_eq!(view.lines[1].product_name, "Yerba");
    }

    #[tokio::test]
    async fn test_line_for_unknown_product_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user_id = seed_user(&db, "maria").await;
        let sale_id = seed_sale(&db, &user_id, 500, Utc::now()).await;

        let line = SaleLine {
            id: generate_sale_id(),
            sale_id,
            product_id: generate_product_id(), // never inserted into products
            line_no: 1,
            name_snapshot: "Fantasma".to_string(),
            quantity: 1,
            unit_price_cents: 500,
            subtotal_cents: 500,
        };

        let mut conn = db.pool().acquire().await.unwrap();
        let err = insert_line(&mut *conn, &line).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
