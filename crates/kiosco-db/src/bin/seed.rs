//! Seeds a database with demo data for local development.
//!
//! ```text
//! cargo run --bin seed -- [path/to/kiosco.db]
//! ```
//!
//! Idempotent on a fresh file; re-running against a seeded database fails
//! on the unique constraints, which is the signal that seeding already
//! happened.

use std::error::Error;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kiosco_core::{validation, Category, Product, Role, User};
use kiosco_db::repository::category::generate_category_id;
use kiosco_db::repository::product::generate_product_id;
use kiosco_db::repository::user::generate_user_id;
use kiosco_db::{Database, DbConfig};

const PRODUCTS: &[(&str, &str, i64, i64, &str)] = &[
    // (barcode, name, price_cents, stock, category)
    ("7791234560011", "Alfajor Triple", 500, 48, "Golosinas"),
    ("7791234560028", "Caramelos Masticables", 150, 200, "Golosinas"),
    ("7791234560035", "Gaseosa 500ml", 1350, 36, "Bebidas"),
    ("7791234560042", "Agua Mineral 1.5L", 900, 24, "Bebidas"),
    ("7791234560059", "Yerba 500g", 2500, 12, "Almacen"),
    ("7791234560066", "Galletitas Surtidas", 780, 30, "Almacen"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./kiosco.db".to_string());

    info!(%path, "Seeding database");
    let db = Database::new(DbConfig::new(&path)).await?;

    let now = Utc::now();

    // Categories first so products can reference them
    let mut category_ids = std::collections::HashMap::new();
    for name in ["Golosinas", "Bebidas", "Almacen"] {
        validation::validate_name(name)?;
        let category = Category {
            id: generate_category_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await?;
        category_ids.insert(name, category.id);
    }
    info!(count = category_ids.len(), "Categories seeded");

    for (barcode, name, price_cents, stock, category) in PRODUCTS {
        validation::validate_barcode(barcode)?;
        validation::validate_name(name)?;
        validation::validate_price_cents(*price_cents)?;
        validation::validate_stock_quantity(*stock)?;

        let product = Product {
            id: generate_product_id(),
            barcode: barcode.to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            stock_quantity: *stock,
            category_id: category_ids.get(category).cloned(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    info!(count = PRODUCTS.len(), "Products seeded");

    for (username, role) in [("admin", Role::Admin), ("maria", Role::Seller)] {
        validation::validate_username(username)?;
        let user = User {
            id: generate_user_id(),
            username: username.to_string(),
            // Placeholder hash; real credentials are issued by the service
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$demo$demo".to_string(),
            role,
            created_at: now,
        };
        db.users().insert(&user).await?;
    }
    info!("Users seeded");

    let active = db.products().count().await?;
    info!(active_products = active, "Seed complete");

    db.close().await;
    Ok(())
}
