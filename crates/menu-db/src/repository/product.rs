//! # Product Repository
//!
//! Database operations for the menu catalog.
//!
//! ## Key Operations
//! - CRUD operations
//! - Batch lookup for order assembly
//! - Global menu discount (apply / reset)
//! - First-run seeding of the default menu
//!
//! ## Global Discount Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products                                                               │
//! │  ┌──────────┬─────────────┬──────────────────────┐                      │
//! │  │ id       │ price_cents │ original_price_cents │                      │
//! │  ├──────────┼─────────────┼──────────────────────┤                      │
//! │  │ burger1  │  12000      │  NULL                │ ← no discount        │
//! │  │ burger1  │   9600      │  12000               │ ← 20% applied        │
//! │  │ burger1  │   8400      │  12000               │ ← 30% applied later  │
//! │  └──────────┴─────────────┴──────────────────────┘                      │
//! │                                                                         │
//! │  The original is written once, by the first discount. Every later      │
//! │  discount is computed from it, so discounts never compound.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::tx::WriteTx;
use menu_core::catalog::discounted_price;
use menu_core::{Money, Percent, Product, ProductCategory};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, original_price_cents, \
                               category, image, rating, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    original_price_cents: Option<i64>,
    category: ProductCategory,
    image: Option<String>,
    rating: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            original_price_cents: row.original_price_cents,
            category: row.category,
            image: row.image,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Result of [`ProductRepository::seed_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The table was empty and this many products were inserted.
    Inserted(usize),
    /// The table already held this many products; nothing was written.
    AlreadySeeded(i64),
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let burgers = repo.list(Some(ProductCategory::Burger)).await?;
/// let changed = repo.apply_global_discount(Percent::from_whole(20), Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, optionally filtered by category.
    ///
    /// Sorted by category then name, the order the menu displays them in.
    pub async fn list(&self, category: Option<ProductCategory>) -> DbResult<Vec<Product>> {
        debug!(category = ?category, "Listing products");

        let rows: Vec<ProductRow> = match category {
            Some(category) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 ORDER BY name, id"
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY category, name, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Loads every product whose ID appears in `ids`.
    ///
    /// Unknown IDs are simply absent from the result; order assembly reports
    /// them to the caller.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = rows.len(), "Loaded products for order");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::UniqueViolation)` - ID already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, original_price_cents,
                category, image, rating, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.original_price_cents)
        .bind(product.category)
        .bind(&product.image)
        .bind(product.rating)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("id", &product.id))?;

        Ok(product.clone())
    }

    /// Writes every field of an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                original_price_cents = ?5,
                category = ?6,
                image = ?7,
                rating = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.original_price_cents)
        .bind(product.category)
        .bind(&product.image)
        .bind(product.rating)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Hard-deletes a product.
    ///
    /// Orders keep their own copy of name, price and image, so history is
    /// unaffected.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts `defaults` only if the catalog is empty.
    pub async fn seed_defaults(&self, defaults: &[Product]) -> DbResult<SeedOutcome> {
        let mut tx = WriteTx::begin(&self.pool).await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(tx.conn()?)
            .await?;

        if existing > 0 {
            tx.rollback().await?;
            debug!(existing, "Catalog already seeded");
            return Ok(SeedOutcome::AlreadySeeded(existing));
        }

        for product in defaults {
            sqlx::query(
                r#"
                INSERT INTO products (
                    id, name, description, price_cents, original_price_cents,
                    category, image, rating, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price_cents)
            .bind(product.category)
            .bind(&product.image)
            .bind(product.rating)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(tx.conn()?)
            .await?;
        }

        tx.commit().await?;

        info!(count = defaults.len(), "Seeded default menu");
        Ok(SeedOutcome::Inserted(defaults.len()))
    }

    /// Sets every product's price to `pct` off its original price.
    ///
    /// Products without a remembered original get their current price
    /// remembered first. Returns the number of products repriced.
    pub async fn apply_global_discount(&self, pct: Percent, now: DateTime<Utc>) -> DbResult<u64> {
        info!(percent = %pct, "Applying global discount");

        let mut tx = WriteTx::begin(&self.pool).await?;

        let rows: Vec<(String, i64, Option<i64>)> =
            sqlx::query_as("SELECT id, price_cents, original_price_cents FROM products")
                .fetch_all(tx.conn()?)
                .await?;

        let mut changed = 0u64;
        for (id, price_cents, original_price_cents) in rows {
            let original = original_price_cents.unwrap_or(price_cents);
            let price = discounted_price(Money::from_cents(original), pct);

            changed += sqlx::query(
                r#"
                UPDATE products
                SET price_cents = ?2, original_price_cents = ?3, updated_at = ?4
                WHERE id = ?1
                "#,
            )
            .bind(&id)
            .bind(price.cents())
            .bind(original)
            .bind(now)
            .execute(tx.conn()?)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        info!(changed, "Global discount applied");
        Ok(changed)
    }

    /// Restores original prices on every discounted product.
    ///
    /// Returns the number of products restored.
    pub async fn reset_global_discount(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET price_cents = original_price_cents,
                original_price_cents = NULL,
                updated_at = ?1
            WHERE original_price_cents IS NOT NULL
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(restored = result.rows_affected(), "Global discount reset");
        Ok(result.rows_affected())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
