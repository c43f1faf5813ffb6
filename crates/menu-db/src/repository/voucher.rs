//! # Voucher Repository
//!
//! Database operations for vouchers, including the atomic usage claim.
//!
//! ## Atomic Claim
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            maxUses = 1, two customers press "Apply" together            │
//! │                                                                         │
//! │  Request A                         Request B                            │
//! │  validate → OK (0/1)               validate → OK (0/1)                  │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  UPDATE … SET used_count+1         UPDATE … SET used_count+1            │
//! │  WHERE used_count < max_uses       WHERE used_count < max_uses          │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  1 row  → claimed (1/1)            0 rows → ConditionFailed             │
//! │                                                                         │
//! │  SQLite serializes writers, so the guard and the increment can never   │
//! │  interleave. The earlier validation is only a fast path.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use menu_core::{Discount, DiscountKind, Money, ProductCategory, Voucher};

pub(crate) const VOUCHER_COLUMNS: &str = "id, code, discount_type, discount_value, \
     min_order_value_cents, category, start_date, expiry_date, max_uses, used_count, \
     is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct VoucherRow {
    id: String,
    code: String,
    discount_type: DiscountKind,
    discount_value: i64,
    min_order_value_cents: i64,
    category: Option<ProductCategory>,
    start_date: DateTime<Utc>,
    expiry_date: DateTime<Utc>,
    max_uses: Option<i64>,
    used_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VoucherRow> for Voucher {
    type Error = DbError;

    fn try_from(row: VoucherRow) -> DbResult<Self> {
        let discount = Discount::from_parts(row.discount_type, row.discount_value)
            .ok_or_else(|| {
                DbError::corrupt("Voucher", &row.id, "discount value out of range")
            })?;

        Ok(Voucher {
            id: row.id,
            code: row.code,
            discount,
            min_order_value_cents: row.min_order_value_cents,
            category: row.category,
            start_date: row.start_date,
            expiry_date: row.expiry_date,
            max_uses: row.max_uses,
            used_count: row.used_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Increments `used_count` if and only if the voucher is still eligible.
///
/// Runs on any executor so order creation can claim inside its own
/// transaction. Returns the updated voucher, or `None` if any condition
/// failed (cap reached, outside its window, inactive, below minimum).
pub(crate) async fn claim_in<'e, E>(
    executor: E,
    id: &str,
    order_value: Money,
    now: DateTime<Utc>,
) -> DbResult<Option<Voucher>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<VoucherRow> = sqlx::query_as(&format!(
        r#"
        UPDATE vouchers
        SET used_count = used_count + 1, updated_at = ?2
        WHERE id = ?1
          AND is_active = 1
          AND (max_uses IS NULL OR used_count < max_uses)
          AND julianday(start_date) <= julianday(?2)
          AND julianday(expiry_date) >= julianday(?2)
          AND min_order_value_cents <= ?3
        RETURNING {VOUCHER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(now)
    .bind(order_value.cents())
    .fetch_optional(executor)
    .await?;

    row.map(Voucher::try_from).transpose()
}

/// Repository for voucher database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.vouchers();
///
/// let voucher = repo.find_active_by_code("WELCOME10").await?;
/// let claimed = repo.claim(&voucher.id, subtotal, Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

impl VoucherRepository {
    /// Creates a new VoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VoucherRepository { pool }
    }

    /// Lists all vouchers, newest first.
    pub async fn list(&self) -> DbResult<Vec<Voucher>> {
        let sql = format!("SELECT {VOUCHER_COLUMNS} FROM vouchers ORDER BY created_at DESC, code");
        let rows: Vec<VoucherRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Voucher::try_from).collect()
    }

    /// Gets a voucher by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Voucher>> {
        let sql = format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = ?1");
        let row: Option<VoucherRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Voucher::try_from).transpose()
    }

    /// Finds an active voucher by its normalized code.
    ///
    /// Inactive vouchers are treated as unknown codes.
    pub async fn find_active_by_code(&self, code: &str) -> DbResult<Option<Voucher>> {
        let sql = format!("SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE code = ?1 AND is_active = 1");
        let row: Option<VoucherRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Voucher::try_from).transpose()
    }

    /// Inserts a new voucher.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the code is taken
    pub async fn insert(&self, voucher: &Voucher) -> DbResult<Voucher> {
        debug!(code = %voucher.code, "Inserting voucher");

        sqlx::query(
            r#"
            INSERT INTO vouchers (
                id, code, discount_type, discount_value, min_order_value_cents,
                category, start_date, expiry_date, max_uses, used_count,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&voucher.id)
        .bind(&voucher.code)
        .bind(voucher.discount.kind())
        .bind(voucher.discount.raw_value())
        .bind(voucher.min_order_value_cents)
        .bind(voucher.category)
        .bind(voucher.start_date)
        .bind(voucher.expiry_date)
        .bind(voucher.max_uses)
        .bind(voucher.used_count)
        .bind(voucher.is_active)
        .bind(voucher.created_at)
        .bind(voucher.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("code", &voucher.code))?;

        Ok(voucher.clone())
    }

    /// Writes an edited voucher, guarded against concurrent claims.
    ///
    /// The write only lands if the code is unchanged or the voucher is
    /// still unused, and the cap still covers the stored usage count. A
    /// claim that slipped in after the caller read the row makes this fail
    /// with `ConditionFailed`.
    pub async fn update(&self, voucher: &Voucher) -> DbResult<Voucher> {
        debug!(id = %voucher.id, code = %voucher.code, "Updating voucher");

        let sql = format!(
            r#"
            UPDATE vouchers SET
                code = ?2,
                discount_type = ?3,
                discount_value = ?4,
                min_order_value_cents = ?5,
                category = ?6,
                start_date = ?7,
                expiry_date = ?8,
                max_uses = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
              AND (used_count = 0 OR code = ?2)
              AND (?9 IS NULL OR used_count <= ?9)
            RETURNING {VOUCHER_COLUMNS}
            "#
        );

        let row: Option<VoucherRow> = sqlx::query_as(&sql)
            .bind(&voucher.id)
            .bind(&voucher.code)
            .bind(voucher.discount.kind())
            .bind(voucher.discount.raw_value())
            .bind(voucher.min_order_value_cents)
            .bind(voucher.category)
            .bind(voucher.start_date)
            .bind(voucher.expiry_date)
            .bind(voucher.max_uses)
            .bind(voucher.is_active)
            .bind(voucher.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value("code", &voucher.code))?;

        match row {
            Some(row) => Voucher::try_from(row),
            None => Err(self.missing_or_conflict(&voucher.id).await),
        }
    }

    /// Deletes a voucher that has never been used.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting voucher");

        let result = sqlx::query("DELETE FROM vouchers WHERE id = ?1 AND used_count = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(id).await);
        }

        Ok(())
    }

    /// Atomically records one use of the voucher.
    ///
    /// ## Returns
    /// * `Ok(Some(Voucher))` - claimed; the voucher with its new `used_count`
    /// * `Ok(None)` - not eligible at this instant; nothing was written
    pub async fn claim(
        &self,
        id: &str,
        order_value: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Voucher>> {
        let claimed = claim_in(&self.pool, id, order_value, now).await?;

        match &claimed {
            Some(v) => info!(code = %v.code, used_count = v.used_count, "Voucher claimed"),
            None => debug!(id = %id, "Voucher claim rejected"),
        }

        Ok(claimed)
    }

    async fn missing_or_conflict(&self, id: &str) -> DbError {
        match self.get_by_id(id).await {
            Ok(Some(_)) => DbError::condition_failed("Voucher", id),
            Ok(None) => DbError::not_found("Voucher", id),
            Err(e) => e,
        }
    }
}

/// Helper to generate a new voucher ID.
pub fn generate_voucher_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use menu_core::Percent;

    fn voucher(code: &str, max_uses: Option<i64>) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: generate_voucher_id(),
            code: code.to_string(),
            discount: Discount::Percentage(Percent::from_whole(10)),
            min_order_value_cents: 5_000,
            category: None,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(30),
            max_uses,
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let db = db().await;
        let repo = db.vouchers();

        let v = repo.insert(&voucher("WELCOME10", Some(5))).await.unwrap();
        let found = repo.find_active_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(found, v);

        let err = repo.insert(&voucher("WELCOME10", None)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref field, ref value } if field == "code" && value == "WELCOME10"
        ));
    }

    #[tokio::test]
    async fn test_inactive_voucher_is_not_found_by_code() {
        let db = db().await;
        let repo = db.vouchers();

        let mut v = voucher("SLEEPY", None);
        v.is_active = false;
        repo.insert(&v).await.unwrap();

        assert!(repo.find_active_by_code("SLEEPY").await.unwrap().is_none());
        assert!(repo.get_by_id(&v.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_claim_respects_every_condition() {
        let db = db().await;
        let repo = db.vouchers();
        let now = Utc::now();

        let v = repo.insert(&voucher("ONCE", Some(1))).await.unwrap();

        // Below minimum order value
        assert!(repo
            .claim(&v.id, Money::from_cents(4_999), now)
            .await
            .unwrap()
            .is_none());

        let claimed = repo
            .claim(&v.id, Money::from_cents(5_000), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.used_count, 1);

        // Cap reached
        assert!(repo
            .claim(&v.id, Money::from_cents(5_000), now)
            .await
            .unwrap()
            .is_none());

        // Outside the window
        let late = repo.insert(&voucher("LATE", None)).await.unwrap();
        assert!(repo
            .claim(&late.id, Money::from_cents(9_000), now + Duration::days(31))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.get_by_id(&late.id).await.unwrap().unwrap().used_count,
            0
        );
    }

    #[tokio::test]
    async fn test_update_refuses_code_change_after_use() {
        let db = db().await;
        let repo = db.vouchers();

        let v = repo.insert(&voucher("SPRING", None)).await.unwrap();
        repo.claim(&v.id, Money::from_cents(6_000), Utc::now())
            .await
            .unwrap()
            .unwrap();

        // Stale copy that still thinks the voucher is unused
        let mut renamed = v.clone();
        renamed.code = "SUMMER".to_string();
        assert!(matches!(
            repo.update(&renamed).await,
            Err(DbError::ConditionFailed { .. })
        ));

        let mut extended = v.clone();
        extended.expiry_date = extended.expiry_date + Duration::days(10);
        let stored = repo.update(&extended).await.unwrap();
        assert_eq!(stored.used_count, 1);
        assert_eq!(stored.code, "SPRING");

        let mut missing = voucher("GHOST", None);
        missing.id = "missing".to_string();
        assert!(matches!(
            repo.update(&missing).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_only_unused() {
        let db = db().await;
        let repo = db.vouchers();

        let used = repo.insert(&voucher("USED", None)).await.unwrap();
        repo.claim(&used.id, Money::from_cents(6_000), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            repo.delete(&used.id).await,
            Err(DbError::ConditionFailed { .. })
        ));

        let fresh = repo.insert(&voucher("FRESH", None)).await.unwrap();
        repo.delete(&fresh.id).await.unwrap();
        assert!(matches!(
            repo.delete(&fresh.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_exceed_cap() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("claims.db")).max_connections(8))
            .await
            .unwrap();
        let repo = db.vouchers();
        let v = repo.insert(&voucher("RUSH", Some(3))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = repo.clone();
            let id = v.id.clone();
            handles.push(tokio::spawn(async move {
                repo.claim(&id, Money::from_cents(10_000), Utc::now())
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut won = 0;
        for handle in handles {
            if handle.await.unwrap() {
                won += 1;
            }
        }

        assert_eq!(won, 3);
        assert_eq!(repo.get_by_id(&v.id).await.unwrap().unwrap().used_count, 3);
    }
}
