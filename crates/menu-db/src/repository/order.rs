//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft (priced by menu-core)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  order gate (process mutex)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                        │
//! │    1. SELECT last order_number → strategy → "261016-0042"               │
//! │    2. claim voucher (conditional UPDATE … RETURNING)                    │
//! │         └── no row? ROLLBACK → ConditionFailed                          │
//! │    3. INSERT orders, INSERT order_items                                 │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  (Order, Option<Voucher>) → caller notifies                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every row lands or none does: an order is never stored without
//! its voucher use, and a voucher use is never consumed without an order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::voucher::claim_in;
use crate::tx::WriteTx;
use menu_core::order::{OrderDraft, OrderNumberStrategy};
use menu_core::{
    AppliedDiscount, Customer, Discount, DiscountKind, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus, Percent, TaxLine, Voucher,
};

const ORDER_COLUMNS: &str = "id, order_number, table_number, subtotal_cents, \
     tax_rate_bps, tax_cents, service_rate_bps, service_cents, \
     voucher_id, voucher_code, discount_type, discount_value, discount_cents, \
     total_cents, status, payment_status, payment_method, customer_name, customer_phone, \
     notes, created_at, updated_at, completed_at, cancelled_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, name_snapshot, unit_price_cents, \
     image_snapshot, quantity, line_total_cents, notes";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    table_number: String,
    subtotal_cents: i64,
    tax_rate_bps: i64,
    tax_cents: i64,
    service_rate_bps: i64,
    service_cents: i64,
    voucher_id: Option<String>,
    voucher_code: Option<String>,
    discount_type: Option<DiscountKind>,
    discount_value: Option<i64>,
    discount_cents: i64,
    total_cents: i64,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    order_id: String,
    product_id: String,
    name_snapshot: String,
    unit_price_cents: i64,
    image_snapshot: Option<String>,
    quantity: i64,
    line_total_cents: i64,
    notes: Option<String>,
}

impl From<ItemRow> for OrderItem {
    fn from(row: ItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            name_snapshot: row.name_snapshot,
            unit_price_cents: row.unit_price_cents,
            image_snapshot: row.image_snapshot,
            quantity: row.quantity,
            line_total_cents: row.line_total_cents,
            notes: row.notes,
        }
    }
}

fn rate(id: &str, bps: i64) -> DbResult<Percent> {
    u32::try_from(bps)
        .map(Percent::from_bps)
        .map_err(|_| DbError::corrupt("Order", id, format!("rate {bps} out of range")))
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        let tax = TaxLine {
            rate: rate(&self.id, self.tax_rate_bps)?,
            amount_cents: self.tax_cents,
        };
        let service_tax = TaxLine {
            rate: rate(&self.id, self.service_rate_bps)?,
            amount_cents: self.service_cents,
        };

        let discount = match (
            self.voucher_id,
            self.voucher_code,
            self.discount_type,
            self.discount_value,
        ) {
            (Some(voucher_id), Some(voucher_code), Some(kind), Some(value)) => {
                let discount = Discount::from_parts(kind, value).ok_or_else(|| {
                    DbError::corrupt("Order", &self.id, "discount value out of range")
                })?;
                Some(AppliedDiscount {
                    voucher_id,
                    voucher_code,
                    discount,
                    amount_cents: self.discount_cents,
                })
            }
            (None, None, None, None) => None,
            _ => {
                return Err(DbError::corrupt(
                    "Order",
                    &self.id,
                    "partial discount columns",
                ))
            }
        };

        let customer = match (self.customer_name, self.customer_phone) {
            (None, None) => None,
            (name, phone) => Some(Customer { name, phone }),
        };

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            table_number: self.table_number,
            items,
            subtotal_cents: self.subtotal_cents,
            tax,
            service_tax,
            discount,
            total_cents: self.total_cents,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            customer,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

/// Repository for order database operations.
///
/// ## Usage
/// ```rust,ignore
/// let draft = OrderDraft::assemble(&request, &catalog, &settings, voucher.as_ref(), now)?;
/// let (order, claimed) = db.orders().create(draft, &GlobalSequence).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    order_gate: Arc<Mutex<()>>,
}

impl OrderRepository {
    /// Creates a new OrderRepository sharing `order_gate` with every other
    /// handle from the same [`Database`](crate::Database).
    pub fn new(pool: SqlitePool, order_gate: Arc<Mutex<()>>) -> Self {
        OrderRepository { pool, order_gate }
    }

    /// Lists orders newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        debug!(status = ?status, "Listing orders");

        let rows: Vec<OrderRow> = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 ORDER BY rowid DESC"
                );
                sqlx::query_as(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY rowid DESC");
                sqlx::query_as(&sql).fetch_all(&self.pool).await?
            }
        };

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for row in &rows {
            separated.push_bind(row.id.as_str());
        }
        separated.push_unseparated(") ORDER BY order_id, position");

        let item_rows: Vec<ItemRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            items_by_order
                .entry(item.order_id.clone())
                .or_default()
                .push(OrderItem::from(item));
        }

        rows.into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Numbers and stores an order, claiming its voucher in the same
    /// transaction.
    ///
    /// ## Returns
    /// * `Ok((Order, Some(Voucher)))` - stored; the voucher with its new usage count
    /// * `Ok((Order, None))` - stored; no voucher on the order
    /// * `Err(DbError::ConditionFailed)` - the voucher was no longer eligible
    ///   (or its terms changed); nothing was written
    pub async fn create(
        &self,
        draft: OrderDraft,
        strategy: &dyn OrderNumberStrategy,
    ) -> DbResult<(Order, Option<Voucher>)> {
        let now = draft.created_at;
        let subtotal = draft.subtotal();

        let _gate = self.order_gate.lock().await;
        let mut tx = WriteTx::begin(&self.pool).await?;

        let last: Option<String> =
            sqlx::query_scalar("SELECT order_number FROM orders ORDER BY rowid DESC LIMIT 1")
                .fetch_optional(tx.conn()?)
                .await?;
        let order_number = strategy.next_number(last.as_deref(), now.date_naive());

        let claimed = match &draft.discount {
            Some(applied) => {
                let claimed = claim_in(tx.conn()?, &applied.voucher_id, subtotal, now).await?;
                match claimed {
                    Some(voucher) if voucher.discount == applied.discount => Some(voucher),
                    Some(_) => {
                        tx.rollback().await?;
                        warn!(code = %applied.voucher_code, "Voucher terms changed during checkout");
                        return Err(DbError::condition_failed("Voucher", &applied.voucher_id));
                    }
                    None => {
                        tx.rollback().await?;
                        debug!(code = %applied.voucher_code, "Voucher claim failed during checkout");
                        return Err(DbError::condition_failed("Voucher", &applied.voucher_id));
                    }
                }
            }
            None => None,
        };

        let order = draft.finalize(order_number);
        insert_order(tx.conn()?, &order).await?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            items = order.items.len(),
            total_cents = order.total_cents,
            voucher = ?order.discount.as_ref().map(|d| &d.voucher_code),
            "Order created"
        );

        Ok((order, claimed))
    }

    /// Writes a status/payment/notes change, conditional on the status the
    /// caller read.
    ///
    /// ## Returns
    /// * `Err(DbError::ConditionFailed)` - the status changed in the meantime
    /// * `Err(DbError::NotFound)` - the order no longer exists
    pub async fn update(&self, order: &Order, expected_status: OrderStatus) -> DbResult<()> {
        debug!(id = %order.id, status = %order.status, "Updating order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                payment_status = ?3,
                notes = ?4,
                updated_at = ?5,
                completed_at = ?6,
                cancelled_at = ?7
            WHERE id = ?1 AND status = ?8
            "#,
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(order.cancelled_at)
        .bind(expected_status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = ?1")
                .bind(&order.id)
                .fetch_optional(&self.pool)
                .await?;
            return Err(match exists {
                Some(_) => DbError::condition_failed("Order", &order.id),
                None => DbError::not_found("Order", &order.id),
            });
        }

        Ok(())
    }

    /// Deletes an order and its items.
    ///
    /// Voucher usage is not given back.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Counts total orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY position");
    let items: Vec<ItemRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    row.into_order(items.into_iter().map(OrderItem::from).collect())
        .map(Some)
}

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    let discount = order.discount.as_ref();

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, table_number, subtotal_cents,
            tax_rate_bps, tax_cents, service_rate_bps, service_cents,
            voucher_id, voucher_code, discount_type, discount_value, discount_cents,
            total_cents, status, payment_status, payment_method,
            customer_name, customer_phone, notes,
            created_at, updated_at, completed_at, cancelled_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17,
            ?18, ?19, ?20,
            ?21, ?22, ?23, ?24
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.table_number)
    .bind(order.subtotal_cents)
    .bind(i64::from(order.tax.rate.bps()))
    .bind(order.tax.amount_cents)
    .bind(i64::from(order.service_tax.rate.bps()))
    .bind(order.service_tax.amount_cents)
    .bind(discount.map(|d| d.voucher_id.as_str()))
    .bind(discount.map(|d| d.voucher_code.as_str()))
    .bind(discount.map(|d| d.discount.kind()))
    .bind(discount.map(|d| d.discount.raw_value()))
    .bind(order.discount_amount().cents())
    .bind(order.total_cents)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.payment_method)
    .bind(order.customer.as_ref().and_then(|c| c.name.as_deref()))
    .bind(order.customer.as_ref().and_then(|c| c.phone.as_deref()))
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.completed_at)
    .bind(order.cancelled_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value("order_number", &order.order_number))?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, position, product_id, name_snapshot,
                unit_price_cents, image_snapshot, quantity, line_total_cents, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&order.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(&item.image_snapshot)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(&item.notes)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use menu_core::catalog::default_menu;
    use menu_core::order::{CartLine, DailySequence, GlobalSequence, OrderRequest, OrderUpdate};
    use menu_core::{Money, TaxSettings};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .seed_defaults(&default_menu(Utc::now()))
            .await
            .unwrap();
        db
    }

    fn request(lines: &[(&str, i64)]) -> OrderRequest {
        OrderRequest {
            items: lines
                .iter()
                .map(|(id, qty)| CartLine {
                    product_id: id.to_string(),
                    quantity: *qty,
                    notes: None,
                })
                .collect(),
            table_number: Some("7".to_string()),
            customer: Some(Customer {
                name: Some("Sara".to_string()),
                phone: None,
            }),
            ..Default::default()
        }
    }

    async fn draft(
        db: &Database,
        req: &OrderRequest,
        voucher: Option<&Voucher>,
        now: DateTime<Utc>,
    ) -> OrderDraft {
        let ids: Vec<String> = req.items.iter().map(|l| l.product_id.clone()).collect();
        let catalog = db.products().get_many(&ids).await.unwrap();
        OrderDraft::assemble(req, &catalog, &TaxSettings::default(), voucher, now).unwrap()
    }

    fn capped_voucher(code: &str, max_uses: i64) -> Voucher {
        let now = Utc::now();
        Voucher {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            discount: Discount::Fixed(Money::from_cents(2_000)),
            min_order_value_cents: 0,
            category: None,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(1),
            max_uses: Some(max_uses),
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = seeded().await;
        let now = Utc::now();
        let d = draft(&db, &request(&[("burger1", 2), ("drink1", 1)]), None, now).await;

        let (order, claimed) = db.orders().create(d, &GlobalSequence).await.unwrap();
        assert!(claimed.is_none());
        assert!(order.order_number.ends_with("-0001"));

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
        assert_eq!(stored.items[0].product_id, "burger1");
        assert_eq!(stored.items[1].product_id, "drink1");
        // 2 × 120.00 + 35.00 = 275.00, tax 15% = 41.25
        assert_eq!(stored.subtotal_cents, 27_500);
        assert_eq!(stored.total_cents, 31_625);
    }

    #[tokio::test]
    async fn test_order_snapshot_survives_product_changes() {
        let db = seeded().await;
        let now = Utc::now();
        let d = draft(&db, &request(&[("pizza1", 1)]), None, now).await;
        let (order, _) = db.orders().create(d, &GlobalSequence).await.unwrap();

        db.products()
            .apply_global_discount(Percent::from_whole(50), now)
            .await
            .unwrap();
        db.products().delete("pizza1").await.unwrap();

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].name_snapshot, "Pepperoni Pizza");
        assert_eq!(stored.items[0].unit_price_cents, 14_000);
        assert_eq!(stored.subtotal_cents, 14_000);
    }

    #[tokio::test]
    async fn test_numbers_increase() {
        let db = seeded().await;
        let now = Utc::now();

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let d = draft(&db, &request(&[("drink1", 1)]), None, now).await;
            numbers.push(db.orders().create(d, &GlobalSequence).await.unwrap().0.order_number);
        }

        let suffixes: Vec<&str> = numbers.iter().map(|n| &n[7..]).collect();
        assert_eq!(suffixes, vec!["0001", "0002", "0003"]);
    }

    #[tokio::test]
    async fn test_daily_numbering_restarts() {
        let db = seeded().await;
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let day2 = day1 + Duration::days(1);

        for _ in 0..2 {
            let d = draft(&db, &request(&[("drink1", 1)]), None, day1).await;
            db.orders().create(d, &DailySequence).await.unwrap();
        }
        let d = draft(&db, &request(&[("drink1", 1)]), None, day2).await;
        let (order, _) = db.orders().create(d, &DailySequence).await.unwrap();

        assert_eq!(order.order_number, "260302-0001");
    }

    #[tokio::test]
    async fn test_voucher_claimed_with_order() {
        let db = seeded().await;
        let now = Utc::now();
        let v = db.vouchers().insert(&capped_voucher("TWENTY", 2)).await.unwrap();

        let d = draft(&db, &request(&[("burger2", 1)]), Some(&v), now).await;
        let (order, claimed) = db.orders().create(d, &GlobalSequence).await.unwrap();

        assert_eq!(claimed.unwrap().used_count, 1);
        let discount = order.discount.as_ref().unwrap();
        assert_eq!(discount.voucher_code, "TWENTY");
        assert_eq!(discount.amount_cents, 2_000);

        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.discount, order.discount);
    }

    #[tokio::test]
    async fn test_failed_claim_rolls_back_order() {
        let db = seeded().await;
        let now = Utc::now();
        let v = db.vouchers().insert(&capped_voucher("LAST", 1)).await.unwrap();

        // Two checkouts priced against the same fresh voucher
        let first = draft(&db, &request(&[("burger1", 1)]), Some(&v), now).await;
        let second = draft(&db, &request(&[("burger1", 1)]), Some(&v), now).await;

        db.orders().create(first, &GlobalSequence).await.unwrap();
        let err = db.orders().create(second, &GlobalSequence).await.unwrap_err();

        assert!(matches!(err, DbError::ConditionFailed { .. }));
        assert_eq!(db.orders().count().await.unwrap(), 1);
        assert_eq!(
            db.vouchers().get_by_id(&v.id).await.unwrap().unwrap().used_count,
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_share_one_voucher() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("orders.db")).max_connections(8))
            .await
            .unwrap();
        db.products()
            .seed_defaults(&default_menu(Utc::now()))
            .await
            .unwrap();
        let v = db.vouchers().insert(&capped_voucher("DUO", 2)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let db = db.clone();
            let v = v.clone();
            handles.push(tokio::spawn(async move {
                let now = Utc::now();
                let d = draft(&db, &request(&[("sandwich1", 1)]), Some(&v), now).await;
                db.orders().create(d, &GlobalSequence).await.is_ok()
            }));
        }

        let mut stored = 0;
        for handle in handles {
            if handle.await.unwrap() {
                stored += 1;
            }
        }

        assert_eq!(stored, 2);
        assert_eq!(db.orders().count().await.unwrap(), 2);
        assert_eq!(
            db.vouchers().get_by_id(&v.id).await.unwrap().unwrap().used_count,
            2
        );

        let listed = db.orders().list(None).await.unwrap();
        assert_ne!(listed[0].order_number, listed[1].order_number);
    }

    #[tokio::test]
    async fn test_update_is_conditional_on_status() {
        let db = seeded().await;
        let now = Utc::now();
        let d = draft(&db, &request(&[("drink1", 1)]), None, now).await;
        let (order, _) = db.orders().create(d, &GlobalSequence).await.unwrap();

        let preparing = OrderUpdate {
            status: Some(OrderStatus::Preparing),
            ..Default::default()
        }
        .apply_to(&order, now)
        .unwrap();
        db.orders().update(&preparing, order.status).await.unwrap();

        // A second writer that still saw `pending`
        let canceled = OrderUpdate {
            status: Some(OrderStatus::Canceled),
            ..Default::default()
        }
        .apply_to(&order, now)
        .unwrap();
        assert!(matches!(
            db.orders().update(&canceled, order.status).await,
            Err(DbError::ConditionFailed { .. })
        ));

        let listed = db.orders().list(Some(OrderStatus::Preparing)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].items.len(), 1);
        assert!(db
            .orders()
            .list(Some(OrderStatus::Canceled))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_items() {
        let db = seeded().await;
        let d = draft(&db, &request(&[("drink1", 3)]), None, Utc::now()).await;
        let (order, _) = db.orders().create(d, &GlobalSequence).await.unwrap();

        db.orders().delete(&order.id).await.unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
        assert!(matches!(
            db.orders().delete(&order.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
