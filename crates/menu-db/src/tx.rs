//! # Write Transactions
//!
//! `BEGIN IMMEDIATE` transactions for read-then-write sequences.
//!
//! ## Why IMMEDIATE?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DEFERRED (sqlx default)             IMMEDIATE (this module)            │
//! │  ───────────────────────             ───────────────────────            │
//! │  BEGIN                               BEGIN IMMEDIATE  ← write lock now  │
//! │  SELECT last order number            SELECT last order number           │
//! │        ◄── another connection        INSERT order                       │
//! │            commits here              UPDATE voucher                     │
//! │  INSERT order → SQLITE_BUSY          COMMIT                             │
//! │                 (stale snapshot)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Taking the write lock up front means the read is never stale and the
//! busy timeout applies instead of an immediate failure.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// An open `BEGIN IMMEDIATE` transaction.
///
/// Dropped without [`commit`](WriteTx::commit) it rolls back.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTx {
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(WriteTx { conn: Some(conn) })
    }

    /// The connection to run statements on.
    pub fn conn(&mut self) -> DbResult<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| DbError::TransactionFailed("transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> DbResult<()> {
        let Some(mut conn) = self.conn.take() else {
            return Err(DbError::TransactionFailed(
                "transaction already finished".to_string(),
            ));
        };
        if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            return Err(DbError::TransactionFailed(e.to_string()));
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> DbResult<()> {
        if let Some(mut conn) = self.conn.take() {
            sqlx::query("ROLLBACK")
                .execute(&mut *conn)
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        warn!(error = %e, "Rollback of abandoned transaction failed");
                        // Closing the connection rolls back whatever is open
                        drop(conn.detach());
                    }
                });
            }
            Err(_) => drop(conn.detach()),
        }
    }
}
