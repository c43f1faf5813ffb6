//! Embedded schema migrations.
//!
//! Files in `migrations/sqlite/` are compiled into the binary and applied in
//! filename order on connect. Applied versions are recorded in
//! `_sqlx_migrations`, so running again is a no-op. Existing files are never
//! edited; schema changes go in a new `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}
