//! # Settings Repository
//!
//! The single `tax_settings` row (id = 1), seeded by the initial migration.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use menu_core::{Percent, TaxSettings};

#[derive(Debug, sqlx::FromRow)]
struct TaxSettingsRow {
    tax_rate_bps: i64,
    tax_enabled: bool,
    service_rate_bps: i64,
    service_enabled: bool,
}

impl TryFrom<TaxSettingsRow> for TaxSettings {
    type Error = DbError;

    fn try_from(row: TaxSettingsRow) -> DbResult<Self> {
        let bps = |v: i64| {
            u32::try_from(v)
                .map(Percent::from_bps)
                .map_err(|_| DbError::corrupt("TaxSettings", "1", format!("rate {v} out of range")))
        };

        Ok(TaxSettings {
            tax_rate: bps(row.tax_rate_bps)?,
            tax_enabled: row.tax_enabled,
            service_rate: bps(row.service_rate_bps)?,
            service_enabled: row.service_enabled,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the current tax settings.
    ///
    /// Falls back to [`TaxSettings::default`] if the row is missing.
    pub async fn get(&self) -> DbResult<TaxSettings> {
        let row: Option<TaxSettingsRow> = sqlx::query_as(
            r#"
            SELECT tax_rate_bps, tax_enabled, service_rate_bps, service_enabled
            FROM tax_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => TaxSettings::try_from(row),
            None => {
                debug!("No tax settings row, using defaults");
                Ok(TaxSettings::default())
            }
        }
    }

    /// Replaces the tax settings. Last write wins.
    pub async fn update(&self, settings: &TaxSettings, now: DateTime<Utc>) -> DbResult<TaxSettings> {
        sqlx::query(
            r#"
            INSERT INTO tax_settings (id, tax_rate_bps, tax_enabled, service_rate_bps, service_enabled, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                tax_rate_bps = excluded.tax_rate_bps,
                tax_enabled = excluded.tax_enabled,
                service_rate_bps = excluded.service_rate_bps,
                service_enabled = excluded.service_enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(i64::from(settings.tax_rate.bps()))
        .bind(settings.tax_enabled)
        .bind(i64::from(settings.service_rate.bps()))
        .bind(settings.service_enabled)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(
            tax_rate = %settings.tax_rate,
            tax_enabled = settings.tax_enabled,
            service_rate = %settings.service_rate,
            service_enabled = settings.service_enabled,
            "Tax settings updated"
        );

        Ok(*settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_defaults_then_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();

        assert_eq!(repo.get().await.unwrap(), TaxSettings::default());

        let next = TaxSettings {
            tax_rate: Percent::from_bps(1_450),
            tax_enabled: false,
            service_rate: Percent::from_whole(12),
            service_enabled: true,
        };
        repo.update(&next, Utc::now()).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), next);
    }
}
