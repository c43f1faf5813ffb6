//! Tax settings. A single row; the last write wins.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use menu_core::validation::validate_rate;
use menu_core::{CoreError, TaxSettings};
use menu_db::Database;
use menu_notify::{notify_best_effort, MenuEvent, Notifier};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct SettingsService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        SettingsService {
            db: state.db.clone(),
            notifier: Arc::clone(&state.notifier),
        }
    }

    pub async fn get(&self) -> ApiResult<TaxSettings> {
        Ok(self.db.settings().get().await?)
    }

    pub async fn update(&self, settings: TaxSettings) -> ApiResult<TaxSettings> {
        let errors: Vec<_> = [
            validate_rate("taxRateBps", settings.tax_rate),
            validate_rate("serviceRateBps", settings.service_rate),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();
        CoreError::from_field_errors(errors)?;

        let stored = self.db.settings().update(&settings, Utc::now()).await?;

        info!(
            tax = %stored.tax_rate,
            tax_enabled = stored.tax_enabled,
            service = %stored.service_rate,
            service_enabled = stored.service_enabled,
            "Tax settings updated"
        );
        notify_best_effort(self.notifier.as_ref(), MenuEvent::TaxSettingsUpdated(stored));
        Ok(stored)
    }
}
