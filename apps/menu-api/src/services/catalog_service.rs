//! Product catalog: CRUD, default menu seeding and the global discount.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use menu_core::catalog::{default_menu, ProductDraft, ProductPatch};
use menu_core::validation::validate_global_discount;
use menu_core::{CoreError, Percent, Product, ProductCategory};
use menu_db::{generate_product_id, Database, SeedOutcome};
use menu_notify::{notify_best_effort, CatalogChange, MenuEvent, Notifier};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl CatalogService {
    pub fn new(state: &AppState) -> Self {
        CatalogService {
            db: state.db.clone(),
            notifier: Arc::clone(&state.notifier),
        }
    }

    pub async fn list(&self, category: Option<ProductCategory>) -> ApiResult<Vec<Product>> {
        Ok(self.db.products().list(category).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn create(&self, draft: ProductDraft) -> ApiResult<Product> {
        let product = draft.into_product(generate_product_id(), Utc::now())?;
        let product = self.db.products().insert(&product).await?;

        self.announce(CatalogChange::Created, 1);
        Ok(product)
    }

    pub async fn update(&self, id: &str, patch: ProductPatch) -> ApiResult<Product> {
        let current = self.get(id).await?;
        let next = patch.apply_to(&current, Utc::now())?;
        self.db.products().update(&next).await?;

        self.announce(CatalogChange::Updated, 1);
        Ok(next)
    }

    /// Removes a product from the menu. Orders keep their snapshots.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.products().delete(id).await?;
        self.announce(CatalogChange::Deleted, 1);
        Ok(())
    }

    /// Inserts the default menu into an empty catalog.
    pub async fn seed_defaults(&self) -> ApiResult<SeedOutcome> {
        let outcome = self.db.products().seed_defaults(&default_menu(Utc::now())).await?;
        if let SeedOutcome::Inserted(count) = outcome {
            self.announce(CatalogChange::Seeded, count as u64);
        }
        Ok(outcome)
    }

    /// Prices every product at `pct` off its original price.
    ///
    /// Returns the number of products repriced.
    pub async fn apply_discount(&self, pct: Percent) -> ApiResult<u64> {
        validate_global_discount(pct)?;
        let affected = self
            .db
            .products()
            .apply_global_discount(pct, Utc::now())
            .await?;

        info!(discount = %pct, affected, "Global discount applied");
        self.announce(CatalogChange::DiscountApplied, affected);
        Ok(affected)
    }

    /// Restores original prices. Returns the number of products restored.
    pub async fn reset_discount(&self) -> ApiResult<u64> {
        let restored = self.db.products().reset_global_discount(Utc::now()).await?;

        info!(restored, "Global discount reset");
        if restored > 0 {
            self.announce(CatalogChange::DiscountReset, restored);
        }
        Ok(restored)
    }

    fn announce(&self, reason: CatalogChange, affected: u64) {
        notify_best_effort(
            self.notifier.as_ref(),
            MenuEvent::products_changed(reason, affected),
        );
    }
}
