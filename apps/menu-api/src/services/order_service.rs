//! Orders: checkout, quotes and the cashier-side lifecycle.
//!
//! ## Checkout Sequence
//! ```text
//! request ──► validate lines ──► load products, tax settings, voucher
//!                                        │
//!                                        ▼
//!                         OrderDraft::assemble (snapshots + breakdown)
//!                                        │
//!                                        ▼
//!            ┌───────────── one write transaction ─────────────┐
//!            │ allocate number ─► claim voucher ─► insert order │
//!            └──────────────────────────┬───────────────────────┘
//!                     commit            │           claim failed
//!                       ▼               │               ▼
//!          notify order_created         │     rollback, explain why
//!          (+ voucher_applied)          │     (nothing stored or used)
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use menu_core::order::{
    self, CartLine, OrderDraft, OrderNumberStrategy, OrderRequest, OrderUpdate,
};
use menu_core::{Breakdown, CoreError, Order, OrderStatus, Product};
use menu_db::{Database, DbError};
use menu_notify::{notify_best_effort, MenuEvent, Notifier};

use crate::error::ApiResult;
use crate::services::VoucherService;
use crate::state::AppState;

/// Body of `POST /api/orders/quote`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    notifier: Arc<dyn Notifier>,
    numbering: Arc<dyn OrderNumberStrategy>,
    vouchers: VoucherService,
}

impl OrderService {
    pub fn new(state: &AppState) -> Self {
        OrderService {
            db: state.db.clone(),
            notifier: Arc::clone(&state.notifier),
            numbering: Arc::clone(&state.numbering),
            vouchers: VoucherService::new(state),
        }
    }

    /// Lists orders newest first.
    pub async fn list(&self, status: Option<OrderStatus>) -> ApiResult<Vec<Order>> {
        Ok(self.db.orders().list(status).await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(id.to_string()).into())
    }

    /// Prices a cart the way checkout would, without storing or claiming
    /// anything.
    pub async fn quote(&self, request: QuoteRequest) -> ApiResult<Breakdown> {
        order::validate_lines(&request.items)?;

        let catalog = self.load_products(&request.items).await?;
        let settings = self.db.settings().get().await?;
        let voucher = self
            .vouchers
            .find_for_checkout(request.voucher_code.as_deref())
            .await?;

        Ok(order::quote(
            &request.items,
            &catalog,
            &settings,
            voucher.as_ref(),
            Utc::now(),
        )?)
    }

    /// Creates an order, consuming one use of its voucher if it has one.
    pub async fn create(&self, request: OrderRequest) -> ApiResult<Order> {
        order::validate_lines(&request.items)?;
        let now = Utc::now();

        let catalog = self.load_products(&request.items).await?;
        let settings = self.db.settings().get().await?;
        let voucher = self
            .vouchers
            .find_for_checkout(request.voucher_code.as_deref())
            .await?;

        let draft = OrderDraft::assemble(&request, &catalog, &settings, voucher.as_ref(), now)?;
        let subtotal = draft.subtotal();

        let (order, claimed) = match self.db.orders().create(draft, self.numbering.as_ref()).await {
            Ok(created) => created,
            Err(DbError::ConditionFailed { id, .. }) if voucher.is_some() => {
                return Err(self.vouchers.explain_failed_claim(&id, subtotal, now).await);
            }
            Err(e) => return Err(e.into()),
        };

        notify_best_effort(self.notifier.as_ref(), MenuEvent::order_created(&order));
        if let Some(voucher) = &claimed {
            notify_best_effort(self.notifier.as_ref(), MenuEvent::voucher_applied(voucher));
        }

        Ok(order)
    }

    /// Moves an order through its lifecycle and edits payment state or notes.
    pub async fn update(&self, id: &str, update: OrderUpdate) -> ApiResult<Order> {
        let current = self.get(id).await?;
        let next = update.apply_to(&current, Utc::now())?;
        self.db.orders().update(&next, current.status).await?;

        if next.status != current.status {
            info!(
                order_number = %next.order_number,
                from = %current.status,
                to = %next.status,
                "Order status changed"
            );
        }
        notify_best_effort(self.notifier.as_ref(), MenuEvent::order_updated(&next));
        Ok(next)
    }

    /// Deletes an order and its items. Voucher usage is not given back.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.db.orders().delete(id).await?;
        notify_best_effort(self.notifier.as_ref(), MenuEvent::order_deleted(id));
        Ok(())
    }

    async fn load_products(&self, lines: &[CartLine]) -> ApiResult<Vec<Product>> {
        let ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();
        Ok(self.db.products().get_many(&ids).await?)
    }
}
