//! Vouchers: CRUD, code validation and the atomic apply.
//!
//! ## Validate vs Apply
//! ```text
//! validate(code, orderValue)          apply(voucherId, orderValue)
//!   │ read only                         │ re-validate (inactive included)
//!   │ used_count untouched              │ conditional UPDATE used_count + 1
//!   ▼                                   ▼
//! Valid / Rejected(reason)            claimed, or why it no longer qualifies
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use menu_core::voucher::{
    self, ensure_deletable, ensure_usable, VoucherDraft, VoucherPatch, VoucherRejection,
};
use menu_core::{CoreError, Money, Voucher};
use menu_db::{generate_voucher_id, Database, DbError};
use menu_notify::{notify_best_effort, MenuEvent, Notifier};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Outcome of checking a code against an order value.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeCheck {
    Valid { voucher: Voucher, discount: Money },
    Rejected { voucher: Voucher, reason: VoucherRejection },
}

/// A voucher use that has been recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedVoucher {
    /// The voucher with its new usage count.
    pub voucher: Voucher,
    pub discount: Money,
}

#[derive(Debug, Clone)]
pub struct VoucherService {
    db: Database,
    notifier: Arc<dyn Notifier>,
}

impl VoucherService {
    pub fn new(state: &AppState) -> Self {
        VoucherService {
            db: state.db.clone(),
            notifier: Arc::clone(&state.notifier),
        }
    }

    pub async fn list(&self) -> ApiResult<Vec<Voucher>> {
        Ok(self.db.vouchers().list().await?)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Voucher> {
        self.db
            .vouchers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::VoucherNotFound(id.to_string()).into())
    }

    pub async fn create(&self, draft: VoucherDraft) -> ApiResult<Voucher> {
        let voucher = draft.into_voucher(generate_voucher_id(), Utc::now())?;
        let voucher = self.db.vouchers().insert(&voucher).await?;

        info!(code = %voucher.code, "Voucher created");
        notify_best_effort(self.notifier.as_ref(), MenuEvent::voucher_created(&voucher));
        Ok(voucher)
    }

    pub async fn update(&self, id: &str, patch: VoucherPatch) -> ApiResult<Voucher> {
        let current = self.get(id).await?;
        let next = patch.apply_to(&current, Utc::now())?;
        let stored = self.db.vouchers().update(&next).await?;

        notify_best_effort(self.notifier.as_ref(), MenuEvent::voucher_updated(&stored));
        Ok(stored)
    }

    /// Deletes an unused voucher. Used vouchers can only be deactivated.
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let current = self.get(id).await?;
        ensure_deletable(&current)?;

        match self.db.vouchers().delete(id).await {
            Ok(()) => {}
            // Used between the read and the delete
            Err(DbError::ConditionFailed { .. }) => {
                let latest = self.get(id).await?;
                ensure_deletable(&latest)?;
                return Err(DbError::condition_failed("Voucher", id).into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(code = %current.code, "Voucher deleted");
        notify_best_effort(self.notifier.as_ref(), MenuEvent::voucher_deleted(id));
        Ok(())
    }

    /// Checks `code` against `order_value` without recording anything.
    ///
    /// Unknown and inactive codes are both reported as not found.
    pub async fn check_code(&self, code: &str, order_value: Money) -> ApiResult<CodeCheck> {
        let voucher = self.find_active(code).await?;
        let now = Utc::now();

        match voucher::validate(&voucher, order_value, now) {
            Ok(()) => {
                let discount = voucher.discount.amount_for(order_value);
                Ok(CodeCheck::Valid { voucher, discount })
            }
            Err(reason) => {
                debug!(code = %voucher.code, reason = reason.code(), "Voucher rejected");
                Ok(CodeCheck::Rejected { voucher, reason })
            }
        }
    }

    /// Re-validates and records one use of the voucher.
    ///
    /// The increment is a single conditional write, so concurrent applies of
    /// a nearly exhausted voucher never push it past its cap.
    pub async fn apply(&self, id: &str, order_value: Money) -> ApiResult<AppliedVoucher> {
        let now = Utc::now();
        let current = self.get(id).await?;
        ensure_usable(&current, order_value, now)?;

        let claimed = match self.db.vouchers().claim(id, order_value, now).await? {
            Some(v) => v,
            None => return Err(self.explain_failed_claim(id, order_value, now).await),
        };

        let discount = claimed.discount.amount_for(order_value);
        notify_best_effort(self.notifier.as_ref(), MenuEvent::voucher_applied(&claimed));
        Ok(AppliedVoucher {
            voucher: claimed,
            discount,
        })
    }

    /// Resolves the optional code on a checkout request.
    pub async fn find_for_checkout(&self, code: Option<&str>) -> ApiResult<Option<Voucher>> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Ok(Some(self.find_active(code).await?)),
            None => Ok(None),
        }
    }

    /// Works out why a conditional claim matched no row.
    pub async fn explain_failed_claim(
        &self,
        id: &str,
        order_value: Money,
        now: DateTime<Utc>,
    ) -> ApiError {
        match self.db.vouchers().get_by_id(id).await {
            Ok(Some(latest)) => match ensure_usable(&latest, order_value, now) {
                Err(rejected) => rejected.into(),
                // Still usable, so its terms changed under the caller
                Ok(()) => DbError::condition_failed("Voucher", id).into(),
            },
            Ok(None) => CoreError::VoucherNotFound(id.to_string()).into(),
            Err(e) => e.into(),
        }
    }

    async fn find_active(&self, code: &str) -> ApiResult<Voucher> {
        let code = code.trim().to_ascii_uppercase();
        self.db
            .vouchers()
            .find_active_by_code(&code)
            .await?
            .ok_or_else(|| ApiError::NotFound("Invalid voucher code".to_string()))
    }
}
