//! # Voucher Rules
//!
//! Eligibility checks and mutation guards for vouchers. Nothing here touches
//! `used_count`; the storage layer owns the atomic claim.
//!
//! ## Validate / Apply Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  validate(voucher, order_value, now)       read-only, repeatable       │
//! │      │                                                                  │
//! │      │  1. now > expiry_date          → Expired                         │
//! │      │  2. now < start_date           → NotStarted                      │
//! │      │  3. used_count >= max_uses     → MaxUsesExceeded                 │
//! │      │  4. order_value < min_order    → MinOrderNotMet                  │
//! │      │  5. !is_active                 → Inactive                        │
//! │      ▼                                                                  │
//! │  claim (menu-db)                      one conditional UPDATE that       │
//! │                                       re-checks 1–5 and increments      │
//! │                                                                         │
//! │  First failing rule wins. A failed checkout never consumes a use.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Percent};
use crate::types::{Discount, ProductCategory, Voucher};
use crate::validation::{normalize_voucher_code, validate_amount_cents};
use crate::MAX_PRICE_CENTS;

// =============================================================================
// Rejection Reasons
// =============================================================================

/// Why a voucher cannot be used for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum VoucherRejection {
    #[error("expired")]
    Expired,
    #[error("not started")]
    NotStarted,
    #[error("maximum usage exceeded")]
    MaxUsesExceeded,
    #[error("minimum order value not met")]
    MinOrderNotMet,
    #[error("inactive")]
    Inactive,
}

impl VoucherRejection {
    /// Stable reason code for clients and logs.
    pub fn code(&self) -> &'static str {
        match self {
            VoucherRejection::Expired => "expired",
            VoucherRejection::NotStarted => "not_started",
            VoucherRejection::MaxUsesExceeded => "max_uses_exceeded",
            VoucherRejection::MinOrderNotMet => "min_order_not_met",
            VoucherRejection::Inactive => "inactive",
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Decides whether `voucher` may be used for an order worth `order_value` at
/// time `now`.
///
/// Never mutates anything; calling it any number of times leaves the voucher
/// untouched.
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use menu_core::voucher::{validate, VoucherRejection};
/// # use menu_core::{Discount, Money, Percent, Voucher};
/// # let now = Utc::now();
/// # let voucher = Voucher {
/// #     id: "v1".into(), code: "SAVE10".into(),
/// #     discount: Discount::Percentage(Percent::from_whole(10)),
/// #     min_order_value_cents: 10_000, category: None,
/// #     start_date: now - Duration::days(1), expiry_date: now + Duration::days(1),
/// #     max_uses: None, used_count: 0, is_active: true,
/// #     created_at: now, updated_at: now,
/// # };
///
/// assert_eq!(
///     validate(&voucher, Money::from_cents(8_000), now),
///     Err(VoucherRejection::MinOrderNotMet)
/// );
/// ```
pub fn validate(
    voucher: &Voucher,
    order_value: Money,
    now: DateTime<Utc>,
) -> Result<(), VoucherRejection> {
    if now > voucher.expiry_date {
        return Err(VoucherRejection::Expired);
    }

    if now < voucher.start_date {
        return Err(VoucherRejection::NotStarted);
    }

    if let Some(max) = voucher.max_uses {
        if voucher.used_count >= max {
            return Err(VoucherRejection::MaxUsesExceeded);
        }
    }

    if order_value < voucher.min_order_value() {
        return Err(VoucherRejection::MinOrderNotMet);
    }

    if !voucher.is_active {
        return Err(VoucherRejection::Inactive);
    }

    Ok(())
}

/// [`validate`], lifted into a [`CoreError`] carrying the voucher code.
pub fn ensure_usable(voucher: &Voucher, order_value: Money, now: DateTime<Utc>) -> CoreResult<()> {
    validate(voucher, order_value, now).map_err(|reason| CoreError::VoucherRejected {
        code: voucher.code.clone(),
        reason,
    })
}

// =============================================================================
// Mutation Guards
// =============================================================================

/// A used voucher may only be deactivated, never deleted.
pub fn ensure_deletable(voucher: &Voucher) -> CoreResult<()> {
    if voucher.has_been_used() {
        return Err(CoreError::VoucherInUse {
            code: voucher.code.clone(),
            used_count: voucher.used_count,
        });
    }
    Ok(())
}

// =============================================================================
// Drafts and Patches
// =============================================================================

/// Input for creating a voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDraft {
    pub code: String,
    pub discount: Discount,
    #[serde(default)]
    pub min_order_value_cents: i64,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    /// Defaults to the creation time.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl VoucherDraft {
    /// Validates every field and builds the stored record.
    ///
    /// All field failures are reported together.
    pub fn into_voucher(self, id: String, now: DateTime<Utc>) -> CoreResult<Voucher> {
        let mut errors = Vec::new();

        let code = normalize_voucher_code(&self.code).map_err(|e| errors.push(e)).ok();
        let start_date = self.start_date.unwrap_or(now);

        check_terms(
            &self.discount,
            self.min_order_value_cents,
            start_date,
            self.expiry_date,
            self.max_uses,
            0,
            &mut errors,
        );

        CoreError::from_field_errors(errors)?;
        let code = code.unwrap_or_default();

        Ok(Voucher {
            id,
            code,
            discount: self.discount,
            min_order_value_cents: self.min_order_value_cents,
            category: self.category,
            start_date,
            expiry_date: self.expiry_date,
            max_uses: self.max_uses,
            used_count: 0,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a voucher. Absent fields are left unchanged.
///
/// `category` and `max_uses` distinguish "leave alone" (absent) from
/// "clear" (`null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPatch {
    pub code: Option<String>,
    pub discount: Option<Discount>,
    pub min_order_value_cents: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<ProductCategory>>,
    pub start_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_uses: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl VoucherPatch {
    /// Applies the patch to `current`, enforcing the code lock and re-checking
    /// the voucher terms.
    pub fn apply_to(self, current: &Voucher, now: DateTime<Utc>) -> CoreResult<Voucher> {
        let mut next = current.clone();

        if let Some(code) = self.code {
            let code = normalize_voucher_code(&code)?;
            if code != current.code {
                if current.has_been_used() {
                    return Err(CoreError::VoucherCodeLocked {
                        code: current.code.clone(),
                        used_count: current.used_count,
                    });
                }
                next.code = code;
            }
        }

        if let Some(discount) = self.discount {
            next.discount = discount;
        }
        if let Some(min) = self.min_order_value_cents {
            next.min_order_value_cents = min;
        }
        if let Some(category) = self.category {
            next.category = category;
        }
        if let Some(start) = self.start_date {
            next.start_date = start;
        }
        if let Some(expiry) = self.expiry_date {
            next.expiry_date = expiry;
        }
        if let Some(max_uses) = self.max_uses {
            next.max_uses = max_uses;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }

        let mut errors = Vec::new();
        check_terms(
            &next.discount,
            next.min_order_value_cents,
            next.start_date,
            next.expiry_date,
            next.max_uses,
            next.used_count,
            &mut errors,
        );
        CoreError::from_field_errors(errors)?;

        next.updated_at = now;
        Ok(next)
    }
}

fn check_terms(
    discount: &Discount,
    min_order_value_cents: i64,
    start_date: DateTime<Utc>,
    expiry_date: DateTime<Utc>,
    max_uses: Option<i64>,
    used_count: i64,
    errors: &mut Vec<ValidationError>,
) {
    match discount {
        Discount::Percentage(pct) => {
            if *pct < Percent::from_whole(1) || *pct > Percent::FULL {
                errors.push(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: 100,
                });
            }
        }
        Discount::Fixed(amount) => {
            if !amount.is_positive() {
                errors.push(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            } else if amount.cents() > MAX_PRICE_CENTS {
                errors.push(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 1,
                    max: MAX_PRICE_CENTS,
                });
            }
        }
    }

    if let Err(e) = validate_amount_cents("minOrderValue", min_order_value_cents) {
        errors.push(e);
    }

    if expiry_date <= start_date {
        errors.push(ValidationError::InvalidFormat {
            field: "expiryDate".to_string(),
            reason: "must be after the start date".to_string(),
        });
    }

    if let Some(max) = max_uses {
        // A cap below the uses already granted would break used_count <= max_uses
        let floor = used_count.max(1);
        if max < floor {
            errors.push(ValidationError::OutOfRange {
                field: "maxUses".to_string(),
                min: floor,
                max: i64::MAX,
            });
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn voucher(now: DateTime<Utc>) -> Voucher {
        Voucher {
            id: "v1".to_string(),
            code: "SAVE10".to_string(),
            discount: Discount::Percentage(Percent::from_whole(10)),
            min_order_value_cents: 0,
            category: None,
            start_date: now - Duration::days(1),
            expiry_date: now + Duration::days(30),
            max_uses: None,
            used_count: 0,
            is_active: true,
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        }
    }

    fn money(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn test_valid_voucher() {
        let now = Utc::now();
        assert_eq!(validate(&voucher(now), money(14_000), now), Ok(()));
    }

    #[test]
    fn test_scenario_c_max_uses_exceeded_for_any_value() {
        let now = Utc::now();
        let v = Voucher {
            max_uses: Some(1),
            used_count: 1,
            ..voucher(now)
        };
        for value in [0, 100, 14_000, 1_000_000] {
            assert_eq!(
                validate(&v, money(value), now),
                Err(VoucherRejection::MaxUsesExceeded)
            );
        }
    }

    #[test]
    fn test_scenario_d_min_order_not_met() {
        let now = Utc::now();
        let v = Voucher {
            min_order_value_cents: 10_000,
            ..voucher(now)
        };
        assert_eq!(
            validate(&v, money(8_000), now),
            Err(VoucherRejection::MinOrderNotMet)
        );
        assert_eq!(validate(&v, money(10_000), now), Ok(()));
    }

    #[test]
    fn test_expired_wins_over_everything() {
        let now = Utc::now();
        let v = Voucher {
            expiry_date: now - Duration::seconds(1),
            start_date: now - Duration::days(10),
            max_uses: Some(1),
            used_count: 1,
            min_order_value_cents: 1_000_000,
            is_active: false,
            ..voucher(now)
        };
        assert_eq!(validate(&v, money(0), now), Err(VoucherRejection::Expired));
    }

    #[test]
    fn test_rule_precedence() {
        let now = Utc::now();

        let not_started = Voucher {
            start_date: now + Duration::hours(1),
            max_uses: Some(0),
            ..voucher(now)
        };
        assert_eq!(
            validate(&not_started, money(0), now),
            Err(VoucherRejection::NotStarted)
        );

        let exhausted_and_small = Voucher {
            max_uses: Some(2),
            used_count: 2,
            min_order_value_cents: 10_000,
            ..voucher(now)
        };
        assert_eq!(
            validate(&exhausted_and_small, money(1), now),
            Err(VoucherRejection::MaxUsesExceeded)
        );

        let inactive_and_small = Voucher {
            is_active: false,
            min_order_value_cents: 10_000,
            ..voucher(now)
        };
        assert_eq!(
            validate(&inactive_and_small, money(1), now),
            Err(VoucherRejection::MinOrderNotMet)
        );
        assert_eq!(
            validate(&inactive_and_small, money(10_000), now),
            Err(VoucherRejection::Inactive)
        );
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let v = Voucher {
            expiry_date: now,
            ..voucher(now)
        };
        assert_eq!(validate(&v, money(0), now), Ok(()));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let now = Utc::now();
        let v = Voucher {
            max_uses: Some(3),
            used_count: 2,
            ..voucher(now)
        };
        let before = v.clone();
        for _ in 0..5 {
            assert_eq!(validate(&v, money(14_000), now), Ok(()));
        }
        assert_eq!(v, before);
    }

    #[test]
    fn test_ensure_usable_carries_code() {
        let now = Utc::now();
        let v = Voucher {
            is_active: false,
            ..voucher(now)
        };
        let err = ensure_usable(&v, money(0), now).unwrap_err();
        assert_eq!(err.reason_code(), Some("inactive"));
        assert!(err.to_string().contains("SAVE10"));
    }

    #[test]
    fn test_draft_normalizes_and_defaults_start() {
        let now = Utc::now();
        let draft = VoucherDraft {
            code: " summer24 ".to_string(),
            discount: Discount::Fixed(money(2_500)),
            min_order_value_cents: 5_000,
            category: Some(ProductCategory::Pizza),
            start_date: None,
            expiry_date: now + Duration::days(7),
            max_uses: Some(50),
            is_active: true,
        };
        let v = draft.into_voucher("id-1".to_string(), now).unwrap();

        assert_eq!(v.code, "SUMMER24");
        assert_eq!(v.start_date, now);
        assert_eq!(v.used_count, 0);
        assert_eq!(v.remaining_uses(), Some(50));
    }

    #[test]
    fn test_draft_collects_all_field_errors() {
        let now = Utc::now();
        let draft = VoucherDraft {
            code: "x".to_string(),
            discount: Discount::Percentage(Percent::from_whole(150)),
            min_order_value_cents: -1,
            category: None,
            start_date: Some(now),
            expiry_date: now - Duration::days(1),
            max_uses: Some(0),
            is_active: true,
        };
        let err = draft.into_voucher("id".to_string(), now).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field()).collect();
        assert_eq!(
            fields,
            vec!["code", "value", "minOrderValue", "expiryDate", "maxUses"]
        );
    }

    #[test]
    fn test_fixed_voucher_must_be_positive() {
        let now = Utc::now();
        let draft = VoucherDraft {
            code: "FREE".to_string(),
            discount: Discount::Fixed(Money::zero()),
            min_order_value_cents: 0,
            category: None,
            start_date: None,
            expiry_date: now + Duration::days(1),
            max_uses: None,
            is_active: true,
        };
        assert!(draft.into_voucher("id".to_string(), now).is_err());
    }

    #[test]
    fn test_amounts_above_price_cap_rejected() {
        let now = Utc::now();
        let draft = VoucherDraft {
            code: "HUGE".to_string(),
            discount: Discount::Fixed(money(i64::MAX / 2)),
            min_order_value_cents: MAX_PRICE_CENTS + 1,
            category: None,
            start_date: None,
            expiry_date: now + Duration::days(1),
            max_uses: None,
            is_active: true,
        };
        let err = draft.clone().into_voucher("id".to_string(), now).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["value", "minOrderValue"]);

        let at_cap = VoucherDraft {
            discount: Discount::Fixed(money(MAX_PRICE_CENTS)),
            min_order_value_cents: MAX_PRICE_CENTS,
            ..draft
        };
        assert!(at_cap.into_voucher("id".to_string(), now).is_ok());
    }

    #[test]
    fn test_code_locked_once_used() {
        let now = Utc::now();
        let used = Voucher {
            used_count: 1,
            ..voucher(now)
        };
        let patch = VoucherPatch {
            code: Some("NEWCODE".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            patch.apply_to(&used, now),
            Err(CoreError::VoucherCodeLocked { .. })
        ));

        // Re-sending the same code is not a change
        let same = VoucherPatch {
            code: Some("save10".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = same.apply_to(&used, now).unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.code, "SAVE10");
    }

    #[test]
    fn test_unused_code_can_change() {
        let now = Utc::now();
        let patch = VoucherPatch {
            code: Some("pizza5".to_string()),
            ..Default::default()
        };
        let updated = patch.apply_to(&voucher(now), now).unwrap();
        assert_eq!(updated.code, "PIZZA5");
        assert_eq!(updated.updated_at, now);
    }

    #[test]
    fn test_cap_cannot_drop_below_used_count() {
        let now = Utc::now();
        let v = Voucher {
            max_uses: Some(10),
            used_count: 4,
            ..voucher(now)
        };
        let patch = VoucherPatch {
            max_uses: Some(Some(3)),
            ..Default::default()
        };
        assert!(patch.apply_to(&v, now).is_err());

        let uncap = VoucherPatch {
            max_uses: Some(None),
            ..Default::default()
        };
        assert_eq!(uncap.apply_to(&v, now).unwrap().max_uses, None);
    }

    #[test]
    fn test_patch_null_vs_absent() {
        let patch: VoucherPatch = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(patch.category, Some(None));
        assert_eq!(patch.max_uses, None);
    }

    #[test]
    fn test_delete_guard() {
        let now = Utc::now();
        assert!(ensure_deletable(&voucher(now)).is_ok());

        let used = Voucher {
            used_count: 3,
            ..voucher(now)
        };
        assert!(matches!(
            ensure_deletable(&used),
            Err(CoreError::VoucherInUse { used_count: 3, .. })
        ));
    }

    #[test]
    fn test_rejection_wire_code() {
        let json = serde_json::to_value(VoucherRejection::MaxUsesExceeded).unwrap();
        assert_eq!(json, "max_uses_exceeded");
        assert_eq!(VoucherRejection::NotStarted.code(), "not_started");
    }
}
