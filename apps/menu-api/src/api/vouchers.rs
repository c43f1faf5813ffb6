//! Voucher routes.
//!
//! CRUD bodies use cents and basis points like every stored record. The
//! validate and apply endpoints take and return major-unit amounts
//! (`"orderValue": 140`, `"discountAmount": 14.0`), which is what the
//! customer menu and cashier console send.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use menu_core::voucher::{VoucherDraft, VoucherPatch};
use menu_core::{Discount, Money, ValidationError, Voucher};

use crate::error::{ApiJson, ApiResult};
use crate::response::ApiResponse;
use crate::services::voucher_service::{AppliedVoucher, CodeCheck};
use crate::services::VoucherService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vouchers", get(list).post(create))
        .route("/api/vouchers/validate", post(validate))
        .route("/api/vouchers/apply", post(apply))
        .route(
            "/api/vouchers/{id}",
            get(get_one).put(update).delete(delete),
        )
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateVoucherRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub order_value: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyVoucherRequest {
    #[serde(default)]
    pub voucher_id: String,
    #[serde(default)]
    pub order_value: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidVoucher {
    pub is_valid: bool,
    pub voucher_id: String,
    pub code: String,
    pub discount: Discount,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_value: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedVoucher {
    pub is_valid: bool,
    pub reason: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_order_value: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ValidateOutcome {
    Valid(ValidVoucher),
    Rejected(RejectedVoucher),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherApplication {
    pub voucher_id: String,
    pub code: String,
    pub discount: Discount,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_value: Decimal,
    pub used_count: i64,
}

/// Converts a major-unit amount from the wire into cents.
fn order_value(value: Decimal) -> Result<Money, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "orderValue".to_string(),
        reason: "must be a non-negative amount".to_string(),
    };
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid());
    }
    Money::from_decimal(value).ok_or_else(invalid)
}

fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

async fn list(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<Voucher>>>> {
    let vouchers = VoucherService::new(&state).list().await?;
    Ok(ApiResponse::list(vouchers))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Voucher>>> {
    let voucher = VoucherService::new(&state).get(&id).await?;
    Ok(ApiResponse::ok(voucher))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<VoucherDraft>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Voucher>>)> {
    let voucher = VoucherService::new(&state).create(draft).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(voucher, "Voucher created"),
    ))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<VoucherPatch>,
) -> ApiResult<Json<ApiResponse<Voucher>>> {
    let voucher = VoucherService::new(&state).update(&id, patch).await?;
    Ok(ApiResponse::with_message(voucher, "Voucher updated"))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    VoucherService::new(&state).delete(&id).await?;
    Ok(ApiResponse::with_message((), "Voucher deleted"))
}

/// `POST /api/vouchers/validate`
///
/// A found-but-unusable voucher is a 200 with `success: false`; an unknown
/// code is a 404.
async fn validate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ValidateVoucherRequest>,
) -> ApiResult<Json<ApiResponse<ValidateOutcome>>> {
    required("code", &body.code)?;
    let value = order_value(body.order_value)?;

    let response = match VoucherService::new(&state).check_code(&body.code, value).await? {
        CodeCheck::Valid { voucher, discount } => ApiResponse::ok(ValidateOutcome::Valid(
            ValidVoucher {
                is_valid: true,
                voucher_id: voucher.id,
                code: voucher.code,
                discount: voucher.discount,
                discount_amount: discount.to_decimal(),
                original_value: value.to_decimal(),
                final_value: (value - discount).non_negative().to_decimal(),
            },
        )),
        CodeCheck::Rejected { voucher, reason } => ApiResponse::declined(
            ValidateOutcome::Rejected(RejectedVoucher {
                is_valid: false,
                reason: reason.code(),
                min_order_value: voucher.min_order_value().to_decimal(),
            }),
            format!("Voucher cannot be applied: {reason}"),
        ),
    };
    Ok(response)
}

/// `POST /api/vouchers/apply`
async fn apply(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ApplyVoucherRequest>,
) -> ApiResult<Json<ApiResponse<VoucherApplication>>> {
    required("voucherId", &body.voucher_id)?;
    let value = order_value(body.order_value)?;

    let AppliedVoucher { voucher, discount } = VoucherService::new(&state)
        .apply(body.voucher_id.trim(), value)
        .await?;

    Ok(ApiResponse::with_message(
        VoucherApplication {
            voucher_id: voucher.id,
            code: voucher.code,
            discount: voucher.discount,
            discount_amount: discount.to_decimal(),
            original_value: value.to_decimal(),
            final_value: (value - discount).non_negative().to_decimal(),
            used_count: voucher.used_count,
        },
        "Voucher applied successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_value_conversion() {
        assert_eq!(order_value(Decimal::new(140, 0)).unwrap().cents(), 14_000);
        assert_eq!(order_value(Decimal::new(8050, 2)).unwrap().cents(), 8_050);
        assert_eq!(order_value(Decimal::ZERO).unwrap(), Money::zero());
        assert!(order_value(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_rejected_shape() {
        let outcome = ValidateOutcome::Rejected(RejectedVoucher {
            is_valid: false,
            reason: "min_order_not_met",
            min_order_value: Money::from_cents(10_000).to_decimal(),
        });
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["isValid"], false);
        assert_eq!(value["reason"], "min_order_not_met");
        assert_eq!(value["minOrderValue"], 100.0);
    }
}
