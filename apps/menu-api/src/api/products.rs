//! Product catalog routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use menu_core::catalog::{ProductDraft, ProductPatch};
use menu_core::{Percent, Product, ProductCategory, ValidationError};
use menu_db::SeedOutcome;

use crate::error::{ApiJson, ApiResult};
use crate::response::ApiResponse;
use crate::services::CatalogService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/defaults", post(seed_defaults))
        .route(
            "/api/products/discount",
            post(apply_discount).delete(reset_discount),
        )
        .route(
            "/api/products/{id}",
            get(get_one).put(update).delete(delete),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category name; `all` or empty lists everything.
    pub category: Option<String>,
}

/// Body of `POST /api/products/discount`: `{"percentage": 20}`.
#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub percentage: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
    pub affected: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub inserted: usize,
    pub total: i64,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Product>>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
        .map(str::parse::<ProductCategory>)
        .transpose()?;

    let products = CatalogService::new(&state).list(category).await?;
    Ok(ApiResponse::list(products))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = CatalogService::new(&state).get(&id).await?;
    Ok(ApiResponse::ok(product))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let product = CatalogService::new(&state).create(draft).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(product, "Product created"),
    ))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<ApiResponse<Product>>> {
    let product = CatalogService::new(&state).update(&id, patch).await?;
    Ok(ApiResponse::with_message(product, "Product updated"))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    CatalogService::new(&state).delete(&id).await?;
    Ok(ApiResponse::with_message((), "Product deleted"))
}

async fn seed_defaults(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<SeedSummary>>> {
    let response = match CatalogService::new(&state).seed_defaults().await? {
        SeedOutcome::Inserted(inserted) => ApiResponse::with_message(
            SeedSummary {
                inserted,
                total: inserted as i64,
            },
            "Default menu added",
        ),
        SeedOutcome::AlreadySeeded(total) => ApiResponse::with_message(
            SeedSummary { inserted: 0, total },
            "Menu already has products",
        ),
    };
    Ok(response)
}

async fn apply_discount(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DiscountRequest>,
) -> ApiResult<Json<ApiResponse<DiscountSummary>>> {
    let pct = Percent::from_decimal(body.percentage).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: "percentage".to_string(),
            reason: "must be a non-negative percentage with at most two decimals".to_string(),
        }
    })?;

    let affected = CatalogService::new(&state).apply_discount(pct).await?;
    Ok(ApiResponse::with_message(
        DiscountSummary {
            percentage: Some(pct.to_decimal()),
            affected,
        },
        format!("{pct} discount applied to all products"),
    ))
}

async fn reset_discount(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DiscountSummary>>> {
    let affected = CatalogService::new(&state).reset_discount().await?;
    Ok(ApiResponse::with_message(
        DiscountSummary {
            percentage: None,
            affected,
        },
        "Original prices restored",
    ))
}
