//! Order routes: checkout, quotes and the cashier console's updates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use menu_core::order::{OrderRequest, OrderUpdate};
use menu_core::{Breakdown, Order, OrderStatus};

use crate::error::{ApiJson, ApiResult};
use crate::response::ApiResponse;
use crate::services::order_service::QuoteRequest;
use crate::services::OrderService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(create))
        .route("/api/orders/quote", post(quote))
        .route("/api/orders/{id}", get(get_one).put(update).delete(delete))
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Order>>>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let orders = OrderService::new(&state).list(status).await?;
    Ok(ApiResponse::list(orders))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let order = OrderService::new(&state).get(&id).await?;
    Ok(ApiResponse::ok(order))
}

/// `POST /api/orders`
async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let order = OrderService::new(&state).create(request).await?;
    let message = format!("Order {} placed", order.order_number);
    Ok((StatusCode::CREATED, ApiResponse::with_message(order, message)))
}

/// `POST /api/orders/quote`
async fn quote(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuoteRequest>,
) -> ApiResult<Json<ApiResponse<Breakdown>>> {
    let breakdown = OrderService::new(&state).quote(request).await?;
    Ok(ApiResponse::ok(breakdown))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<OrderUpdate>,
) -> ApiResult<Json<ApiResponse<Order>>> {
    let order = OrderService::new(&state).update(&id, update).await?;
    Ok(ApiResponse::with_message(order, "Order updated"))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    OrderService::new(&state).delete(&id).await?;
    Ok(ApiResponse::with_message((), "Order deleted"))
}
