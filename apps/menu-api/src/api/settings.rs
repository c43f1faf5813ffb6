//! Tax settings routes.

use axum::{extract::State, routing::get, Json, Router};

use menu_core::TaxSettings;

use crate::error::{ApiJson, ApiResult};
use crate::response::ApiResponse;
use crate::services::SettingsService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings/tax", get(get_tax).put(update_tax))
}

async fn get_tax(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<TaxSettings>>> {
    let settings = SettingsService::new(&state).get().await?;
    Ok(ApiResponse::ok(settings))
}

async fn update_tax(
    State(state): State<AppState>,
    ApiJson(settings): ApiJson<TaxSettings>,
) -> ApiResult<Json<ApiResponse<TaxSettings>>> {
    let settings = SettingsService::new(&state).update(settings).await?;
    Ok(ApiResponse::with_message(settings, "Tax settings updated"))
}
