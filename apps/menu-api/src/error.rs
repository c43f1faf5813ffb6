//! Error types for the Menu API.
//!
//! ## Status Mapping
//! ```text
//! CoreError::kind()                 DbError
//! ─────────────────                 ───────
//! Validation   → 400 + errors[]     NotFound          → 404
//! NotFound     → 404                UniqueViolation   → 409
//! Conflict     → 409                ConditionFailed   → 409
//! BusinessRule → 400 + reason       anything else     → 500 (logged)
//! ```

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::error;

use menu_core::{CoreError, ErrorKind, ValidationError};
use menu_db::DbError;

/// Message returned for every storage failure. The detail goes to the log.
const STORAGE_FAILURE_MESSAGE: &str = "Something went wrong, please try again";

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    /// Request body could not be read as the expected JSON.
    #[error("{0}")]
    MalformedBody(String),

    /// Lookup miss with a message chosen by the handler.
    #[error("{0}")]
    NotFound(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(err))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct FieldErrorBody {
    field: String,
    message: String,
}

/// `{"success": false, "message": ..., "reason"?: ..., "errors"?: [...]}`
#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldErrorBody>,
}

impl FailureBody {
    fn new(message: impl Into<String>) -> Self {
        FailureBody {
            success: false,
            message: message.into(),
            reason: None,
            errors: Vec::new(),
        }
    }
}

impl ApiError {
    /// The status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::BusinessRule => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
            },
            ApiError::Db(e) => match e {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::ConditionFailed { .. } => {
                    StatusCode::CONFLICT
                }
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> FailureBody {
        match self {
            ApiError::Core(e) => {
                let mut body = FailureBody::new(e.to_string());
                body.reason = e.reason_code();
                body.errors = e
                    .field_errors()
                    .into_iter()
                    .map(|fe| FieldErrorBody {
                        field: fe.field().to_string(),
                        message: fe.to_string(),
                    })
                    .collect();
                body
            }
            ApiError::Db(DbError::ConditionFailed { entity, .. }) => {
                let mut body = FailureBody::new(format!(
                    "{entity} was changed by another request, reload and try again"
                ));
                body.reason = Some("concurrent_modification");
                body
            }
            ApiError::Db(_) if self.status().is_server_error() => {
                FailureBody::new(STORAGE_FAILURE_MESSAGE)
            }
            ApiError::Db(e) => FailureBody::new(e.to_string()),
            ApiError::MalformedBody(msg) | ApiError::NotFound(msg) => FailureBody::new(msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

// =============================================================================
// JSON Extractor
// =============================================================================

/// `Json<T>` whose rejection is reported in the API's failure envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::from(rejection)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menu_core::voucher::VoucherRejection;

    #[test]
    fn test_validation_lists_fields() {
        let err = ApiError::from(CoreError::InvalidFields(vec![
            ValidationError::Required {
                field: "name".to_string(),
            },
            ValidationError::MustBePositive {
                field: "priceCents".to_string(),
            },
        ]));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][1]["field"], "priceCents");
        assert!(body.get("reason").is_none());
    }

    #[test]
    fn test_business_rule_carries_reason() {
        let err = ApiError::from(CoreError::VoucherRejected {
            code: "SAVE10".to_string(),
            reason: VoucherRejection::MinOrderNotMet,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["reason"], "min_order_not_met");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_db_errors_map_to_status() {
        assert_eq!(
            ApiError::from(DbError::not_found("Order", "o-1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::duplicate("code", "SAVE10")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DbError::condition_failed("Order", "o-1")).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_storage_failure_hides_detail() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error at page 7".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["message"], STORAGE_FAILURE_MESSAGE);
    }
}
