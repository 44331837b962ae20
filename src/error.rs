// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API error type with JSON serialization for axum responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::allocation::AllocationError;
use crate::storage::WalletDbError;

/// An error that can be returned from API handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<WalletDbError> for ApiError {
    fn from(err: WalletDbError) -> Self {
        match err {
            WalletDbError::NetworkNotFound(_) | WalletDbError::WalletNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::MissingScheme(_) | AllocationError::NetworkInactive(_) => {
                ApiError::unprocessable(err.to_string())
            }
            AllocationError::Store(store) => store.into(),
            AllocationError::KeyService(_) | AllocationError::Notification(_) => {
                ApiError::bad_gateway(err.to_string())
            }
            AllocationError::Encryption(_) => ApiError::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serializes_to_json_error_body() {
        let error = ApiError::not_found("network atlantis not found");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_text(response).await;
        assert_eq!(body, r#"{"error":"network atlantis not found"}"#);
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        let error: ApiError = WalletDbError::NetworkNotFound("atlantis".into()).into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);

        let error: ApiError = WalletDbError::WalletNotFound("atlantis".into()).into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_anomalies_map_to_internal() {
        let error: ApiError = WalletDbError::Corrupted("row bitcoin: bad json".into()).into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);

        let error: ApiError =
            WalletDbError::Counter("derivation_index for bitcoin exhausted".into()).into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn refused_allocations_map_to_unprocessable() {
        let error: ApiError = AllocationError::NetworkInactive("zcash".into()).into();
        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);

        let error: ApiError = AllocationError::MissingScheme("zcash".into()).into();
        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        use crate::providers::KeyServiceError;
        let error: ApiError =
            AllocationError::from(KeyServiceError::Request("GET /v3 failed".into())).into();
        assert_eq!(error.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn nested_store_errors_keep_their_status() {
        let error: ApiError =
            AllocationError::from(WalletDbError::NetworkNotFound("atlantis".into())).into();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
