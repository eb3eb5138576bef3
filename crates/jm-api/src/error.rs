use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::error;

use jm_common::db::{DbPoolError, MigrationError};
use jm_common::search::{SearchError, StoreError};

tokio::task_local! {
    static REQUEST_ID: String;
}

const MAX_PUBLIC_MESSAGE_CHARS: usize = 240;

/// Client-facing text for a rejected request: single line, bounded, with
/// anything URL- or path-shaped replaced.
fn sanitize_message(message: &str) -> String {
    let redact = |token: &str| -> String {
        if token.contains("://") {
            "[url]".into()
        } else if token.starts_with('/') || token.contains('\\') {
            "[path]".into()
        } else {
            token.to_string()
        }
    };

    let mut cleaned: String = message
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|token| !token.is_empty())
        .map(redact)
        .collect::<Vec<_>>()
        .join(" ");

    if let Some((cut, _)) = cleaned.char_indices().nth(MAX_PUBLIC_MESSAGE_CHARS) {
        cleaned.truncate(cut);
        cleaned.push_str("...");
    }

    if cleaned.is_empty() {
        "invalid request".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        error!(
            code,
            status = %status,
            request_id = request_id.as_deref().unwrap_or(""),
            error = %self,
            "api_error"
        );

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

impl From<SearchError> for ApiError {
    fn from(value: SearchError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Database(value.to_string())
    }
}

impl From<DbPoolError> for ApiError {
    fn from(value: DbPoolError) -> Self {
        match value {
            DbPoolError::MissingSetting(_) | DbPoolError::InvalidConfig(_) => {
                ApiError::BadRequest(value.to_string())
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<MigrationError> for ApiError {
    fn from(value: MigrationError) -> Self {
        ApiError::Database(format!("failed to run migrations: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: axum::response::Response) -> (StatusCode, Value) {
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let err = ApiError::Internal("boom".into());
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["request_id"], "req-123");
    }

    #[tokio::test]
    async fn search_failures_hide_their_cause() {
        let err = ApiError::from(SearchError::QueryFailed(
            "connection to postgres://app:secret@db/listings refused".into(),
        ));
        let (status, json) = body_json(err.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "database_error");
        assert_eq!(json["message"], "internal server error");
    }

    #[test]
    fn bad_request_messages_redact_urls_and_paths() {
        let cleaned = sanitize_message("cannot reach postgres://u:p@h/db via /etc/hosts\n");
        assert_eq!(cleaned, "cannot reach [url] via [path]");
    }

    #[test]
    fn long_messages_are_cut_on_char_boundaries() {
        let cleaned = sanitize_message(&"é".repeat(MAX_PUBLIC_MESSAGE_CHARS + 10));
        assert_eq!(cleaned.chars().count(), MAX_PUBLIC_MESSAGE_CHARS + 3);
        assert!(cleaned.ends_with("..."));
        assert_eq!(sanitize_message("\n\t"), "invalid request");
    }

    #[test]
    fn missing_db_setting_is_a_configuration_error() {
        let err = ApiError::from(DbPoolError::MissingSetting("DB_HOST"));
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "DB_HOST is not set"));
    }
}
