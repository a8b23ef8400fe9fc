use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type AppResult<T> = std::result::Result<T, AppError>;

const UPSTREAM_MESSAGE: &str = "The AI service is currently unavailable. Please try again later.";

#[derive(thiserror::Error, Debug)]
pub enum DBError {
    #[error("{0}")]
    AlreadyExists(&'static str),

    #[error("{0}")]
    NotFound(&'static str),
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Any error: {0:?}")]
    Anyhow(#[from] anyhow::Error),

    #[error("DB Error: {0:?}")]
    DBError(#[from] DBError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Forbidden request")]
    Forbidden(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Upstream failure: {0:?}")]
    Upstream(anyhow::Error),

    #[error("SQL failed: {0:?}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JWT error: {0:?}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::DBError(DBError::NotFound(message))
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::DBError(DBError::AlreadyExists(message))
    }

    fn status_and_message(&self) -> (StatusCode, Option<String>) {
        match self {
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, Some(message.to_string())),
            AppError::JwtError(_) => (StatusCode::UNAUTHORIZED, None),
            AppError::Sqlx(sqlx::Error::Database(err)) if err.is_unique_violation() => (
                StatusCode::CONFLICT,
                Some("Resource already exists.".to_string()),
            ),
            AppError::Sqlx(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            AppError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, Some(UPSTREAM_MESSAGE.to_string())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, Some(self.to_string())),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, Some(message.clone())),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, Some(self.to_string())),
            AppError::DBError(db_error) => {
                let message = Some(db_error.to_string());

                match db_error {
                    DBError::NotFound(_) => (StatusCode::NOT_FOUND, message),
                    DBError::AlreadyExists(_) => (StatusCode::CONFLICT, message),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = ?self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let body = Json(json!({
            "error": error_message.unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            }),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: AppError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(status_of(AppError::bad_request("nope")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::not_found("Post not found.")), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::conflict("Tag already exists.")), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden("not yours")), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::Sqlx(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_errors_hide_their_detail() {
        let (status, message) =
            AppError::Upstream(anyhow::anyhow!("api key sk-123 rejected")).status_and_message();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let message = message.unwrap();
        assert!(!message.contains("sk-123"));
        assert_eq!(message, UPSTREAM_MESSAGE);
    }

    #[test]
    fn db_errors_keep_their_message() {
        let (_, message) = AppError::not_found("Book not found.").status_and_message();
        assert_eq!(message.as_deref(), Some("Book not found."));
    }
}
