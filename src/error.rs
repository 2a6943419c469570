use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The entity is absent, or it exists but belongs to someone else.
    #[error("Resource not found")]
    NotFound,

    /// The email is already registered.
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password. Deliberately the same failure for both.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The current password did not verify during a password change.
    #[error("Invalid current password")]
    InvalidPassword,

    /// The external card catalog could not be reached or answered with an error.
    #[error("Card catalog unavailable: {0}")]
    LookupUnavailable(String),

    /// Malformed input, rejected before any store access.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request needs a session and has none.
    #[error("Authentication required")]
    Unauthorized,

    /// The CSRF double-submit check failed.
    #[error("CSRF check failed: {0}")]
    Csrf(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Returns true if the error is a unique-constraint violation on `constraint`.
pub fn is_unique_violation(err: &tokio_postgres::Error, constraint: &str) -> bool {
    err.as_db_error().is_some_and(|db| {
        db.code() == &SqlState::UNIQUE_VIOLATION && db.constraint() == Some(constraint)
    })
}

/// Returns true if the error is a foreign-key violation on `constraint`.
pub fn is_foreign_key_violation(err: &tokio_postgres::Error, constraint: &str) -> bool {
    err.as_db_error().is_some_and(|db| {
        db.code() == &SqlState::FOREIGN_KEY_VIOLATION && db.constraint() == Some(constraint)
    })
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        AppError::Validation(report.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ref unexpected @ (AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_)) => {
                tracing::error!("{}", unexpected);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }

            AppError::DuplicateEmail => {
                tracing::debug!("Duplicate email on signup");
                (
                    StatusCode::CONFLICT,
                    "Could not create account. This email may already be in use.".to_string(),
                )
            }

            AppError::InvalidCredentials => {
                tracing::warn!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Invalid email or password.".to_string())
            }

            AppError::InvalidPassword => {
                tracing::warn!("Password change rejected");
                (
                    StatusCode::FORBIDDEN,
                    "Could not change password. Check your current password.".to_string(),
                )
            }

            AppError::LookupUnavailable(ref msg) => {
                tracing::error!("Card catalog unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "We couldn't search for cards right now. Please try again.".to_string(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Unauthorized => {
                tracing::debug!("Unauthenticated request");
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }

            AppError::Csrf(ref msg) => {
                tracing::warn!("CSRF check failed: {}", msg);
                (StatusCode::FORBIDDEN, "Invalid CSRF token".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Something went wrong"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_unavailable_is_distinct_from_not_found() {
        let unavailable = AppError::LookupUnavailable("timeout".into()).into_response();
        let missing = AppError::NotFound.into_response();
        assert_eq!(unavailable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let response = AppError::Internal("connection reset by peer at 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"Something went wrong"}"#);
    }

    #[test]
    fn credential_failures_share_one_status() {
        assert_eq!(
            AppError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
