use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Summary of the booking already holding a slot, surfaced to the caller
/// alongside a SchedulingConflict rejection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictingBooking {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("booking must be in the future")]
    NotInFuture,
    #[error("{0}")]
    InvalidInterval(String),
    #[error("room not found or not available")]
    RoomUnavailable,
    #[error("room is already booked for this time slot")]
    SchedulingConflict(ConflictingBooking),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("transaction error")]
    TransactionError(#[source] sqlx::Error),
    #[error("database operation error")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("no rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error(transparent)]
    KeyValueStoreError(#[from] redis::RedisError),
    #[error(transparent)]
    BcryptError(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("authentication is required")]
    UnauthenticatedError,
    #[error("email or password is incorrect")]
    UnauthorizedError,
    #[error("admin access required")]
    ForbiddenOperation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicting_booking: Option<&'a ConflictingBooking>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match &self {
            AppError::NotInFuture
            | AppError::InvalidInterval(_)
            | AppError::ValidationError(_)
            | AppError::ConvertToUuidError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::EntityNotFound(_) | AppError::RoomUnavailable => StatusCode::NOT_FOUND,
            AppError::SchedulingConflict(_) => StatusCode::CONFLICT,
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            e @ (AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::KeyValueStoreError(_)
            | AppError::BcryptError(_)
            | AppError::ConversionEntityError(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = match &self {
            // Opaque message for operator-only failures.
            _ if status_code == StatusCode::INTERNAL_SERVER_ERROR => ErrorBody {
                message: "server error".into(),
                conflicting_booking: None,
            },
            AppError::SchedulingConflict(conflict) => ErrorBody {
                message: self.to_string(),
                conflicting_booking: Some(conflict),
            },
            _ => ErrorBody {
                message: self.to_string(),
                conflicting_booking: None,
            },
        };

        (status_code, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
