use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;
use thiserror::Error;

use crate::models::domain::UserRole;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Why the authorization gate refused a request.
///
/// Ownership, publication and containment denials are surfaced exactly like a
/// missing entity so callers cannot probe for existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Role { required: UserRole },
    Ownership { entity: &'static str },
    Unpublished { entity: &'static str },
    Containment { entity: &'static str },
    NotEnrolled,
}

impl Denial {
    pub fn is_concealed(&self) -> bool {
        matches!(
            self,
            Denial::Ownership { .. } | Denial::Unpublished { .. } | Denial::Containment { .. }
        )
    }

    fn public_message(&self) -> String {
        match self {
            Denial::Role { .. } => "Forbidden".to_string(),
            Denial::NotEnrolled => "Not enrolled".to_string(),
            Denial::Ownership { entity }
            | Denial::Unpublished { entity }
            | Denial::Containment { entity } => format!("Not found: {}", entity),
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::Role { required } => write!(f, "requires the {} role", required),
            Denial::Ownership { entity } => write!(f, "{} is owned by another teacher", entity),
            Denial::Unpublished { entity } => write!(f, "{} is not published", entity),
            Denial::Containment { entity } => write!(f, "{} belongs to another parent", entity),
            Denial::NotEnrolled => write!(f, "caller is not enrolled in the course"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {0}")]
    InvalidInput(validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(Denial),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn not_found(entity: &str) -> Self {
        AppError::NotFound(entity.to_string())
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AccessDenied(denial) if denial.is_concealed() => "NOT_FOUND",
            AppError::AccessDenied(_) => "FORBIDDEN",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message sent to the caller. Server faults never leak their detail.
    fn public_message(&self) -> String {
        match self {
            AppError::AccessDenied(denial) => denial.public_message(),
            AppError::InvalidInput(_) => "Validation error".to_string(),
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::InvalidInput(errors) => serde_json::to_value(errors.field_errors()).ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied(denial) if denial.is_concealed() => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::DatabaseError(_) | AppError::InternalError(_) => log::error!("{}", self),
            AppError::AccessDenied(_) => log::debug!("{}", self),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
            code: self.error_code(),
            details: self.details(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err)
    }
}

/// True when the write was rejected by a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Maps a unique-index violation to a conflict and anything else to a database fault.
pub fn conflict_or_database(err: mongodb::error::Error, conflict: &str) -> AppError {
    if is_duplicate_key(&err) {
        AppError::AlreadyExists(conflict.to_string())
    } else {
        AppError::from(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
