use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::UnsupportedPredicate { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation {
                    constraint,
                    conflicting_value,
                    ..
                } => match (constraint.as_deref(), conflicting_value) {
                    (Some("teams_name_unique"), Some(name)) => format!("A team named '{name}' already exists"),
                    (Some("teams_name_unique"), None) => "A team with this name already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { constraint, .. } => match constraint.as_deref() {
                    Some("members_team_id_fkey") => "The referenced team does not exist".to_string(),
                    _ => "Invalid reference to related resource".to_string(),
                },
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::UnsupportedPredicate { reason } => reason.clone(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log level follows severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            Error::Database(DbError::UniqueViolation { table, .. }) => {
                let body = json!({
                    "message": self.user_message(),
                    "resource": table.as_deref().unwrap_or("unknown"),
                });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::NotFound {
                resource: "Member".to_string(),
                id: "1".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Database(DbError::UnsupportedPredicate {
                reason: "no".to_string()
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Other(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = Error::Database(DbError::Other(anyhow::anyhow!("connection reset by peer")));
        assert_eq!(err.user_message(), "Database error occurred");

        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("teams_name_unique".to_string()),
            table: Some("teams".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
            conflicting_value: Some("teamA".to_string()),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "A team named 'teamA' already exists");

        let err = Error::Database(DbError::ForeignKeyViolation {
            constraint: Some("members_team_id_fkey".to_string()),
            table: Some("members".to_string()),
            message: "insert or update violates foreign key constraint".to_string(),
        });
        assert_eq!(err.user_message(), "The referenced team does not exist");
    }
}
