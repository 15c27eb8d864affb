use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::scheduling::ShiftError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Shift(#[from] ShiftError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Shift(e) => shift_status_code(e),
            AppError::Database(e) => match db_error_code(e) {
                Some("23505" | "23503" | "23P01") => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn shift_status_code(e: &ShiftError) -> StatusCode {
    match e {
        ShiftError::InvalidTimeFormat { .. }
        | ShiftError::InvalidTimeRange { .. }
        | ShiftError::InvalidParticipant(_)
        | ShiftError::InvalidStaff(_)
        | ShiftError::InvalidTransition { .. }
        | ShiftError::TooEarlyToStart { .. }
        | ShiftError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        ShiftError::ScheduleConflict { .. } => StatusCode::CONFLICT,
        ShiftError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        ShiftError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

/// SQLSTATE of the constraint violations that surface as 409.
fn db_error_code(e: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = e else {
        return None;
    };
    match db_err.code()?.as_ref() {
        "23505" => Some("23505"),
        "23503" => Some("23503"),
        "23P01" => Some("23P01"),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let (message, code, details): (String, &str, Value) = match &self {
            AppError::Unauthorized => (self.to_string(), "UNAUTHORIZED", json!({})),
            AppError::NotFound(msg) => (msg.clone(), "NOT_FOUND", json!({})),
            AppError::Shift(e) => {
                tracing::debug!(code = e.code(), "Shift request rejected: {}", e);
                (e.to_string(), e.code(), e.details())
            }
            AppError::Validation(e) => {
                let mut fields = serde_json::Map::new();
                let messages: Vec<String> = e
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let msgs: Vec<String> = errors
                            .iter()
                            .map(|err| match &err.message {
                                Some(m) => m.to_string(),
                                None => err.code.to_string(),
                            })
                            .collect();
                        let line = format!("{}: {}", field, msgs.join(", "));
                        fields.insert(field.to_string(), json!(msgs));
                        line
                    })
                    .collect();
                (messages.join("; "), "VALIDATION_ERROR", Value::Object(fields))
            }
            AppError::Database(e) => match db_error_code(e) {
                Some("23P01") => {
                    // Exclusion constraint caught a booking that raced past the lock.
                    tracing::warn!("Overlap exclusion violation: {:?}", e);
                    (
                        "Staff member already has a shift scheduled during this time".into(),
                        "SCHEDULE_CONFLICT",
                        json!({}),
                    )
                }
                Some("23505") => {
                    tracing::warn!("Unique constraint violation: {:?}", e);
                    (
                        "A record with that value already exists".into(),
                        "CONFLICT",
                        json!({}),
                    )
                }
                Some("23503") => {
                    tracing::warn!("Foreign key violation: {:?}", e);
                    (
                        "Referenced record does not exist".into(),
                        "CONFLICT",
                        json!({}),
                    )
                }
                _ => {
                    tracing::error!("Database error: {:?}", e);
                    ("Database error".into(), "DATABASE_ERROR", json!({}))
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ("Internal server error".into(), "INTERNAL_ERROR", json!({}))
            }
        };

        (
            status,
            Json(json!({ "error": message, "code": code, "details": details })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
