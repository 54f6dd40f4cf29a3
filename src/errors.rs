use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

/// Terminal failures of the intake pipeline. One run produces at most one of
/// these; none are retried.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PipelineError {
    #[display("Failed to read image file")]
    Read,

    #[display("{_0}")]
    Analysis(String),

    #[display("Invalid response format")]
    MalformedResponse,

    #[display("{_0}")]
    Persistence(String),
}

impl PipelineError {
    /// Name of the stage that produced the error, for logs and error bodies.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Read => "read",
            PipelineError::Analysis(_) | PipelineError::MalformedResponse => "analyze",
            PipelineError::Persistence(_) => "persist",
        }
    }
}

impl ResponseError for PipelineError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({
                "error": self.to_string(),
                "stage": self.stage()
            }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Read => StatusCode::BAD_REQUEST,
            PipelineError::Analysis(_) => StatusCode::BAD_GATEWAY,
            PipelineError::MalformedResponse => StatusCode::BAD_GATEWAY,
            PipelineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    InvalidInput(String),
    NotFound(String),
    Conflict(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                AppError::NotFound("Record not found".into())
            }
            sqlx::Error::Database(e) if e.code().as_deref() == Some("23505") => {
                AppError::Conflict("Database conflict occurred".into())
            }
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_messages_are_human_readable() {
        assert_eq!(PipelineError::Read.to_string(), "Failed to read image file");
        assert_eq!(
            PipelineError::MalformedResponse.to_string(),
            "Invalid response format"
        );
        assert_eq!(
            PipelineError::Analysis("quota exceeded".into()).to_string(),
            "quota exceeded"
        );
    }

    #[test]
    fn pipeline_error_maps_to_stage() {
        assert_eq!(PipelineError::Read.stage(), "read");
        assert_eq!(PipelineError::MalformedResponse.stage(), "analyze");
        assert_eq!(PipelineError::Analysis("x".into()).stage(), "analyze");
        assert_eq!(PipelineError::Persistence("x".into()).stage(), "persist");
    }

    #[test]
    fn validation_errors_keep_their_field_names() {
        let mut errors = ValidationErrors::new();
        errors.add("per_page".into(), validator::ValidationError::new("range"));

        let err = AppError::from(errors);
        match err {
            AppError::ValidationError(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "per_page");
            }
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn pipeline_error_status_codes() {
        assert_eq!(PipelineError::Read.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PipelineError::Analysis("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PipelineError::Persistence("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
