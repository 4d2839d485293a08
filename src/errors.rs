use std::fmt;

use actix_multipart::MultipartError;
use actix_web::{
    error::{QueryPayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::uploads::UploadError;

#[derive(Debug, Clone)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    UnsupportedMedia(String),
    NotFound(String),
    StorageError(String),
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
            AppError::UnsupportedMedia(msg) => write!(f, "Unsupported media: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::StorageError(msg) => write!(f, "{}", msg),
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
            // Rejected uploads share the validation envelope.
            AppError::UnsupportedMedia(msg) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": [FieldError::new("image", msg.clone())]
                })
            }
            AppError::NotFound(_) => serde_json::json!({"error": "Not found"}),
            AppError::StorageError(msg) => serde_json::json!({"error": msg}),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMedia(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(field_errors(&errors))
    }
}

/// Flattens validator output into `FieldError`s ordered by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut field_errors: Vec<FieldError> = errors
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
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));
    field_errors
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Product".into()),
            _ => AppError::StorageError(err.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        if err.is_rejection() {
            AppError::UnsupportedMedia(err.to_string())
        } else {
            AppError::StorageError(err.to_string())
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::from(&err)
    }
}

impl From<&MultipartError> for AppError {
    fn from(err: &MultipartError) -> Self {
        match err {
            MultipartError::Payload(_) => {
                AppError::UnsupportedMedia("Image exceeds the upload size limit".to_string())
            }
            MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeParse
            | MultipartError::ContentTypeIncompatible => AppError::ValidationError(vec![
                FieldError::new("body", "Request must be multipart/form-data"),
            ]),
            _ => AppError::ValidationError(vec![FieldError::new("body", err.to_string())]),
        }
    }
}

/// Recovers an `AppError` from a failed multipart extraction. Content-type
/// failures bypass `MultipartFormConfig::error_handler`, so they arrive here
/// as raw `MultipartError`s.
pub fn multipart_rejection(err: actix_web::Error) -> AppError {
    if let Some(app_err) = err.as_error::<AppError>() {
        return app_err.clone();
    }

    match err.as_error::<MultipartError>() {
        Some(multipart_err) => AppError::from(multipart_err),
        None => AppError::ValidationError(vec![FieldError::new("body", err.to_string())]),
    }
}

impl From<QueryPayloadError> for AppError {
    fn from(err: QueryPayloadError) -> Self {
        AppError::ValidationError(vec![FieldError::new("query", err.to_string())])
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}
