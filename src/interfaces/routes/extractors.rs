use actix_multipart::form::MultipartFormConfig;
use actix_web::{error::JsonPayloadError, web};

use crate::errors::{AppError, FieldError};

/// Routes extractor failures through `AppError` so every rejection shares one envelope.
pub fn config_extractors(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    // Headroom over the image limit for the text fields and part headers
    let total_limit = upload_limit + 64 * 1024;

    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(total_limit)
            .memory_limit(256 * 1024)
            .error_handler(|err, _req| AppError::from(err).into()),
    );

    cfg.app_data(
        web::QueryConfig::default().error_handler(|err, _req| AppError::from(err).into()),
    );

    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            JsonPayloadError::ContentType => "Unsupported content type".to_string(),
            other => other.to_string(),
        };
        AppError::ValidationError(vec![FieldError::new("body", message)]).into()
    }));
}
