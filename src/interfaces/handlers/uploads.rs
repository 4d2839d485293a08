use actix_web::{http::header, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use infer::Infer;
use tokio::fs;

use crate::{errors::AppError, uploads::{is_safe_file_name, PUBLIC_UPLOAD_PREFIX}, AppState};

/// Serves a stored product image read-only. Stored files never exceed the
/// upload limit, so they are read whole. Repeat requests carrying a matching
/// `If-None-Match` get a bodyless 304.
pub async fn serve_upload(
    req: HttpRequest,
    file_name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let file_name = file_name.into_inner();
    if !is_safe_file_name(&file_name) {
        return Err(AppError::NotFound(file_name));
    }

    let not_found = || AppError::NotFound(format!("{PUBLIC_UPLOAD_PREFIX}/{file_name}"));
    let path = state.product_handler.uploads.dir().join(&file_name);

    let metadata = match fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(not_found()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::StorageError(e.to_string())),
    };

    let modified: Option<DateTime<Utc>> = metadata.modified().ok().map(DateTime::from);
    let etag = entity_tag(metadata.len(), modified);

    if if_none_match(&req, &etag) {
        return Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish());
    }

    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::StorageError(e.to_string())),
    };

    let mime = Infer::new()
        .get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    let mut response = HttpResponse::Ok();
    response
        .content_type(mime)
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .insert_header((header::ETAG, etag));
    if let Some(modified) = modified {
        response.insert_header((
            header::LAST_MODIFIED,
            modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        ));
    }

    Ok(response.body(bytes))
}

/// Stored names are never reused, so size plus modification time is enough.
fn entity_tag(len: u64, modified: Option<DateTime<Utc>>) -> String {
    let millis = modified.map(|m| m.timestamp_millis()).unwrap_or_default();
    format!("\"{len:x}-{millis:x}\"")
}

fn if_none_match(req: &HttpRequest, etag: &str) -> bool {
    req.headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .map(str::trim)
                .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
        })
}
