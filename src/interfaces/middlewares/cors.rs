use actix_cors::Cors;
use actix_web::http::header;

/// Single-origin CORS policy for the browser client. Credentials are allowed,
/// so the origin must be concrete rather than a wildcard.
pub fn cors(allowed_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(allowed_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}
