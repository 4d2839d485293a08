use actix_web::web;

use crate::handlers::{home::home, system::health_check, uploads::serve_upload};

mod extractors;
mod products;

/// Mounts every route of the catalog API. `upload_limit` caps a multipart body in bytes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, upload_limit: usize) {
    cfg.service(home);
    cfg.service(health_check);

    cfg.configure(products::config_routes);

    cfg.service(web::resource("/uploads/{file_name}").route(web::get().to(serve_upload)));

    extractors::config_extractors(cfg, upload_limit);
}
