use actix_web::web;

use crate::handlers::products::{
    create_product, delete_product, get_product_by_id, list_products, update_product,
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .service(
                web::resource("")
                    .route(web::post().to(create_product))
                    .route(web::get().to(list_products))
            )
            .service(
                web::resource("/{product_id}")
                    .route(web::get().to(get_product_by_id))
                    .route(web::put().to(update_product))
                    .route(web::delete().to(delete_product))
            )
    );
}
