use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::product::{ProductQuery, ProductUpload},
    errors::{multipart_rejection, AppError},
    uploads::IncomingImage,
    AppState,
};

#[instrument(skip(state, form))]
pub async fn create_product(
    state: web::Data<AppState>,
    form: Result<MultipartForm<ProductUpload>, actix_web::Error>,
) -> Result<impl Responder, AppError> {
    let (fields, image_file) = form.map_err(multipart_rejection)?.into_inner().into_parts();
    let image = image_file.as_ref().and_then(IncomingImage::from_temp_file);

    let product = state.product_handler
        .create_product(fields, image)
        .await?;

    Ok(HttpResponse::Created().json(product))
}

#[instrument(skip(state))]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<impl Responder, AppError> {
    let products = state.product_handler
        .list_products(query.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(products))
}

#[instrument(skip(state))]
pub async fn get_product_by_id(
    product_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let product = state.product_handler.get_product(&product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

#[instrument(skip(state, form))]
pub async fn update_product(
    product_id: web::Path<String>,
    state: web::Data<AppState>,
    form: Result<MultipartForm<ProductUpload>, actix_web::Error>,
) -> Result<impl Responder, AppError> {
    let (fields, image_file) = form.map_err(multipart_rejection)?.into_inner().into_parts();
    let image = image_file.as_ref().and_then(IncomingImage::from_temp_file);

    let product = state.product_handler
        .update_product(&product_id, fields, image)
        .await?;

    Ok(HttpResponse::Ok().json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    product_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.product_handler.delete_product(&product_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({"message": "Deleted"})))
}
