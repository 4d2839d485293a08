use tracing::instrument;
use validator::Validate;

use crate::{
    entities::product::{Product, ProductFields, ProductFilter, ProductQuery},
    errors::AppError,
    repositories::product::ProductRepository,
    uploads::{IncomingImage, UploadStore},
    utils::valid_uuid::valid_uuid,
};

pub struct ProductHandler<R>
where
    R: ProductRepository,
{
    pub product_repo: R,
    pub uploads: UploadStore,
}

impl<R> ProductHandler<R>
where
    R: ProductRepository,
{
    pub fn new(product_repo: R, uploads: UploadStore) -> Self {
        ProductHandler { product_repo, uploads }
    }

    /// Creates a product, storing the image first when one is attached
    #[instrument(skip(self, fields, image))]
    pub async fn create_product(
        &self,
        fields: ProductFields,
        image: Option<IncomingImage<'_>>,
    ) -> Result<Product, AppError> {
        // Fail on bad fields before anything is written to disk
        fields.validate()?;

        let image_ref = self.store_image(image).await?;
        let insert = fields.into_insert(image_ref.clone())?;

        match self.product_repo.insert_product(&insert).await {
            Ok(product) => {
                tracing::info!(id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                self.discard_image(image_ref.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Lists products matching the query, newest first
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>, AppError> {
        let filter = ProductFilter::try_from(query)?;
        self.product_repo.find_products(&filter).await
    }

    /// Retrieves a product by its ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<Product, AppError> {
        let valid_id = valid_uuid(id)?;
        self.product_repo.get_product_by_id(&valid_id).await
    }

    /// Updates a product in place; the image is replaced only when a new one is attached
    #[instrument(skip(self, fields, image))]
    pub async fn update_product(
        &self,
        id: &str,
        fields: ProductFields,
        image: Option<IncomingImage<'_>>,
    ) -> Result<Product, AppError> {
        fields.validate()?;
        let valid_id = valid_uuid(id)?;

        let image_ref = self.store_image(image).await?;
        let changes = fields.into_changes(image_ref.clone())?;

        match self.product_repo.update_product(&valid_id, &changes).await {
            Ok(product) => {
                tracing::info!(id = %product.id, "Product updated");
                Ok(product)
            }
            Err(e) => {
                self.discard_image(image_ref.as_deref()).await;
                Err(e)
            }
        }
    }

    /// Deletes a product by its ID. Its image file is left in place.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        let valid_id = valid_uuid(id)?;
        self.product_repo.delete_product(&valid_id).await?;
        tracing::info!(id = %valid_id, "Product deleted");
        Ok(())
    }

    pub async fn check_store(&self) -> Result<(), AppError> {
        self.product_repo.check_connection().await
    }

    async fn store_image(&self, image: Option<IncomingImage<'_>>) -> Result<Option<String>, AppError> {
        match image {
            Some(image) => Ok(Some(self.uploads.save_image(image).await?)),
            None => Ok(None),
        }
    }

    /// Cleanup step after a failed write so the stored file is not orphaned
    async fn discard_image(&self, image_ref: Option<&str>) {
        if let Some(image_ref) = image_ref {
            if let Err(e) = self.uploads.remove(image_ref).await {
                tracing::warn!(image = %image_ref, "Failed to remove orphaned upload: {}", e);
            }
        }
    }
}
