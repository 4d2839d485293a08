use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    entities::product::{Product, ProductChanges, ProductFilter, ProductInsert},
    errors::AppError,
    repositories::product::ProductRepository,
};

/// In-process product store with the same semantics as the Postgres one.
/// Used by the test suite and for running the API without a database.
#[derive(Debug, Default)]
pub struct MemoryProductRepo {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepo {
    async fn insert_product(&self, product: &ProductInsert) -> Result<Product, AppError> {
        let stored = Product {
            id: Uuid::new_v4(),
            title: product.title.clone(),
            description: product.description.clone(),
            status: product.status,
            date: product.date,
            image: product.image.clone(),
        };

        self.products.write().push(stored.clone());
        Ok(stored)
    }

    async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut found: Vec<Product> = self
            .products
            .read()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn get_product_by_id(&self, id: &Uuid) -> Result<Product, AppError> {
        self.products
            .read()
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Product".into()))
    }

    async fn update_product(&self, id: &Uuid, changes: &ProductChanges) -> Result<Product, AppError> {
        let mut products = self.products.write();
        let product = products
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| AppError::NotFound("Product".into()))?;

        product.title = changes.title.clone();
        product.status = changes.status;
        if let Some(description) = &changes.description {
            product.description = Some(description.clone());
        }
        if let Some(date) = changes.date {
            product.date = date;
        }
        if let Some(image) = &changes.image {
            product.image = Some(image.clone());
        }

        Ok(product.clone())
    }

    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError> {
        let mut products = self.products.write();
        let before = products.len();
        products.retain(|p| p.id != *id);

        if products.len() == before {
            return Err(AppError::NotFound("Product".into()));
        }
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}
