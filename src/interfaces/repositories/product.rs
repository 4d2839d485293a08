use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{self, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::product::{Product, ProductChanges, ProductFilter, ProductInsert, ProductRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxProductRepo,
};

const PRODUCT_COLUMNS: &str = "id, title, description, status, date, image";

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &ProductInsert) -> Result<Product, AppError>;
    async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;
    async fn get_product_by_id(&self, id: &Uuid) -> Result<Product, AppError>;
    async fn update_product(&self, id: &Uuid, changes: &ProductChanges) -> Result<Product, AppError>;
    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T> ProductRepository for Arc<T>
where
    T: ProductRepository + ?Sized,
{
    async fn insert_product(&self, product: &ProductInsert) -> Result<Product, AppError> {
        (**self).insert_product(product).await
    }

    async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        (**self).find_products(filter).await
    }

    async fn get_product_by_id(&self, id: &Uuid) -> Result<Product, AppError> {
        (**self).get_product_by_id(id).await
    }

    async fn update_product(&self, id: &Uuid, changes: &ProductChanges) -> Result<Product, AppError> {
        (**self).update_product(id, changes).await
    }

    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete_product(id).await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

impl SqlxProductRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProductRepo { pool }
    }
}

fn into_product(row: ProductRow) -> Result<Product, AppError> {
    Product::try_from(row).map_err(AppError::StorageError)
}

/// Newest-first listing narrowed by `filter`.
fn select_products(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

    push_filter(&mut builder, filter);
    builder.push(" ORDER BY date DESC");
    builder
}

/// Appends the filter predicate to a `WHERE TRUE` query.
fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &ProductFilter) {
    if let Some(status) = &filter.status {
        builder.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(start) = filter.start {
        builder.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND date <= ").push_bind(end);
    }
}

#[async_trait]
impl ProductRepository for SqlxProductRepo {
    async fn insert_product(&self, product: &ProductInsert) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (title, description, status, date, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.status.as_str())
        .bind(product.date)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        into_product(row)
    }

    async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut builder = select_products(filter);
        let rows: Vec<ProductRow> = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_product).collect()
    }

    async fn get_product_by_id(&self, id: &Uuid) -> Result<Product, AppError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".into()))?;

        into_product(row)
    }

    async fn update_product(&self, id: &Uuid, changes: &ProductChanges) -> Result<Product, AppError> {
        // COALESCE keeps stored values for fields the request left out
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                title = $1,
                description = COALESCE($2, description),
                status = $3,
                date = COALESCE($4, date),
                image = COALESCE($5, image),
                updated_at = NOW()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status.as_str())
        .bind(changes.date)
        .bind(&changes.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".into()))?;

        into_product(row)
    }

    async fn delete_product(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".into()));
        }

        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
