use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxProductRepo {
    pub pool: PgPool,
}
