pub mod memory;
pub mod product;
pub mod sqlx_repo;
