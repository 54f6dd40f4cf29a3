pub mod analysis;
pub mod sqlx_repo;
