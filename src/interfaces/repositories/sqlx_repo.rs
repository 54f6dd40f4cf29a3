use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxAnalysisRepo {
    pub pool: PgPool,
}
