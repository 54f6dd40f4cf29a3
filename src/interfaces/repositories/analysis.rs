use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::analysis::{AnalysisRecord, AnalysisRecordInsert},
    errors::AppError,
    repositories::sqlx_repo::SqlxAnalysisRepo,
};

/// Record-store collaborator. The pipeline only inserts (and deletes, to
/// compensate a failed relocation); the read API adds get/list/count.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn insert_record(&self, record: &AnalysisRecordInsert) -> Result<Uuid, AppError>;
    async fn delete_record(&self, id: &Uuid) -> Result<(), AppError>;
    async fn get_record(&self, id: &Uuid) -> Result<Option<AnalysisRecord>, AppError>;
    async fn list_records(&self, page: u32, per_page: u32) -> Result<Vec<AnalysisRecord>, AppError>;
    async fn count_records(&self) -> Result<u64, AppError>;
}

impl SqlxAnalysisRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxAnalysisRepo { pool }
    }
}

#[async_trait]
impl AnalysisRepository for SqlxAnalysisRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn insert_record(&self, record: &AnalysisRecordInsert) -> Result<Uuid, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO material_analysis (
                image_url,
                analysis,
                processed_at
            )
            VALUES ($1, $2, $3) RETURNING id
            "#,
        )
        .bind(&record.image_url)
        .bind(&record.analysis)
        .bind(record.processed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(id)
    }

    async fn delete_record(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM material_analysis WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Analysis record not found".to_string()));
        }

        Ok(())
    }

    async fn get_record(&self, id: &Uuid) -> Result<Option<AnalysisRecord>, AppError> {
        sqlx::query_as::<_, AnalysisRecord>(
            "SELECT id, image_url, analysis, processed_at, created_at \
             FROM material_analysis WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_records(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AnalysisRecord>, AppError> {
        let offset = (page.saturating_sub(1) as i64) * per_page as i64;

        sqlx::query_as::<_, AnalysisRecord>(
            "SELECT id, image_url, analysis, processed_at, created_at \
             FROM material_analysis ORDER BY processed_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn count_records(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM material_analysis")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(count as u64)
    }
}
