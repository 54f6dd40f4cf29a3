use crate::{
    entities::analysis::{AnalysisPage, AnalysisRecord},
    errors::AppError,
    repositories::analysis::AnalysisRepository,
    utils::valid_uuid::valid_uuid,
};

/// Read side of the result store: serves previously persisted analyses back
/// to the UI.
pub struct AnalysisQueryHandler<R>
where
    R: AnalysisRepository,
{
    pub analysis_repo: R,
}

impl<R> AnalysisQueryHandler<R>
where
    R: AnalysisRepository,
{
    pub fn new(analysis_repo: R) -> Self {
        AnalysisQueryHandler { analysis_repo }
    }

    /// Retrieves a single analysis record by its ID
    pub async fn get_analysis(&self, id: &str) -> Result<AnalysisRecord, AppError> {
        let valid_id = valid_uuid(id)?;

        self.analysis_repo
            .get_record(&valid_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Analysis record not found".to_string()))
    }

    /// Retrieves a page of analysis records, newest first
    pub async fn list_analyses(&self, page: u32, per_page: u32) -> Result<AnalysisPage, AppError> {
        let items = self.analysis_repo.list_records(page, per_page).await?;
        let total = self.analysis_repo.count_records().await?;

        Ok(AnalysisPage { items, page, per_page, total })
    }
}
