use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::pipeline::PipelineState;

// ───── Database Models ────────────────────────────────────────────────

/// Durable result of one completed pipeline run.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub image_url: String,
    pub analysis: String,
    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. Written only after analysis succeeded for the same asset.
#[derive(Debug, Clone)]
pub struct AnalysisRecordInsert {
    pub image_url: String,
    pub analysis: String,
    pub processed_at: DateTime<Utc>,
}

// ───── API Responses ──────────────────────────────────────────────────

/// Terminal success payload for an intake run: everything the presentation
/// layer consumes (state, preview, analysis text, and the stored record).
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub state: PipelineState,
    pub record_id: Uuid,
    pub image_url: String,
    pub analysis: String,
    /// Data-URL echo of the uploaded image for on-screen preview.
    pub preview: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisPage {
    pub items: Vec<AnalysisRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}
