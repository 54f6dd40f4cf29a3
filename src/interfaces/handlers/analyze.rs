use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        analysis::AnalyzeResponse,
        asset::{MaterialUploadForm, UploadedAsset},
        pipeline::PipelineState,
    },
    errors::PipelineError,
    AppState,
};

/// Intake endpoint: the single trigger the pipeline consumes. The multipart
/// `image` field is the "user selected file X" event; the response is the
/// terminal pipeline state.
#[instrument(skip(state, form))]
pub async fn analyze_material(
    state: web::Data<AppState>,
    form: MultipartForm<MaterialUploadForm>,
) -> Result<impl Responder, actix_web::Error> {
    let form = form.into_inner();

    let file_name = form.image.file_name.clone();
    let declared_type = form.image.content_type.as_ref().map(|m| m.to_string());

    // The spooled temp file is the local file read; failing to read it is
    // the pipeline's read error, not a transport error.
    let bytes = tokio::fs::read(form.image.file.path()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read spooled upload");
        PipelineError::Read
    })?;

    let asset = UploadedAsset::from_parts(bytes, declared_type, file_name)?;

    let outcome = state.intake_handler.process_upload(asset).await?;

    Ok(HttpResponse::Ok().json(AnalyzeResponse {
        state: PipelineState::Succeeded,
        record_id: outcome.record_id,
        image_url: outcome.image_url,
        analysis: outcome.analysis,
        preview: outcome.preview.to_data_url(),
        processed_at: outcome.processed_at,
    }))
}
