use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    entities::{
        analysis::AnalysisRecordInsert,
        asset::{pending_key, processed_key, EncodedImage, UploadedAsset},
        pipeline::{NullObserver, PipelineState, StateObserver},
    },
    errors::PipelineError,
    infrastructure::{inference::MaterialAnalyzer, storage::ObjectStorage},
    repositories::analysis::AnalysisRepository,
};

/// Terminal success payload of one pipeline run.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub record_id: Uuid,
    pub image_url: String,
    pub analysis: String,
    pub preview: EncodedImage,
    pub processed_at: DateTime<Utc>,
}

/// Stage 1+2 (Validate & Read, Encode): consumes the asset and yields its
/// encoded form plus the filename needed for storage key naming. The asset
/// does not survive this stage.
pub fn read_stage(asset: UploadedAsset) -> Result<(EncodedImage, String), PipelineError> {
    if asset.bytes.is_empty() {
        return Err(PipelineError::Read);
    }

    let encoded = EncodedImage::from_asset(&asset);
    Ok((encoded, asset.file_name))
}

/// Drives one upload through the four ordered stages. One instance serves
/// all requests; each run carries its own state, reported through the
/// observer.
pub struct IntakeHandler<A, S, R>
where
    A: MaterialAnalyzer,
    S: ObjectStorage,
    R: AnalysisRepository,
{
    pub analyzer: A,
    pub storage: S,
    pub analysis_repo: R,
}

impl<A, S, R> IntakeHandler<A, S, R>
where
    A: MaterialAnalyzer,
    S: ObjectStorage,
    R: AnalysisRepository,
{
    pub fn new(analyzer: A, storage: S, analysis_repo: R) -> Self {
        IntakeHandler { analyzer, storage, analysis_repo }
    }

    pub async fn process_upload(&self, asset: UploadedAsset) -> Result<IntakeOutcome, PipelineError> {
        self.process_upload_observed(asset, &NullObserver).await
    }

    /// Runs the pipeline, reporting every state transition. Whatever path a
    /// run takes, exactly one terminal state is reported and it is the last
    /// state the observer sees.
    pub async fn process_upload_observed(
        &self,
        asset: UploadedAsset,
        observer: &dyn StateObserver,
    ) -> Result<IntakeOutcome, PipelineError> {
        let result = self.drive(asset, observer).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(record_id = %outcome.record_id, "Intake pipeline succeeded");
                observer.state_changed(&PipelineState::Succeeded);
            }
            Err(e) => {
                tracing::error!(stage = e.stage(), error = %e, "Intake pipeline failed");
                observer.state_changed(&PipelineState::Failed(e.to_string()));
            }
        }

        result
    }

    /// Stages in order, each gated on the prior succeeding. `?` is the gate:
    /// a failed stage returns before the next one is entered.
    async fn drive(
        &self,
        asset: UploadedAsset,
        observer: &dyn StateObserver,
    ) -> Result<IntakeOutcome, PipelineError> {
        observer.state_changed(&PipelineState::Reading);
        let (encoded, file_name) = read_stage(asset)?;

        observer.state_changed(&PipelineState::Analyzing);
        let analysis = self.analyzer.analyze(&encoded).await?;

        observer.state_changed(&PipelineState::Persisting);
        let (record_id, image_url, processed_at) =
            self.persist_stage(&encoded, &file_name, &analysis).await?;

        Ok(IntakeOutcome { record_id, image_url, analysis, preview: encoded, processed_at })
    }

    /// Stage 4 (Persist), three dependent sub-steps:
    /// (a) upload the original bytes under the pending prefix,
    /// (b) insert the record pointing at the object's final public URL,
    /// (c) relocate the object to the processed prefix.
    ///
    /// A failed (c) would strand the record's URL, so it fails the run; the
    /// just-inserted record is deleted best-effort.
    async fn persist_stage(
        &self,
        encoded: &EncodedImage,
        file_name: &str,
        analysis: &str,
    ) -> Result<(Uuid, String, DateTime<Utc>), PipelineError> {
        let now = Utc::now();
        let millis = now.timestamp_millis();
        let pending = pending_key(millis, file_name);
        let processed = processed_key(millis, file_name);

        let bytes = encoded.decode_bytes()?;
        self.storage
            .upload(&pending, bytes, &encoded.media_type)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        let image_url = self.storage.public_url(&processed);

        let record = AnalysisRecordInsert {
            image_url: image_url.clone(),
            analysis: analysis.to_string(),
            processed_at: now,
        };
        let record_id = self
            .analysis_repo
            .insert_record(&record)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        if let Err(e) = self.storage.move_object(&pending, &processed).await {
            tracing::warn!(
                record_id = %record_id,
                pending_key = %pending,
                error = %e,
                "Relocation to processed failed; removing the stranded record"
            );
            if let Err(del) = self.analysis_repo.delete_record(&record_id).await {
                tracing::error!(record_id = %record_id, error = %del, "Compensating record delete failed");
            }
            return Err(PipelineError::Persistence(e.to_string()));
        }

        Ok((record_id, image_url, now))
    }
}
