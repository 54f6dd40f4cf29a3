use async_trait::async_trait;

use crate::{entities::asset::EncodedImage, errors::PipelineError};

mod gemini;

pub use gemini::GeminiClient;

/// Remote multimodal inference collaborator. Exactly one call per pipeline
/// run; the returned text is the AnalysisResult.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialAnalyzer: Send + Sync {
    async fn analyze(&self, image: &EncodedImage) -> Result<String, PipelineError>;
}
