use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{
    constants::{ANALYSIS_PROMPT, GEN_MAX_OUTPUT_TOKENS, GEN_TEMPERATURE, GEN_TOP_K, GEN_TOP_P},
    entities::asset::EncodedImage,
    errors::PipelineError,
    settings::AppConfig,
};

use super::MaterialAnalyzer;

/// Surfaced when the endpoint fails without a usable error payload.
const GENERIC_ANALYSIS_ERROR: &str = "Failed to analyze image with Gemini";

/// Client for the Gemini `generateContent` endpoint.
///
/// No request timeout is set: an unresponsive endpoint stalls the run rather
/// than failing it, matching the pipeline's no-timeout contract.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        GeminiClient {
            http_client: reqwest::Client::new(),
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn request_body(image: &EncodedImage) -> serde_json::Value {
        json!({
            "contents": [{
                "parts": [
                    { "text": ANALYSIS_PROMPT },
                    {
                        "inline_data": {
                            "mime_type": image.media_type,
                            "data": image.data
                        }
                    }
                ]
            }],
            "generationConfig": {
                "temperature": GEN_TEMPERATURE,
                "topK": GEN_TOP_K,
                "topP": GEN_TOP_P,
                "maxOutputTokens": GEN_MAX_OUTPUT_TOKENS
            }
        })
    }
}

#[async_trait]
impl MaterialAnalyzer for GeminiClient {
    async fn analyze(&self, image: &EncodedImage) -> Result<String, PipelineError> {
        tracing::debug!(
            model = %self.model,
            media_type = %image.media_type,
            payload_len = image.data.len(),
            "Sending analysis request to Gemini"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(image))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request transport failure");
                PipelineError::Analysis(GENERIC_ANALYSIS_ERROR.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let payload = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            let message = extract_error_message(&payload)
                .unwrap_or_else(|| GENERIC_ANALYSIS_ERROR.to_string());

            tracing::error!(status = %status, message = %message, "Gemini rejected analysis request");
            return Err(PipelineError::Analysis(message));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Gemini response body was not valid JSON");
            PipelineError::MalformedResponse
        })?;

        let text = extract_text(&body).ok_or_else(|| {
            tracing::error!("Gemini response missing candidates[0].content.parts[0].text");
            PipelineError::MalformedResponse
        })?;

        tracing::info!(analysis_len = text.len(), "Gemini analysis received");

        Ok(text)
    }
}

/// Pulls the server-provided message out of an `{error:{message}}` payload.
fn extract_error_message(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// The result text lives at `candidates[0].content.parts[0].text`; anything
/// else is a malformed response.
fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .text
        .clone()
}

// ───── Response Types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_server_error_message() {
        let payload = json!({ "error": { "message": "quota exceeded", "code": 429 } });
        assert_eq!(extract_error_message(&payload).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn falls_back_when_error_payload_is_absent_or_odd() {
        assert_eq!(extract_error_message(&serde_json::Value::Null), None);
        assert_eq!(extract_error_message(&json!({})), None);
        assert_eq!(extract_error_message(&json!({ "error": "plain string" })), None);
        assert_eq!(extract_error_message(&json!({ "error": { "message": 42 } })), None);
    }

    #[test]
    fn extracts_text_from_well_formed_response() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "1) Materials Identified: aluminum" }]
                }
            }]
        }))
        .unwrap();

        assert_eq!(
            extract_text(&body).as_deref(),
            Some("1) Materials Identified: aluminum")
        );
    }

    #[test]
    fn missing_text_path_is_detected_at_every_level() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(&empty), None);

        let no_content: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{}] })).unwrap();
        assert_eq!(extract_text(&no_content), None);

        let no_parts: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "content": {} }] })).unwrap();
        assert_eq!(extract_text(&no_parts), None);

        let no_text: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "content": { "parts": [{}] } }] }))
                .unwrap();
        assert_eq!(extract_text(&no_text), None);
    }

    #[test]
    fn request_body_carries_prompt_payload_and_generation_config() {
        let image = EncodedImage { media_type: "image/jpeg".into(), data: "Zm9v".into() };
        let body = GeminiClient::request_body(&image);

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], ANALYSIS_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "Zm9v");

        let generation = &body["generationConfig"];
        assert_eq!(generation["temperature"], 0.4);
        assert_eq!(generation["topK"], 32);
        assert_eq!(generation["topP"], 1.0);
        assert_eq!(generation["maxOutputTokens"], 2048);
    }
}
