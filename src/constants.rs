use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Storage prefix for freshly uploaded assets awaiting relocation.
pub const PENDING_PREFIX: &str = "uploads";
/// Storage prefix for assets whose analysis completed the full pipeline.
pub const PROCESSED_PREFIX: &str = "processed";

/// Fixed instruction sent with every analysis request. The four numbered
/// sections are mandatory: the UI keys its emphasis off the "1)".."4)"
/// line prefixes.
pub const ANALYSIS_PROMPT: &str = "Analyze this image and identify the materials present. \
Describe their environmental impact and estimate CO2 emissions if possible. \
Focus on sustainability aspects and suggest alternatives. \
Format the response in a clear, structured way with sections for: \
1) Materials Identified, 2) Environmental Impact, 3) CO2 Emissions Estimate, \
and 4) Sustainable Alternatives.";

// Generation parameters are deliberately not configurable.
pub const GEN_TEMPERATURE: f64 = 0.4;
pub const GEN_TOP_K: u32 = 32;
pub const GEN_TOP_P: f64 = 1.0;
pub const GEN_MAX_OUTPUT_TOKENS: u32 = 2048;
