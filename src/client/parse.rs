// Model output parsing, in two explicit stages.
//
// Stage one strips known wrapper patterns (Markdown code fences) that small
// models add despite being told not to. Stage two is a strict serde parse
// into the expected shape. A failure is a typed error carrying a truncated
// sample of the raw text so the caller can log it for diagnosis.

use chrono::Utc;
use regex_lite::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::{AnalysisResult, AnalysisSource};

/// Why a model response could not be turned into an AnalysisResult.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned an empty response")]
    Empty,
    #[error("model output is not the expected JSON shape: {message} (sample: {sample})")]
    Unparseable { message: String, sample: String },
}

/// The wire shape models are prompted to produce. Everything except the
/// score is best-effort: small models drop fields under pressure, and a
/// missing flag should not throw away an otherwise usable result.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    score: f64,
    #[serde(default)]
    category: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    is_highlight: bool,
    #[serde(default)]
    is_inappropriate: bool,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Strip a Markdown code-fence wrapper (```json ... ``` or bare ``` ... ```)
/// from around a model response, returning the inner text.
///
/// Local models wrap JSON in fences no matter how firmly the prompt says
/// not to. Unfenced input passes through unchanged.
pub fn strip_markdown_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    // (?s) so the body match crosses newlines
    let fence = Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```$").expect("static regex");
    match fence.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Parse a raw model response into an AnalysisResult.
///
/// The score is clamped into [0,100] and confidence into [0,1]; out-of-range
/// values are a model mistake, not a reason to discard the response.
pub fn parse_analysis(
    raw: &str,
    source: AnalysisSource,
    model_name: &str,
) -> Result<AnalysisResult, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let stripped = strip_markdown_fences(raw);
    let parsed: RawAnalysis =
        serde_json::from_str(&stripped).map_err(|e| ParseError::Unparseable {
            message: e.to_string(),
            sample: truncate_chars(raw, 120),
        })?;

    Ok(AnalysisResult {
        score: parsed.score.clamp(0.0, 100.0),
        category: parsed.category,
        label: parsed.label,
        reason: parsed.reason,
        is_highlight: parsed.is_highlight,
        is_inappropriate: parsed.is_inappropriate,
        confidence: parsed.confidence.map(|c| c.clamp(0.0, 1.0)),
        source,
        model_name: model_name.to_string(),
        analyzed_at: Utc::now(),
    })
}

/// Truncate a string to at most `max_chars` characters, appending "..." if
/// truncated. Respects UTF-8 character boundaries, so danmaku full of CJK
/// text and emoji never panics a log line.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
