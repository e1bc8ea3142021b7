use crate::types::{ReviewIssue, ReviewResult};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to decode review result: {message}")]
pub struct ParseError {
    pub message: String,
}

/// Raw shape as the agent tends to emit it. Every field is optional and of
/// loose type; normalization happens after decode.
#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, alias = "overallScore")]
    overall_score: Option<Value>,
    #[serde(default)]
    issues: Option<Value>,
    #[serde(default)]
    strengths: Option<Value>,
    #[serde(default)]
    recommendations: Option<Value>,
}

/// Extracts a structured review result from unstructured agent output.
///
/// The agent is instructed to return bare JSON but occasionally wraps it in
/// prose or code fences, so extraction runs a shallow fallback chain: strip a
/// fenced block if present, then narrow to the outermost brace span, then
/// decode strictly. Anything the chain cannot recover is a hard failure.
pub fn parse_review_result(raw: &str) -> Result<ReviewResult, ParseError> {
    let mut candidate = raw.trim();

    if let Some(inner) = extract_fenced_block(candidate) {
        candidate = inner;
    }
    if let Some(span) = extract_brace_span(candidate) {
        candidate = span;
    }

    let parsed: RawResult = serde_json::from_str(candidate).map_err(|err| ParseError {
        message: err.to_string(),
    })?;

    Ok(normalize(parsed))
}

fn extract_fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

fn extract_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn normalize(raw: RawResult) -> ReviewResult {
    let score = raw
        .overall_score
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    let overall_score = score.clamp(0.0, 100.0).round() as u8;

    ReviewResult {
        summary: raw
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Review completed".to_string()),
        overall_score,
        issues: decode_array::<ReviewIssue>(raw.issues),
        strengths: decode_array::<String>(raw.strengths),
        recommendations: decode_array::<String>(raw.recommendations),
    }
}

fn decode_array<T: serde::de::DeserializeOwned>(value: Option<Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}
