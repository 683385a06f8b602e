use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

use crate::error::{Result, TercumanError};

/// Market mood of a news item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Anything outside the three known values becomes `Neutral`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "positive" | "olumlu" | "pozitif" => Self::Positive,
            "negative" | "olumsuz" | "negatif" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub sentiment: Sentiment,
}

impl SummaryResult {
    /// Degraded result: the given text with neutral sentiment
    pub fn neutral(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            sentiment: Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    sentiment: Option<Value>,
}

/// Parse a model reply of the form `{"summary": ..., "sentiment": ...}`.
///
/// Tolerates markdown code fences and prose around the JSON object.
pub fn parse_summary_response(provider: &'static str, response: &str) -> Result<SummaryResult> {
    let raw = try_flexible_json_parsing(response).ok_or_else(|| TercumanError::MalformedPayload {
        provider,
        detail: "summary reply is not a JSON object".to_string(),
    })?;

    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TercumanError::MalformedPayload {
            provider,
            detail: "summary field missing or empty".to_string(),
        })?;

    let sentiment = match raw.sentiment {
        Some(Value::String(value)) => Sentiment::parse_lenient(&value),
        Some(other) => {
            debug!("Coercing non-string sentiment {} to neutral", other);
            Sentiment::Neutral
        }
        None => Sentiment::Neutral,
    };

    Ok(SummaryResult { summary, sentiment })
}

fn try_flexible_json_parsing(text: &str) -> Option<RawSummary> {
    let text = text.trim();

    if let Ok(parsed) = serde_json::from_str::<RawSummary>(text) {
        return Some(parsed);
    }

    let cleaned = remove_markdown_code_blocks(text);
    if cleaned != text {
        if let Ok(parsed) = serde_json::from_str::<RawSummary>(&cleaned) {
            return Some(parsed);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<RawSummary>(&text[start..=end]).ok()
}

fn remove_markdown_code_blocks(text: &str) -> String {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text.to_string();
    };
    // Drop the language tag on the opening fence
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim().to_string()
}
