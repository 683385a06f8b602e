// Translation and summarization backends
//
// Every backend adapts the same capability to its own wire format:
// - Chat: OpenAI-compatible chat completion (translation and summaries)
// - DeepL: dedicated translation REST API
// - Google: unofficial web translation endpoint
// - Libre: self-hosted LibreTranslate instance
//
// Adapters never decide whether a result is good enough; that is the job of
// the fallback chain and the validator.

pub mod chat;
pub mod deepl;
pub mod google;
pub mod libre;

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Result, TercumanError};
use crate::language::Language;
use crate::summary::SummaryResult;

pub use chat::ChatProvider;
pub use deepl::DeeplProvider;
pub use google::GoogleProvider;
pub use libre::LibreProvider;

/// A backend that turns text in one language into another
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Translate one chunk.
    ///
    /// `Ok(None)` means the provider answered but had nothing usable; the
    /// chain treats it like a failure without it being an error.
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<Option<String>>;
}

/// A backend that produces a target-language summary with sentiment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, content: &str, target: Language) -> Result<SummaryResult>;
}

/// Shared HTTP client for all providers
pub fn build_http_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| TercumanError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Body of a successful response; any other status becomes an error
pub(crate) async fn success_body(provider: &'static str, response: Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TercumanError::Status {
            provider,
            status: status.as_u16(),
            body: truncate(&body, 200),
        });
    }

    let body = response.text().await?;
    debug!("{} responded with {} bytes", provider, body.len());
    Ok(body)
}

/// Decode a JSON body, reporting failures as malformed payloads
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(provider: &'static str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| TercumanError::MalformedPayload {
        provider,
        detail: e.to_string(),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
