use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LibreConfig;
use crate::error::Result;
use crate::language::Language;
use super::{decode_json, success_body, TranslationProvider};

const PROVIDER: &str = "libretranslate";

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(default, rename = "translatedText")]
    translated_text: Option<String>,
}

/// Self-hosted LibreTranslate instance
pub struct LibreProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreProvider {
    pub fn new(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// `None` when no endpoint is configured
    pub fn from_config(client: Client, config: &LibreConfig) -> Option<Self> {
        let Some(endpoint) = config.endpoint.clone().filter(|e| !e.trim().is_empty()) else {
            info!("No LibreTranslate endpoint configured, provider disabled");
            return None;
        };
        Some(Self::new(client, endpoint, config.api_key.clone()))
    }
}

#[async_trait]
impl TranslationProvider for LibreProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<Option<String>> {
        debug!("Sending LibreTranslate request to: {}", self.endpoint);

        let request = LibreRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let body = success_body(PROVIDER, response).await?;
        let parsed: LibreResponse = decode_json(PROVIDER, &body)?;

        Ok(parsed
            .translated_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}
