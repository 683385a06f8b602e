use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DeeplConfig;
use crate::error::Result;
use crate::language::Language;
use super::{decode_json, success_body, TranslationProvider};

const PROVIDER: &str = "deepl";

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    #[serde(default)]
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    #[serde(default)]
    text: Option<String>,
}

/// DeepL REST API (form-encoded request, key in the Authorization header)
pub struct DeeplProvider {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl DeeplProvider {
    pub fn new(client: Client, endpoint: String, api_key: String) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// `None` when no API key is configured
    pub fn from_config(client: Client, config: &DeeplConfig) -> Option<Self> {
        let Some(api_key) = config.api_key.clone() else {
            info!("No DeepL API key configured, DeepL provider disabled");
            return None;
        };
        Some(Self::new(client, config.endpoint.clone(), api_key))
    }
}

#[async_trait]
impl TranslationProvider for DeeplProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<Option<String>> {
        debug!("Sending DeepL request to: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&[
                ("text", text),
                ("source_lang", source.deepl_code()),
                ("target_lang", target.deepl_code()),
            ])
            .send()
            .await?;

        let body = success_body(PROVIDER, response).await?;
        let parsed: DeeplResponse = decode_json(PROVIDER, &body)?;

        // A reply without a translation is "no result", not an error
        Ok(parsed
            .translations
            .into_iter()
            .next()
            .and_then(|t| t.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}
