use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::GoogleConfig;
use crate::error::{Result, TercumanError};
use crate::language::Language;
use super::{decode_json, success_body, TranslationProvider};

const PROVIDER: &str = "google";

/// Google's public web translation endpoint (no key, no contract)
pub struct GoogleProvider {
    client: Client,
    endpoint: String,
    user_agent: String,
}

impl GoogleProvider {
    pub fn new(client: Client, endpoint: String, user_agent: String) -> Self {
        Self {
            client,
            endpoint,
            user_agent,
        }
    }

    /// `None` when disabled in the configuration
    pub fn from_config(client: Client, config: &GoogleConfig, user_agent: &str) -> Option<Self> {
        if !config.enabled {
            info!("Google web translation disabled by configuration");
            return None;
        }
        Some(Self::new(client, config.endpoint.clone(), user_agent.to_string()))
    }
}

#[async_trait]
impl TranslationProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<Option<String>> {
        debug!("Sending Google translation request to: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .header("User-Agent", &self.user_agent)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let body = success_body(PROVIDER, response).await?;
        let json: Value = decode_json(PROVIDER, &body)?;
        let translated = join_fragments(&json)?;

        Ok((!translated.is_empty()).then_some(translated))
    }
}

/// The reply is `[[[translated, original, ...], ...], ...]`; the translation
/// is every first element of the first array, in order
fn join_fragments(json: &Value) -> Result<String> {
    let segments = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TercumanError::MalformedPayload {
            provider: PROVIDER,
            detail: "missing segment array at index 0".to_string(),
        })?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    Ok(translated.trim().to_string())
}
