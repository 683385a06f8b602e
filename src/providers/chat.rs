use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::error::{Result, TercumanError};
use crate::language::Language;
use crate::summary::{parse_summary_response, SummaryResult};
use super::{decode_json, success_body, Summarizer, TranslationProvider};

const PROVIDER: &str = "chat";

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Translation and summarization through an OpenAI-compatible chat completion API
pub struct ChatProvider {
    client: Client,
    config: ChatConfig,
    api_key: String,
    preserved_terms: Vec<String>,
}

impl ChatProvider {
    pub fn new(client: Client, config: ChatConfig, api_key: String, preserved_terms: Vec<String>) -> Self {
        Self {
            client,
            config,
            api_key,
            preserved_terms,
        }
    }

    /// `None` when no API key is configured
    pub fn from_config(client: Client, config: &ChatConfig, preserved_terms: &[String]) -> Option<Self> {
        let Some(api_key) = config.api_key.clone() else {
            info!("No chat completion API key configured, chat provider disabled");
            return None;
        };
        Some(Self::new(client, config.clone(), api_key, preserved_terms.to_vec()))
    }

    /// Send one system + user exchange and return the first reply
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending chat completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = success_body(PROVIDER, response).await?;
        let parsed: ChatResponse = decode_json(PROVIDER, &body)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TercumanError::MalformedPayload {
                provider: PROVIDER,
                detail: "no message content in first choice".to_string(),
            })
    }

    fn translation_prompt(&self, source: Language, target: Language) -> String {
        format!(
            "You are a professional financial news translator specialised in cryptocurrency.\n\
             \n\
             Translate the user's {source} text into {target}. Output {target} ONLY.\n\
             \n\
             Keep these exactly as written, do not translate them:\n\
             - Names of people, companies, exchanges and institutions\n\
             - Currency amounts, percentages and numbers (e.g. $70,000, 2.5%)\n\
             - Coin, token, protocol and product names and tickers\n\
             - These terms: {terms}\n\
             \n\
             Rules:\n\
             - Return only the translation, with no notes, explanations or quotation marks.\n\
             - Do not include any {source} sentence in the answer.\n\
             - Do not add or remove information.",
            source = source.name(),
            target = target.name(),
            terms = self.preserved_terms.join(", "),
        )
    }

    fn summary_prompt(&self, target: Language) -> String {
        format!(
            "You are a cryptocurrency news editor.\n\
             \n\
             Summarise the news item given by the user in 2-3 sentences of {target}, and judge \
             its market sentiment.\n\
             \n\
             Keep names, currency amounts, percentages, tickers and these terms unchanged: {terms}\n\
             Do not include sentences in any other language.\n\
             \n\
             Return ONLY JSON in this format:\n\
             {{\"summary\": \"{target} summary\", \"sentiment\": \"positive|negative|neutral\"}}",
            target = target.name(),
            terms = self.preserved_terms.join(", "),
        )
    }
}

#[async_trait]
impl TranslationProvider for ChatProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<Option<String>> {
        let system = self.translation_prompt(source, target);
        let reply = self.complete(&system, text, self.config.max_tokens).await?;
        let cleaned = clean_translation_response(&reply);
        Ok((!cleaned.is_empty()).then_some(cleaned))
    }
}

#[async_trait]
impl Summarizer for ChatProvider {
    async fn summarize(&self, title: &str, content: &str, target: Language) -> Result<SummaryResult> {
        let system = self.summary_prompt(target);
        let user = if content.trim().is_empty() {
            format!("Title: {}", title)
        } else {
            format!("Title: {}\n\nContent: {}", title, content)
        };
        let reply = self.complete(&system, &user, self.config.summary_max_tokens).await?;
        parse_summary_response(PROVIDER, &reply)
    }
}

/// Strip labels and quotes models like to wrap translations in
fn clean_translation_response(response: &str) -> String {
    let mut text = response.trim();

    for label in ["Translation:", "Çeviri:", "Turkish:", "Türkçe:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim_start();
        }
    }

    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }

    text.to_string()
}
