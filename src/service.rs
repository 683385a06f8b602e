use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chunk::chunk;
use crate::config::{Config, PipelineConfig};
use crate::error::Result;
use crate::fallback::{Acceptance, ProviderChain};
use crate::language::Language;
use crate::normalize::{clean, collapse_whitespace, normalize_with_min};
use crate::providers::{
    build_http_client, ChatProvider, DeeplProvider, GoogleProvider, LibreProvider, Summarizer,
    TranslationProvider,
};
use crate::retry::retry_with_backoff;
use crate::summary::{Sentiment, SummaryResult};
use crate::validate::Validator;

/// Failure payload of the endpoint path: the error plus the best-effort text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointFailure {
    pub error: String,
    pub translation: String,
}

/// Translation and summarization entry points over the provider chains
pub struct TranslationService {
    /// chat → google → libretranslate
    general: ProviderChain,
    /// deepl → chat → google
    endpoint: ProviderChain,
    summarizer: Option<Arc<dyn Summarizer>>,
    validator: Arc<Validator>,
    settings: PipelineConfig,
}

impl TranslationService {
    /// Build every configured provider and arrange them into chains
    pub fn from_config(config: &Config) -> Result<Self> {
        let validator = Arc::new(Validator::load(config.validation.rules_path.as_deref())?);
        let providers = &config.providers;
        let client = build_http_client(&providers.http)?;

        let chat = ChatProvider::from_config(client.clone(), &providers.chat, validator.preserved_terms())
            .map(Arc::new);
        let deepl = DeeplProvider::from_config(client.clone(), &providers.deepl)
            .map(|p| Arc::new(p) as Arc<dyn TranslationProvider>);
        let google = GoogleProvider::from_config(client.clone(), &providers.google, &providers.http.user_agent)
            .map(|p| Arc::new(p) as Arc<dyn TranslationProvider>);
        let libre = LibreProvider::from_config(client, &providers.libre)
            .map(|p| Arc::new(p) as Arc<dyn TranslationProvider>);

        let chat_translator = chat.clone().map(|p| p as Arc<dyn TranslationProvider>);
        let summarizer = chat.map(|p| p as Arc<dyn Summarizer>);

        let fallback = Acceptance::DiffersFromSource {
            min_chars: config.pipeline.min_fallback_chars,
        };

        let general = ProviderChain::new(validator.clone())
            .with_optional_stage(chat_translator.clone(), Acceptance::Validated)
            .with_optional_stage(google.clone(), fallback)
            .with_optional_stage(libre, fallback);

        let endpoint = ProviderChain::new(validator.clone())
            .with_optional_stage(deepl, Acceptance::NonEmpty)
            .with_optional_stage(chat_translator, Acceptance::Validated)
            .with_optional_stage(google, fallback);

        info!(
            "Translation chain: [{}], endpoint chain: [{}], summarizer: {}",
            general.provider_names().join(" → "),
            endpoint.provider_names().join(" → "),
            if summarizer.is_some() { "chat" } else { "none" }
        );

        Ok(Self::from_parts(general, endpoint, summarizer, validator, config.pipeline.clone()))
    }

    pub fn from_parts(
        general: ProviderChain,
        endpoint: ProviderChain,
        summarizer: Option<Arc<dyn Summarizer>>,
        validator: Arc<Validator>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            general,
            endpoint,
            summarizer,
            validator,
            settings,
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    /// Translate into the configured target language; never fails
    pub async fn translate_text(&self, raw: &str) -> String {
        self.translate_text_to(raw, self.settings.target_language).await
    }

    /// Translate into `target`.
    ///
    /// Chunks whose providers are all exhausted keep their source text. When
    /// nothing could be translated the normalized source comes back unchanged.
    pub async fn translate_text_to(&self, raw: &str, target: Language) -> String {
        let normalized = normalize_with_min(raw, self.settings.min_content_chars);
        if normalized.is_empty() {
            debug!("No meaningful content to translate");
            return normalized;
        }

        let source = self.settings.source_language;
        if source == target {
            return normalized;
        }

        let chunks = chunk(&normalized, self.settings.chunk_size);
        let total = chunks.len();
        let mut translated = Vec::with_capacity(total);
        let mut degraded = 0;

        for (idx, piece) in chunks.into_iter().enumerate() {
            match self.general.first_acceptable(&piece, source, target).await {
                Ok(text) => translated.push(text),
                Err(e) => {
                    warn!("Chunk {}/{} left untranslated: {}", idx + 1, total, e);
                    degraded += 1;
                    translated.push(piece);
                }
            }
        }

        if degraded == total {
            warn!("All providers failed, returning normalized source text");
            return normalized;
        }

        finish(&translated)
    }

    /// Endpoint variant: DeepL first, and exhaustion is reported to the caller
    /// together with the normalized original.
    pub async fn translate_for_endpoint(&self, raw: &str) -> std::result::Result<String, EndpointFailure> {
        let normalized = normalize_with_min(raw, self.settings.min_content_chars);
        if normalized.is_empty() {
            return Ok(normalized);
        }

        let source = self.settings.source_language;
        let target = self.settings.target_language;
        if source == target {
            return Ok(normalized);
        }

        let mut translated = Vec::new();
        for piece in chunk(&normalized, self.settings.chunk_size) {
            match self.endpoint.first_acceptable(&piece, source, target).await {
                Ok(text) => translated.push(text),
                Err(e) => {
                    warn!("Endpoint translation failed: {}", e);
                    return Err(EndpointFailure {
                        error: e.to_string(),
                        translation: normalized,
                    });
                }
            }
        }

        Ok(finish(&translated))
    }

    /// Translate items independently; a failed item keeps its original text.
    ///
    /// Items longer than the chunk size are split first. Output order always
    /// matches input order.
    pub async fn translate_batch(&self, texts: &[String]) -> Vec<String> {
        let concurrency = self.settings.batch_concurrency.max(1);
        info!("Translating batch of {} item(s), {} at a time", texts.len(), concurrency);

        stream::iter(0..texts.len())
            .map(|idx| self.translate_batch_item(idx, &texts[idx]))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn translate_batch_item(&self, idx: usize, text: &str) -> String {
        let cleaned = clean(text);
        if cleaned.is_empty() {
            return String::new();
        }

        let source = self.settings.source_language;
        let target = self.settings.target_language;
        if source == target {
            return cleaned;
        }

        // Long items are split like any other text; one failed chunk fails the item
        let mut translated = Vec::new();
        for piece in chunk(&cleaned, self.settings.chunk_size) {
            match self.general.first_acceptable(&piece, source, target).await {
                Ok(translation) => translated.push(translation),
                Err(e) => {
                    warn!("Batch item {} left untranslated: {}", idx, e);
                    return text.to_string();
                }
            }
        }

        finish(&translated)
    }

    /// Summarize a news item in the target language with a sentiment label.
    ///
    /// Falls back to a translated title, then to the untranslated title; never fails.
    pub async fn summarize_and_translate(&self, title: &str, content: &str) -> SummaryResult {
        if title.trim().is_empty() {
            return SummaryResult::neutral(title);
        }

        let source = self.settings.source_language;
        let target = self.settings.target_language;
        let clean_title = match clean(title) {
            t if t.is_empty() => collapse_whitespace(title),
            t => t,
        };
        let clean_content = clean(content);

        if let Some(summarizer) = &self.summarizer {
            match self.summarize_with_retry(summarizer.as_ref(), &clean_title, &clean_content, target).await {
                Ok(summary) => return summary,
                Err(e) => warn!("Summarization failed, translating title only: {}", e),
            }
        } else {
            debug!("No summarizer configured, translating title only");
        }

        if source != target {
            match self.general.first_acceptable(&clean_title, source, target).await {
                Ok(translated) => {
                    return SummaryResult {
                        summary: translated,
                        sentiment: Sentiment::Neutral,
                    };
                }
                Err(e) => warn!("Title translation failed, returning original title: {}", e),
            }
        }

        SummaryResult::neutral(title.trim())
    }

    async fn summarize_with_retry(
        &self,
        summarizer: &dyn Summarizer,
        title: &str,
        content: &str,
        target: Language,
    ) -> Result<SummaryResult> {
        let validator = self.validator.as_ref();
        let policy = self.settings.summary_retry.policy();

        retry_with_backoff(policy, "summarize", || async move {
            let summary = summarizer.summarize(title, content, target).await?;
            let text = validator.validate(&summary.summary, target).into_result()?;
            Ok(SummaryResult {
                summary: text,
                sentiment: summary.sentiment,
            })
        })
        .await
    }
}

/// Reassemble translated chunks and give the result a last cleanup
fn finish(translated: &[String]) -> String {
    let joined = translated.join(" ");
    let cleaned = clean(&joined);
    if cleaned.is_empty() {
        collapse_whitespace(&joined)
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TercumanError;
    use crate::providers::{MockSummarizer, MockTranslationProvider};
    use std::time::Duration;

    const TURKISH: &str = "Şirket yeni bir ortaklık duyurdu.";

    fn validator() -> Arc<Validator> {
        Arc::new(Validator::bundled().unwrap())
    }

    fn settings() -> PipelineConfig {
        let mut settings = PipelineConfig::default();
        settings.summary_retry.initial_delay_ms = 1;
        settings
    }

    fn provider<F>(name: &'static str, reply: F) -> Arc<dyn TranslationProvider>
    where
        F: Fn(&str) -> Result<Option<String>> + Send + 'static,
    {
        let mut mock = MockTranslationProvider::new();
        mock.expect_name().return_const(name);
        mock.expect_translate().returning(move |text, _, _| reply(text));
        Arc::new(mock)
    }

    fn unavailable(name: &'static str) -> Arc<dyn TranslationProvider> {
        provider(name, move |_| {
            Err(TercumanError::Status {
                provider: name,
                status: 500,
                body: String::new(),
            })
        })
    }

    fn service_with(general: ProviderChain, summarizer: Option<Arc<dyn Summarizer>>) -> TranslationService {
        let validator = validator();
        TranslationService::from_parts(
            general,
            ProviderChain::new(validator.clone()),
            summarizer,
            validator,
            settings(),
        )
    }

    #[tokio::test]
    async fn test_translate_uses_primary_result() {
        let chain = ProviderChain::new(validator())
            .with_stage(provider("chat", |_| Ok(Some(TURKISH.to_string()))), Acceptance::Validated);
        let service = service_with(chain, None);

        let result = service
            .translate_text("<p>The company announced a new partnership.</p>")
            .await;
        assert_eq!(result, TURKISH);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_normalized_source() {
        let chain = ProviderChain::new(validator())
            .with_stage(unavailable("chat"), Acceptance::Validated)
            .with_stage(unavailable("google"), Acceptance::DiffersFromSource { min_chars: 2 });
        let service = service_with(chain, None);

        let raw = "  <b>Bitcoin</b> hits   a new high | CoinDesk ";
        assert_eq!(service.translate_text(raw).await, "Bitcoin hits a new high");
    }

    #[tokio::test]
    async fn test_short_input_short_circuits() {
        let mut mock = MockTranslationProvider::new();
        mock.expect_name().return_const("chat");
        mock.expect_translate().never();
        let chain = ProviderChain::new(validator()).with_stage(Arc::new(mock), Acceptance::Validated);
        let service = service_with(chain, None);

        assert_eq!(service.translate_text("BTC").await, "");
    }

    #[tokio::test]
    async fn test_long_text_is_translated_per_chunk_in_order() {
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |text| Ok(Some(format!("[{}]", text)))),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let mut settings = settings();
        settings.chunk_size = 40;
        let validator = validator();
        let service = TranslationService::from_parts(
            chain,
            ProviderChain::new(validator.clone()),
            None,
            validator,
            settings,
        );

        let result = service
            .translate_text("First sentence is right here. Second sentence follows it. Third one ends.")
            .await;
        assert_eq!(
            result,
            "[First sentence is right here.] [Second sentence follows it.] [Third one ends.]"
        );
    }

    #[tokio::test]
    async fn test_batch_degrades_per_item() {
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |text| match text {
                "A." => Ok(Some("A (tr).".to_string())),
                _ => Err(TercumanError::Rejected("boom".to_string())),
            }),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let service = service_with(chain, None);

        let result = service
            .translate_batch(&["A.".to_string(), "B.".to_string(), "  ".to_string()])
            .await;
        assert_eq!(result, vec!["A (tr).".to_string(), "B.".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_endpoint_failure_carries_original() {
        let validator = validator();
        let endpoint = ProviderChain::new(validator.clone())
            .with_stage(unavailable("deepl"), Acceptance::NonEmpty)
            .with_stage(unavailable("google"), Acceptance::DiffersFromSource { min_chars: 2 });
        let service = TranslationService::from_parts(
            ProviderChain::new(validator.clone()),
            endpoint,
            None,
            validator,
            settings(),
        );

        let failure = service
            .translate_for_endpoint("Ether slides below $3,000 https://t.example/x")
            .await
            .unwrap_err();
        assert_eq!(failure.translation, "Ether slides below $3,000");
        assert!(failure.error.contains("2 attempt"));
    }

    #[tokio::test]
    async fn test_endpoint_success() {
        let validator = validator();
        let endpoint = ProviderChain::new(validator.clone())
            .with_stage(provider("deepl", |_| Ok(Some("Ether 3.000 doların altına düştü".to_string()))), Acceptance::NonEmpty);
        let service = TranslationService::from_parts(
            ProviderChain::new(validator.clone()),
            endpoint,
            None,
            validator,
            settings(),
        );

        assert_eq!(
            service.translate_for_endpoint("Ether slides below $3,000").await,
            Ok("Ether 3.000 doların altına düştü".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_title_skips_network() {
        let mut summarizer = MockSummarizer::new();
        summarizer.expect_summarize().never();
        let service = service_with(ProviderChain::new(validator()), Some(Arc::new(summarizer)));

        assert_eq!(
            service.summarize_and_translate("   ", "content").await,
            SummaryResult::neutral("   ")
        );
    }

    #[tokio::test]
    async fn test_summary_success() {
        let mut summarizer = MockSummarizer::new();
        summarizer.expect_summarize().times(1).returning(|_, _, _| {
            Ok(SummaryResult {
                summary: "Bitcoin fiyatı rekor kırdı ve yatırımcılar sevindi.".to_string(),
                sentiment: Sentiment::Positive,
            })
        });
        let service = service_with(ProviderChain::new(validator()), Some(Arc::new(summarizer)));

        let result = service
            .summarize_and_translate("Bitcoin hits record", "Bitcoin reached a new all-time high.")
            .await;
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.summary, "Bitcoin fiyatı rekor kırdı ve yatırımcılar sevindi.");
    }

    #[tokio::test]
    async fn test_rejected_summary_is_retried_then_title_translated() {
        let mut summarizer = MockSummarizer::new();
        summarizer.expect_summarize().times(2).returning(|_, _, _| {
            Ok(SummaryResult {
                summary: "Bitcoin reached a record high today.".to_string(),
                sentiment: Sentiment::Positive,
            })
        });
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |_| Ok(Some("Bitcoin rekor kırdı".to_string()))),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let service = service_with(chain, Some(Arc::new(summarizer)));

        let result = service.summarize_and_translate("Bitcoin hits record", "").await;
        assert_eq!(result, SummaryResult::neutral("Bitcoin rekor kırdı"));
    }

    #[tokio::test]
    async fn test_total_summary_failure_returns_title() {
        let mut summarizer = MockSummarizer::new();
        summarizer
            .expect_summarize()
            .returning(|_, _, _| Err(TercumanError::MissingCredential("chat")));
        let chain = ProviderChain::new(validator()).with_stage(unavailable("google"), Acceptance::NonEmpty);
        let service = service_with(chain, Some(Arc::new(summarizer)));

        let result = service.summarize_and_translate(" Bitcoin hits record ", "body").await;
        assert_eq!(result, SummaryResult::neutral("Bitcoin hits record"));
    }

    #[tokio::test]
    async fn test_long_batch_item_is_chunked() {
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |text| {
                if text.chars().count() > 40 {
                    Err(TercumanError::Rejected("too long".to_string()))
                } else {
                    Ok(Some(format!("[{}]", text)))
                }
            }),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let mut settings = settings();
        settings.chunk_size = 40;
        let validator = validator();
        let service = TranslationService::from_parts(
            chain,
            ProviderChain::new(validator.clone()),
            None,
            validator,
            settings,
        );

        let item = "First sentence is right here. Second sentence follows it.".to_string();
        let short = "A.".to_string();
        let result = service.translate_batch(&[item, short]).await;
        assert_eq!(
            result,
            vec![
                "[First sentence is right here.] [Second sentence follows it.]".to_string(),
                "[A.]".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_item_with_failed_chunk_keeps_original() {
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |text| match text {
                "Second sentence follows it." => Err(TercumanError::Rejected("boom".to_string())),
                other => Ok(Some(format!("[{}]", other))),
            }),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let mut settings = settings();
        settings.chunk_size = 40;
        let validator = validator();
        let service = TranslationService::from_parts(
            chain,
            ProviderChain::new(validator.clone()),
            None,
            validator,
            settings,
        );

        let item = "First sentence is right here.  Second sentence follows it.".to_string();
        assert_eq!(service.translate_batch(&[item.clone()]).await, vec![item]);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_under_concurrency() {
        let chain = ProviderChain::new(validator()).with_stage(
            provider("google", |text| Ok(Some(format!("{} (tr)", text)))),
            Acceptance::DiffersFromSource { min_chars: 2 },
        );
        let service = service_with(chain, None);

        let items: Vec<String> = (0..10).map(|i| format!("Item {}", i)).collect();
        let result = service.translate_batch(&items).await;
        let expected: Vec<String> = items.iter().map(|i| format!("{} (tr)", i)).collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_finish_cleans_joined_chunks() {
        assert_eq!(finish(&["Bir.".to_string(), " İki.  ".to_string()]), "Bir. İki.");
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_builds_fallback_only_chains() {
        let mut config = Config::default();
        config.providers.libre.endpoint = None;
        let service = TranslationService::from_config(&config).unwrap();

        assert_eq!(service.general.provider_names(), vec!["google"]);
        assert_eq!(service.endpoint.provider_names(), vec!["google"]);
        assert!(service.summarizer.is_none());
    }

    #[test]
    fn test_retry_policy_comes_from_settings() {
        assert_eq!(
            settings().summary_retry.policy().initial_delay,
            Duration::from_millis(1)
        );
    }
}
