use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, TercumanError};
use crate::language::Language;
use crate::normalize::collapse_whitespace;
use crate::providers::TranslationProvider;
use crate::validate::{ValidationVerdict, Validator};

/// What a stage's result must satisfy before the chain stops
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceptance {
    /// Any non-empty result
    NonEmpty,
    /// Result differs from the source and has at least `min_chars` characters
    DiffersFromSource { min_chars: usize },
    /// Result passes the output validator; the cleaned text is used
    Validated,
}

struct Stage {
    provider: Arc<dyn TranslationProvider>,
    acceptance: Acceptance,
}

/// Providers tried in priority order until one yields an acceptable result
pub struct ProviderChain {
    stages: Vec<Stage>,
    validator: Arc<Validator>,
}

impl ProviderChain {
    pub fn new(validator: Arc<Validator>) -> Self {
        Self {
            stages: Vec::new(),
            validator,
        }
    }

    /// Append a provider with lower priority than every stage already added
    pub fn with_stage(mut self, provider: Arc<dyn TranslationProvider>, acceptance: Acceptance) -> Self {
        self.stages.push(Stage {
            provider,
            acceptance,
        });
        self
    }

    /// Append a provider only if it is configured
    pub fn with_optional_stage(self, provider: Option<Arc<dyn TranslationProvider>>, acceptance: Acceptance) -> Self {
        match provider {
            Some(provider) => self.with_stage(provider, acceptance),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.provider.name()).collect()
    }

    /// Translate `text` with the first provider whose result is acceptable.
    ///
    /// Provider errors, empty replies and rejected results all move on to the
    /// next stage. When every stage fails the last failure is reported inside
    /// [`TercumanError::Exhausted`].
    pub async fn first_acceptable(&self, text: &str, source: Language, target: Language) -> Result<String> {
        let mut last_failure = String::from("no providers configured");

        for (idx, stage) in self.stages.iter().enumerate() {
            let name = stage.provider.name();
            debug!("Trying provider {} ({}/{})", name, idx + 1, self.stages.len());

            let failure = match stage.provider.translate(text, source, target).await {
                Ok(Some(candidate)) => match self.accept(stage.acceptance, text, &candidate, target) {
                    Ok(accepted) => {
                        if idx > 0 {
                            info!("Provider {} succeeded after {} fallback(s)", name, idx);
                        }
                        return Ok(accepted);
                    }
                    Err(e) => e,
                },
                Ok(None) => TercumanError::MalformedPayload {
                    provider: name,
                    detail: "no translation in reply".to_string(),
                },
                Err(e) => e,
            };

            warn!("Provider {} failed: {}", name, failure);
            last_failure = format!("{}: {}", name, failure);
        }

        Err(TercumanError::Exhausted {
            attempts: self.stages.len(),
            last: last_failure,
        })
    }

    fn accept(&self, acceptance: Acceptance, source_text: &str, candidate: &str, target: Language) -> Result<String> {
        let candidate = collapse_whitespace(candidate);
        match acceptance {
            Acceptance::NonEmpty => {
                if candidate.is_empty() {
                    Err(TercumanError::Rejected("empty result".to_string()))
                } else {
                    Ok(candidate)
                }
            }
            Acceptance::DiffersFromSource { min_chars } => {
                if candidate.chars().count() < min_chars.max(1) {
                    Err(TercumanError::Rejected(format!(
                        "result shorter than {} chars",
                        min_chars.max(1)
                    )))
                } else if candidate.eq_ignore_ascii_case(source_text.trim()) {
                    Err(TercumanError::Rejected("result identical to source".to_string()))
                } else {
                    Ok(candidate)
                }
            }
            Acceptance::Validated => match self.validator.validate(&candidate, target) {
                ValidationVerdict::Accepted(text) => Ok(text),
                ValidationVerdict::Rejected(reason) => Err(reason.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockTranslationProvider;

    fn validator() -> Arc<Validator> {
        Arc::new(Validator::bundled().unwrap())
    }

    fn replying(name: &'static str, reply: Option<&'static str>) -> Arc<dyn TranslationProvider> {
        let mut mock = MockTranslationProvider::new();
        mock.expect_name().return_const(name);
        mock.expect_translate()
            .times(1)
            .returning(move |_, _, _| Ok(reply.map(str::to_string)));
        Arc::new(mock)
    }

    fn failing(name: &'static str) -> Arc<dyn TranslationProvider> {
        let mut mock = MockTranslationProvider::new();
        mock.expect_name().return_const(name);
        mock.expect_translate().times(1).returning(move |_, _, _| {
            Err(TercumanError::Status {
                provider: name,
                status: 503,
                body: "unavailable".to_string(),
            })
        });
        Arc::new(mock)
    }

    fn untouched(name: &'static str) -> Arc<dyn TranslationProvider> {
        let mut mock = MockTranslationProvider::new();
        mock.expect_name().return_const(name);
        mock.expect_translate().never();
        Arc::new(mock)
    }

    const SOURCE: &str = "The company announced a new partnership.";

    #[tokio::test]
    async fn test_primary_accepted_stops_chain() {
        let chain = ProviderChain::new(validator())
            .with_stage(replying("chat", Some("Şirket yeni bir ortaklık duyurdu.")), Acceptance::Validated)
            .with_stage(untouched("google"), Acceptance::DiffersFromSource { min_chars: 2 });

        let result = chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await;
        assert_eq!(result.unwrap(), "Şirket yeni bir ortaklık duyurdu.");
    }

    #[tokio::test]
    async fn test_validation_rejection_falls_through() {
        let chain = ProviderChain::new(validator())
            .with_stage(replying("chat", Some(SOURCE)), Acceptance::Validated)
            .with_stage(
                replying("google", Some("Şirket yeni ortaklığını açıkladı.")),
                Acceptance::DiffersFromSource { min_chars: 2 },
            );

        let result = chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await;
        assert_eq!(result.unwrap(), "Şirket yeni ortaklığını açıkladı.");
    }

    #[tokio::test]
    async fn test_error_and_empty_reply_fall_through() {
        let chain = ProviderChain::new(validator())
            .with_stage(failing("chat"), Acceptance::Validated)
            .with_stage(replying("google", None), Acceptance::DiffersFromSource { min_chars: 2 })
            .with_stage(
                replying("libretranslate", Some("Şirket ortaklık duyurdu.")),
                Acceptance::DiffersFromSource { min_chars: 2 },
            );

        let result = chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await;
        assert_eq!(result.unwrap(), "Şirket ortaklık duyurdu.");
    }

    #[tokio::test]
    async fn test_echoed_source_is_not_accepted() {
        let chain = ProviderChain::new(validator())
            .with_stage(replying("google", Some(SOURCE)), Acceptance::DiffersFromSource { min_chars: 2 });

        let result = chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await;
        assert!(matches!(result, Err(TercumanError::Exhausted { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_failure() {
        let chain = ProviderChain::new(validator())
            .with_stage(failing("deepl"), Acceptance::NonEmpty)
            .with_stage(failing("google"), Acceptance::DiffersFromSource { min_chars: 2 });

        match chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await {
            Err(TercumanError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(last.starts_with("google"));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let chain = ProviderChain::new(validator());
        assert!(chain.is_empty());

        let result = chain.first_acceptable(SOURCE, Language::English, Language::Turkish).await;
        assert!(matches!(result, Err(TercumanError::Exhausted { attempts: 0, .. })));
    }

    #[test]
    fn test_optional_stage_skips_missing_provider() {
        let chain = ProviderChain::new(validator())
            .with_optional_stage(None, Acceptance::Validated)
            .with_optional_stage(Some(untouched("google")), Acceptance::NonEmpty);
        assert_eq!(chain.provider_names(), vec!["google"]);
    }
}
