//! Heuristic acceptance filter for candidate translations.
//!
//! This is not language identification. Each sentence of a candidate is
//! checked for target-language characters and for English residue, failing
//! sentences are dropped, and the survivors must still look like the target
//! language as a whole. The rule data lives in `rules/*.toml` so it can be
//! extended without touching this code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::chunk::split_sentences;
use crate::error::{Result, TercumanError};
use crate::language::Language;
use crate::normalize::collapse_whitespace;

/// Turkish rule set shipped with the crate
pub const BUNDLED_TURKISH_RULES: &str = include_str!("../rules/tr.toml");

static ALL_CAPS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,}$").unwrap());

/// Versioned validation data for one target language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRules {
    pub version: u32,
    pub language: Language,
    pub diagnostic_chars: String,
    pub forbidden_patterns: Vec<String>,
    pub source_words: Vec<String>,
    pub source_suffix_pattern: String,
    pub indicator_words: Vec<String>,
    pub indicator_suffix_pattern: String,
    pub preserved_terms: Vec<String>,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_source_word_chars: usize,
    /// Highest tolerated share of English-looking words per sentence
    pub max_source_word_ratio: f64,
    /// Lowest share of Turkish-looking words in the accepted text
    pub min_indicator_density: f64,
    pub min_total_chars: usize,
}

impl ValidationRules {
    pub fn bundled() -> Result<Self> {
        Self::from_toml(BUNDLED_TURKISH_RULES)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TercumanError::Rules(format!("Failed to parse rules: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TercumanError::Rules(format!(
                "Failed to read rules file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }
}

/// Why a candidate was turned down
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Empty,
    NoSentencesKept { dropped: usize },
    NoDiagnosticCharacter,
    LowIndicatorDensity { density: f64, required: f64 },
    TooShort { chars: usize, required: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty candidate"),
            Self::NoSentencesKept { dropped } => {
                write!(f, "all {} sentence(s) looked untranslated", dropped)
            }
            Self::NoDiagnosticCharacter => write!(f, "no target-language characters"),
            Self::LowIndicatorDensity { density, required } => write!(
                f,
                "target-language density {:.0}% below {:.0}%",
                density * 100.0,
                required * 100.0
            ),
            Self::TooShort { chars, required } => {
                write!(f, "{} chars is shorter than {}", chars, required)
            }
        }
    }
}

impl From<RejectReason> for TercumanError {
    fn from(reason: RejectReason) -> Self {
        TercumanError::Rejected(reason.to_string())
    }
}

/// Accept/reject decision, computed fresh for every candidate
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationVerdict {
    /// Candidate with suspect sentences removed
    Accepted(String),
    Rejected(RejectReason),
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Accepted(text) => Ok(text),
            Self::Rejected(reason) => Err(reason.into()),
        }
    }
}

/// Compiled form of [`ValidationRules`]
#[derive(Debug)]
pub struct Validator {
    language: Language,
    version: u32,
    diagnostic_chars: HashSet<char>,
    forbidden: Vec<Regex>,
    source_words: HashSet<String>,
    source_suffix: Regex,
    indicator_words: HashSet<String>,
    indicator_suffix: Regex,
    preserved: HashSet<String>,
    preserved_terms: Vec<String>,
    thresholds: Thresholds,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Result<Self> {
        let forbidden = rules
            .forbidden_patterns
            .iter()
            .map(|p| compile(p.as_str()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            language: rules.language,
            version: rules.version,
            diagnostic_chars: rules.diagnostic_chars.chars().collect(),
            forbidden,
            source_words: lowercase_set(&rules.source_words),
            source_suffix: compile(rules.source_suffix_pattern.as_str())?,
            indicator_words: lowercase_set(&rules.indicator_words),
            indicator_suffix: compile(rules.indicator_suffix_pattern.as_str())?,
            preserved: lowercase_set(&rules.preserved_terms),
            preserved_terms: rules.preserved_terms,
            thresholds: rules.thresholds,
        })
    }

    /// Validator over the bundled Turkish rules
    pub fn bundled() -> Result<Self> {
        Self::new(ValidationRules::bundled()?)
    }

    /// Rules from `path` when given, else the bundled set
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let rules = match path {
            Some(path) => ValidationRules::from_file(path)?,
            None => ValidationRules::bundled()?,
        };
        info!(
            "Loaded {} validation rules v{} ({} patterns, {} preserved terms)",
            rules.language.name(),
            rules.version,
            rules.forbidden_patterns.len(),
            rules.preserved_terms.len()
        );
        Self::new(rules)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Domain terms that must stay verbatim in translations
    pub fn preserved_terms(&self) -> &[String] {
        &self.preserved_terms
    }

    /// Judge a candidate translation into `target`.
    ///
    /// Targets this rule set does not cover are accepted whenever non-empty.
    pub fn validate(&self, candidate: &str, target: Language) -> ValidationVerdict {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return ValidationVerdict::Rejected(RejectReason::Empty);
        }

        if target != self.language {
            return ValidationVerdict::Accepted(collapse_whitespace(candidate));
        }

        let sentences = split_sentences(candidate);
        let total = sentences.len();
        let kept: Vec<&str> = sentences
            .into_iter()
            .filter(|sentence| {
                let passes = self.sentence_passes(sentence);
                if !passes {
                    debug!("Dropping untranslated sentence: {}", sentence);
                }
                passes
            })
            .collect();

        if kept.is_empty() {
            return ValidationVerdict::Rejected(RejectReason::NoSentencesKept { dropped: total });
        }

        let text = collapse_whitespace(&kept.join(" "));

        if !self.has_diagnostic_char(&text) {
            return ValidationVerdict::Rejected(RejectReason::NoDiagnosticCharacter);
        }

        let density = self.indicator_density(&text);
        if density < self.thresholds.min_indicator_density {
            return ValidationVerdict::Rejected(RejectReason::LowIndicatorDensity {
                density,
                required: self.thresholds.min_indicator_density,
            });
        }

        let chars = text.chars().count();
        if chars < self.thresholds.min_total_chars {
            return ValidationVerdict::Rejected(RejectReason::TooShort {
                chars,
                required: self.thresholds.min_total_chars,
            });
        }

        if kept.len() < total {
            debug!(
                "Accepted candidate after dropping {}/{} sentence(s) (rules v{})",
                total - kept.len(),
                total,
                self.version
            );
        }

        ValidationVerdict::Accepted(text)
    }

    /// Keep a sentence only if it has a diagnostic character, matches no
    /// forbidden pattern and has few English-looking words
    pub fn sentence_passes(&self, sentence: &str) -> bool {
        if !self.has_diagnostic_char(sentence) {
            return false;
        }

        if self.forbidden.iter().any(|re| re.is_match(sentence)) {
            return false;
        }

        self.source_word_ratio(sentence) < self.thresholds.max_source_word_ratio
    }

    pub fn has_diagnostic_char(&self, text: &str) -> bool {
        text.chars().any(|c| self.diagnostic_chars.contains(&c))
    }

    /// Share of whitespace tokens that look like untranslated English words
    pub fn source_word_ratio(&self, sentence: &str) -> f64 {
        let words: Vec<&str> = words(sentence).collect();
        if words.is_empty() {
            return 0.0;
        }

        let flagged = words.iter().filter(|w| self.is_source_word(w)).count();
        flagged as f64 / words.len() as f64
    }

    /// Share of alphabetic tokens that look like the target language
    pub fn indicator_density(&self, text: &str) -> f64 {
        let words: Vec<&str> = words(text)
            .filter(|w| w.chars().any(char::is_alphabetic))
            .collect();
        if words.is_empty() {
            return 0.0;
        }

        let indicators = words.iter().filter(|w| self.is_indicator_word(w)).count();
        indicators as f64 / words.len() as f64
    }

    fn is_source_word(&self, word: &str) -> bool {
        if word.chars().count() < self.thresholds.min_source_word_chars {
            return false;
        }
        if !word.chars().all(|c| c.is_ascii_alphabetic()) {
            return false;
        }
        // Tickers and acronyms
        if ALL_CAPS_RE.is_match(word) {
            return false;
        }
        if self.is_preserved(word) {
            return false;
        }

        let lower = word.to_lowercase();
        self.source_words.contains(&lower) || self.source_suffix.is_match(&lower)
    }

    fn is_indicator_word(&self, word: &str) -> bool {
        if self.has_diagnostic_char(word) {
            return true;
        }
        let lower = word.to_lowercase();
        if self.indicator_words.contains(&lower) {
            return true;
        }
        lower.chars().count() >= 3 && self.indicator_suffix.is_match(&lower)
    }

    /// Preserved terms match case-insensitively, also with a Turkish case suffix ("Bitcoin'in")
    fn is_preserved(&self, word: &str) -> bool {
        let base = word.split(['\'', '’']).next().unwrap_or(word);
        self.preserved.contains(&base.to_lowercase())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| TercumanError::Rules(format!("Invalid pattern '{}': {}", pattern, e)))
}

fn lowercase_set(words: &[String]) -> HashSet<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Whitespace tokens with surrounding punctuation removed
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
}
