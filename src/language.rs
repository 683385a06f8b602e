use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TercumanError;

/// Language tags the pipeline can translate between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// ISO 639-1 code, as used by Google and LibreTranslate
    pub fn code(&self) -> &'static str {
        match self {
            Self::Turkish => "tr",
            Self::English => "en",
        }
    }

    /// DeepL expects upper-case language codes
    pub fn deepl_code(&self) -> &'static str {
        match self {
            Self::Turkish => "TR",
            Self::English => "EN",
        }
    }

    /// Full language name for clearer prompts
    pub fn name(&self) -> &'static str {
        match self {
            Self::Turkish => "Turkish",
            Self::English => "English",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = TercumanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tr" | "turkish" => Ok(Self::Turkish),
            "en" | "english" => Ok(Self::English),
            other => Err(TercumanError::InvalidLanguage(format!(
                "'{}'. Valid languages: tr, en",
                other
            ))),
        }
    }
}
