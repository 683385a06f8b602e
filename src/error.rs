use thiserror::Error;

#[derive(Error, Debug)]
pub enum TercumanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} responded with {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a malformed payload: {detail}")]
    MalformedPayload {
        provider: &'static str,
        detail: String,
    },

    #[error("Translation rejected: {0}")]
    Rejected(String),

    #[error("No credential configured for {0}")]
    MissingCredential(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported language: {0}")]
    InvalidLanguage(String),

    #[error("Validation rules error: {0}")]
    Rules(String),

    #[error("All providers failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: usize, last: String },
}

pub type Result<T> = std::result::Result<T, TercumanError>;
