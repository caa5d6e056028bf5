use thiserror::Error;

#[derive(Error, Debug)]
pub enum DoraLensError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Rate limit exhausted after {attempts} attempts: {url}")]
    RateLimited { url: String, attempts: u32 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DoraLensError>;
