use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("http {status} from {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("list service returned code {0}")]
    ListServiceCode(u16),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
