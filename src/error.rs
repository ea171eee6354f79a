//! Error types for the review pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Provider API error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Record missing required field: {0}")]
    MissingField(&'static str),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("No decodable JSON in backend response")]
    NoJsonPayload,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
