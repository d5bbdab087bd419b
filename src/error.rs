//! Error types for chunkscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing credential: environment variable {variable} is not set")]
    MissingCredential { variable: String },

    // Audio errors
    #[error("Audio decode failed: {message}")]
    AudioDecode { message: String },

    #[error("Audio encode failed: {message}")]
    AudioEncode { message: String },

    // Capability errors
    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Grammar correction failed: {message}")]
    Correction { message: String },

    #[error("Summarization failed: {message}")]
    Summarization { message: String },

    #[error("Lemmatization failed: {message}")]
    Lemmatization { message: String },

    #[error("{service} request failed: {message}")]
    Http { service: String, message: String },

    // Job errors
    #[error(transparent)]
    Job(#[from] crate::pipeline::JobError),

    #[error("Transcription cancelled")]
    Cancelled,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScribeError>;
