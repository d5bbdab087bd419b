//! Builds the concrete capabilities named by the configuration.
//!
//! This is the only place that knows which vendor implements which
//! capability; the job and the stages only see trait objects.

use crate::config::{Backend, Config};
use crate::error::{Result, ScribeError};
use crate::nlp::{ArabicLemmatizer, Lemmatizer};
use crate::pipeline::post_processor::StageCapabilities;
use crate::stt::{
    NlpCloudClient, OpenAiClient, Transcriber, TranskriptorClient, WhisperTranscriber,
};
use std::sync::Arc;

/// Everything a job needs from the outside world.
#[derive(Clone)]
pub struct Capabilities {
    pub transcriber: Arc<dyn Transcriber>,
    pub stages: StageCapabilities,
}

/// Read a credential from the environment variable named by the config.
pub fn credential(variable: &str) -> Result<String> {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ScribeError::MissingCredential {
            variable: variable.to_string(),
        }),
    }
}

/// Construct the transcriber and enrichment capabilities for `config`.
///
/// Cloud clients are created once and shared by every capability they
/// provide. A missing credential is reported here, before any job starts.
pub fn build_capabilities(config: &Config) -> Result<Capabilities> {
    let lemmatizer: Option<Arc<dyn Lemmatizer>> = Some(Arc::new(ArabicLemmatizer::new()));

    let capabilities = match config.backend()? {
        Backend::NlpCloud => {
            let token = credential(&config.nlpcloud.token_env)?;
            let client = Arc::new(NlpCloudClient::new(config.nlpcloud_config(), &token)?);
            Capabilities {
                transcriber: client.clone(),
                stages: StageCapabilities {
                    corrector: Some(client.clone()),
                    summarizer: Some(client),
                    lemmatizer,
                },
            }
        }
        Backend::OpenAi => {
            let api_key = credential(&config.openai.api_key_env)?;
            let client = Arc::new(OpenAiClient::new(config.openai_config(), &api_key)?);
            Capabilities {
                transcriber: client.clone(),
                stages: StageCapabilities {
                    corrector: Some(client.clone()),
                    summarizer: Some(client),
                    lemmatizer,
                },
            }
        }
        Backend::Transkriptor => {
            let token = credential(&config.transkriptor.token_env)?;
            Capabilities {
                transcriber: Arc::new(TranskriptorClient::new(
                    config.transkriptor_config(),
                    &token,
                )?),
                stages: StageCapabilities {
                    corrector: None,
                    summarizer: None,
                    lemmatizer,
                },
            }
        }
        Backend::Whisper => Capabilities {
            transcriber: Arc::new(WhisperTranscriber::new(config.whisper_config())?),
            stages: StageCapabilities {
                corrector: None,
                summarizer: None,
                lemmatizer,
            },
        },
    };

    log::info!(
        "Using '{}' backend for transcription",
        capabilities.transcriber.name()
    );
    Ok(capabilities)
}
