//! OpenAI-compatible backend.
//!
//! Transcription uses the multipart `/audio/transcriptions` endpoint; grammar
//! correction and summarization use `/chat/completions` with a fixed
//! instruction. Any server implementing those two routes works (OpenAI, Groq,
//! a local whisper server), selected by `base_url`.

use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::nlp::{GrammarCorrector, Summarizer};
use crate::stt::http;
use crate::stt::transcriber::Transcriber;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "openai";

const CORRECTION_PROMPT: &str = "Correct the spelling and grammar of the following transcript. \
Keep its language and meaning. Reply with the corrected text only.";

const SUMMARY_PROMPT: &str = "Summarize the following transcript in its own language. \
Reply with the summary only.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub base_url: String,
    /// Model for `/audio/transcriptions`.
    pub model: String,
    /// Model for `/chat/completions`.
    pub chat_model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "whisper-1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl OpenAiConfig {
    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

fn chat_request<'a>(
    model: &'a str,
    instruction: &'a str,
    text: &'a str,
) -> ChatCompletionRequest<'a> {
    ChatCompletionRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: instruction,
            },
            ChatMessage {
                role: "user",
                content: text,
            },
        ],
        temperature: 0.0,
    }
}

/// First choice's content, or an error if the model returned nothing.
fn completion_text(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ScribeError::Http {
            service: SERVICE.to_string(),
            message: "completion returned no content".to_string(),
        })
}

/// Whisper-style language code, or `None` to let the server detect it.
fn transcription_language(language: &str) -> Option<&str> {
    match language {
        "" | defaults::AUTO_LANGUAGE => None,
        "zh-Hans" | "zh-Hant" => Some("zh"),
        other => Some(other),
    }
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    http: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, api_key: &str) -> Result<Self> {
        let headers = http::auth_headers(SERVICE, "Bearer", api_key)?;
        let http = http::build_client(SERVICE, headers, config.timeout_secs)?;
        Ok(Self { config, http })
    }

    fn chat(&self, instruction: &str, text: &str) -> Result<String> {
        let url = self.config.url("chat/completions");
        log::debug!("POST {} (model {})", url, self.config.chat_model);
        let request = chat_request(&self.config.chat_model, instruction, text);
        let response = http::check(SERVICE, self.http.post(&url).json(&request).send())?;
        completion_text(http::read_json(SERVICE, response)?)
    }
}

impl Transcriber for OpenAiClient {
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
        let audio_part = Part::bytes(audio_wav.to_vec())
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| ScribeError::Http {
                service: SERVICE.to_string(),
                message: format!("Failed to create audio part: {}", e),
            })?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.config.model.clone())
            .text("response_format", "text")
            .text("temperature", "0");
        if let Some(code) = transcription_language(language) {
            form = form.text("language", code.to_string());
        }

        let url = self.config.url("audio/transcriptions");
        log::debug!("POST {} ({} bytes)", url, audio_wav.len());
        let response = http::check(SERVICE, self.http.post(&url).multipart(form).send())?;
        let text = response.text().map_err(|e| ScribeError::Http {
            service: SERVICE.to_string(),
            message: format!("Failed to read transcription response: {}", e),
        })?;
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

impl GrammarCorrector for OpenAiClient {
    fn correct(&self, text: &str) -> Result<String> {
        self.chat(CORRECTION_PROMPT, text)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

impl Summarizer for OpenAiClient {
    fn summarize(&self, text: &str) -> Result<String> {
        self.chat(SUMMARY_PROMPT, text)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
