//! NLP Cloud backend: speech recognition, grammar correction and summarization.
//!
//! Every task is a JSON `POST` to `{base_url}[/gpu]/{model}/{task}` with an
//! `Authorization: Token <token>` header. Audio is sent inline as base64.

use crate::defaults;
use crate::error::Result;
use crate::nlp::{GrammarCorrector, Summarizer};
use crate::stt::http;
use crate::stt::transcriber::Transcriber;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "nlpcloud";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlpCloudConfig {
    pub base_url: String,
    /// Model used for the `asr` task.
    pub asr_model: String,
    /// Model used for `gs-correction` and `summarization`.
    pub llm_model: String,
    pub gpu: bool,
    pub timeout_secs: u64,
}

impl Default for NlpCloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nlpcloud.io/v1".to_string(),
            asr_model: "whisper".to_string(),
            llm_model: "finetuned-llama-3-70b".to_string(),
            gpu: true,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl NlpCloudConfig {
    fn endpoint(&self, model: &str, task: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.gpu {
            format!("{}/gpu/{}/{}", base, model, task)
        } else {
            format!("{}/{}/{}", base, model, task)
        }
    }
}

#[derive(Debug, Serialize)]
struct AsrRequest {
    encoded_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AsrResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CorrectionResponse {
    correction: String,
}

#[derive(Debug, Deserialize)]
struct SummarizationResponse {
    summary_text: String,
}

fn asr_request(audio_wav: &[u8], language: &str) -> AsrRequest {
    let input_language = (!language.is_empty() && language != defaults::AUTO_LANGUAGE)
        .then(|| language.to_string());
    AsrRequest {
        encoded_file: STANDARD.encode(audio_wav),
        input_language,
    }
}

pub struct NlpCloudClient {
    config: NlpCloudConfig,
    http: Client,
}

impl NlpCloudClient {
    pub fn new(config: NlpCloudConfig, token: &str) -> Result<Self> {
        let headers = http::auth_headers(SERVICE, "Token", token)?;
        let http = http::build_client(SERVICE, headers, config.timeout_secs)?;
        Ok(Self { config, http })
    }

    fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model: &str,
        task: &str,
        body: &Req,
    ) -> Result<Resp> {
        let url = self.config.endpoint(model, task);
        log::debug!("POST {}", url);
        let response = http::check(SERVICE, self.http.post(&url).json(body).send())?;
        http::read_json(SERVICE, response)
    }
}

impl Transcriber for NlpCloudClient {
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
        let request = asr_request(audio_wav, language);
        let response: AsrResponse = self.post(&self.config.asr_model, "asr", &request)?;
        Ok(response.text.trim().to_string())
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

impl GrammarCorrector for NlpCloudClient {
    fn correct(&self, text: &str) -> Result<String> {
        let response: CorrectionResponse =
            self.post(&self.config.llm_model, "gs-correction", &TextRequest { text })?;
        Ok(response.correction)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

impl Summarizer for NlpCloudClient {
    fn summarize(&self, text: &str) -> Result<String> {
        let response: SummarizationResponse =
            self.post(&self.config.llm_model, "summarization", &TextRequest { text })?;
        Ok(response.summary_text)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
