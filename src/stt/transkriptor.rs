//! Transkriptor backend: asynchronous order-based transcription.
//!
//! A segment goes through four requests:
//! 1. `POST transcription/local_file/get_upload_url` for a presigned upload URL
//! 2. `PUT` of the WAV bytes to that URL (no API credentials attached)
//! 3. `POST transcription/local_file/initiate_transcription`, which returns an order id
//! 4. `GET files/{order_id}/content`, repeated until the order leaves `Processing`
//!
//! Polling is bounded by `poll_timeout_secs`. Transkriptor only does
//! transcription, so this backend provides no correction or summary.

use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::stt::http;
use crate::stt::transcriber::Transcriber;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

const SERVICE: &str = "transkriptor";

const STATUS_PROCESSING: &str = "Processing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranskriptorConfig {
    pub base_url: String,
    /// Transcription tier, `Standard` unless the account has others.
    pub service: String,
    /// Locale sent with each order (`ar-SA`, `en-US`). Empty uses the job language.
    pub locale: String,
    pub poll_interval_secs: u64,
    /// Longest wait for one order to leave `Processing`.
    pub poll_timeout_secs: u64,
    pub timeout_secs: u64,
}

impl Default for TranskriptorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tor.app/developer".to_string(),
            service: "Standard".to_string(),
            locale: String::new(),
            poll_interval_secs: 5,
            poll_timeout_secs: 600,
            timeout_secs: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

impl TranskriptorConfig {
    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route)
    }

    fn order_url(&self, order_id: &str) -> String {
        self.url(&format!("files/{}/content", order_id))
    }

    /// Locale for an order: the configured one, else the job language.
    fn locale<'a>(&'a self, language: &'a str) -> Option<&'a str> {
        if !self.locale.is_empty() {
            return Some(self.locale.as_str());
        }
        match language {
            "" | defaults::AUTO_LANGUAGE => None,
            other => Some(other),
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadUrlRequest<'a> {
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    upload_url: String,
    public_url: String,
}

#[derive(Debug, Serialize)]
struct InitiateRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    service: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    body: OrderBody,
}

#[derive(Debug, Deserialize)]
struct OrderBody {
    status: String,
    #[serde(default)]
    content: Vec<OrderSentence>,
}

#[derive(Debug, Deserialize)]
struct OrderSentence {
    #[serde(default)]
    text: String,
}

/// Where an order stands after one status request.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderStatus {
    Processing,
    Done(String),
    Failed(String),
}

fn order_status(response: OrderResponse) -> OrderStatus {
    let OrderBody { status, content } = response.body;
    if status == STATUS_PROCESSING {
        return OrderStatus::Processing;
    }
    if content.is_empty() && !status.eq_ignore_ascii_case("completed") {
        return OrderStatus::Failed(status);
    }
    let text = content
        .iter()
        .map(|sentence| sentence.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    OrderStatus::Done(text)
}

/// Call `fetch` every `interval` until the order is no longer processing.
fn wait_for_order(
    order_id: &str,
    interval: Duration,
    timeout: Duration,
    mut fetch: impl FnMut() -> Result<OrderStatus>,
) -> Result<String> {
    let started = Instant::now();
    loop {
        match fetch()? {
            OrderStatus::Done(text) => return Ok(text),
            OrderStatus::Failed(status) => {
                return Err(ScribeError::Transcription {
                    message: format!(
                        "Transkriptor order {} ended with status '{}'",
                        order_id, status
                    ),
                });
            }
            OrderStatus::Processing => {}
        }
        if started.elapsed() + interval > timeout {
            return Err(ScribeError::Transcription {
                message: format!(
                    "Transkriptor order {} still processing after {}s",
                    order_id,
                    started.elapsed().as_secs()
                ),
            });
        }
        log::trace!("Order {} still processing", order_id);
        thread::sleep(interval);
    }
}

pub struct TranskriptorClient {
    config: TranskriptorConfig,
    /// Sends the bearer token; used for every API route.
    api: Client,
    /// Credential-free client for the presigned upload URL.
    upload: Client,
}

impl TranskriptorClient {
    pub fn new(config: TranskriptorConfig, token: &str) -> Result<Self> {
        let headers = http::auth_headers(SERVICE, "Bearer", token)?;
        let api = http::build_client(SERVICE, headers, config.timeout_secs)?;
        let upload = http::build_client(SERVICE, HeaderMap::new(), config.timeout_secs)?;
        Ok(Self {
            config,
            api,
            upload,
        })
    }

    fn upload_segment(&self, audio_wav: &[u8]) -> Result<String> {
        let url = self.config.url("transcription/local_file/get_upload_url");
        log::debug!("POST {}", url);
        let request = UploadUrlRequest {
            file_name: "segment.wav",
        };
        let response = http::check(SERVICE, self.api.post(&url).json(&request).send())?;
        let target: UploadUrlResponse = http::read_json(SERVICE, response)?;

        log::debug!("PUT presigned upload ({} bytes)", audio_wav.len());
        http::check(
            SERVICE,
            self.upload
                .put(&target.upload_url)
                .header(CONTENT_TYPE, "audio/wav")
                .body(audio_wav.to_vec())
                .send(),
        )?;
        Ok(target.public_url)
    }

    fn initiate(&self, public_url: &str, language: &str) -> Result<String> {
        let url = self.config.url("transcription/local_file/initiate_transcription");
        let request = InitiateRequest {
            url: public_url,
            language: self.config.locale(language),
            service: &self.config.service,
        };
        log::debug!("POST {}", url);
        let response = http::check(SERVICE, self.api.post(&url).json(&request).send())?;
        let order: InitiateResponse = http::read_json(SERVICE, response)?;
        Ok(order.order_id)
    }

    fn fetch_order(&self, order_id: &str) -> Result<OrderStatus> {
        let response = http::check(SERVICE, self.api.get(self.config.order_url(order_id)).send())?;
        Ok(order_status(http::read_json(SERVICE, response)?))
    }
}

impl Transcriber for TranskriptorClient {
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
        let public_url = self.upload_segment(audio_wav)?;
        let order_id = self.initiate(&public_url, language)?;
        log::debug!("Transkriptor order {} created", order_id);

        wait_for_order(
            &order_id,
            Duration::from_secs(self.config.poll_interval_secs),
            Duration::from_secs(self.config.poll_timeout_secs),
            || self.fetch_order(&order_id),
        )
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_order(body: &str) -> OrderStatus {
        order_status(http::parse_json(SERVICE, body).unwrap())
    }

    #[test]
    fn test_urls() {
        let config = TranskriptorConfig {
            base_url: "http://localhost:9000/developer/".to_string(),
            ..TranskriptorConfig::default()
        };
        assert_eq!(
            config.url("transcription/local_file/get_upload_url"),
            "http://localhost:9000/developer/transcription/local_file/get_upload_url"
        );
        assert_eq!(
            config.order_url("abc-123"),
            "http://localhost:9000/developer/files/abc-123/content"
        );
    }

    #[test]
    fn test_initiate_request_shape() {
        let config = TranskriptorConfig::default();
        let request = InitiateRequest {
            url: "https://files.example/seg.wav",
            language: config.locale("ar"),
            service: &config.service,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["url"], "https://files.example/seg.wav");
        assert_eq!(json["language"], "ar");
        assert_eq!(json["service"], "Standard");
    }

    #[test]
    fn test_locale_override_and_auto() {
        let config = TranskriptorConfig {
            locale: "ar-SA".to_string(),
            ..TranskriptorConfig::default()
        };
        assert_eq!(config.locale("ar"), Some("ar-SA"));
        assert_eq!(TranskriptorConfig::default().locale("auto"), None);

        let json = serde_json::to_value(InitiateRequest {
            url: "u",
            language: None,
            service: "Standard",
        })
        .unwrap();
        assert!(json.get("language").is_none());
    }

    #[test]
    fn test_parse_upload_and_order_id() {
        let upload: UploadUrlResponse = http::parse_json(
            SERVICE,
            r#"{"upload_url":"https://s3/put?sig=1","public_url":"https://s3/seg.wav"}"#,
        )
        .unwrap();
        let order: InitiateResponse =
            http::parse_json(SERVICE, r#"{"message":"started","order_id":"o-42"}"#).unwrap();

        assert_eq!(upload.upload_url, "https://s3/put?sig=1");
        assert_eq!(upload.public_url, "https://s3/seg.wav");
        assert_eq!(order.order_id, "o-42");
    }

    #[test]
    fn test_processing_status() {
        assert_eq!(
            parse_order(r#"{"statusCode":200,"body":{"status":"Processing"}}"#),
            OrderStatus::Processing
        );
    }

    #[test]
    fn test_completed_order_joins_sentences() {
        let body = r#"{"body":{"status":"Completed","content":[
            {"text":" ذهب الطالب ","start":0,"end":1200,"speaker":"SPK_1"},
            {"text":""},
            {"text":"إلى المدرسة"}]}}"#;
        assert_eq!(
            parse_order(body),
            OrderStatus::Done("ذهب الطالب إلى المدرسة".to_string())
        );
    }

    #[test]
    fn test_completed_without_speech_is_empty_text() {
        assert_eq!(
            parse_order(r#"{"body":{"status":"Completed","content":[]}}"#),
            OrderStatus::Done(String::new())
        );
    }

    #[test]
    fn test_other_status_without_content_fails() {
        assert_eq!(
            parse_order(r#"{"body":{"status":"Failed"}}"#),
            OrderStatus::Failed("Failed".to_string())
        );
    }

    #[test]
    fn test_wait_polls_until_done() {
        let mut answers = vec![
            OrderStatus::Processing,
            OrderStatus::Processing,
            OrderStatus::Done("نص".to_string()),
        ]
        .into_iter();
        let mut calls = 0;

        let text = wait_for_order("o-1", Duration::ZERO, Duration::from_secs(5), || {
            calls += 1;
            Ok(answers.next().unwrap())
        })
        .unwrap();

        assert_eq!(text, "نص");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_wait_gives_up_after_timeout() {
        let mut calls = 0;
        let result = wait_for_order(
            "o-2",
            Duration::from_millis(10),
            Duration::from_millis(35),
            || {
                calls += 1;
                Ok(OrderStatus::Processing)
            },
        );

        match result {
            Err(ScribeError::Transcription { message }) => {
                assert!(message.contains("o-2"));
                assert!(message.contains("still processing"));
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
        assert!((1..=4).contains(&calls), "{} polls", calls);
    }

    #[test]
    fn test_wait_reports_failed_order_and_fetch_errors() {
        let failed = wait_for_order("o-3", Duration::ZERO, Duration::from_secs(1), || {
            Ok(OrderStatus::Failed("Error".to_string()))
        });
        assert!(failed.unwrap_err().to_string().contains("'Error'"));

        let http_error = wait_for_order("o-4", Duration::ZERO, Duration::from_secs(1), || {
            Err(ScribeError::Http {
                service: SERVICE.to_string(),
                message: "status 404 Not Found".to_string(),
            })
        });
        assert!(matches!(http_error, Err(ScribeError::Http { .. })));
    }

    #[test]
    fn test_client_name() {
        let client = TranskriptorClient::new(TranskriptorConfig::default(), "tok").unwrap();
        assert_eq!(client.name(), "transkriptor");
    }
}
