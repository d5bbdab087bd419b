use crate::error::{Result, ScribeError};
use std::sync::Arc;

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (cloud ASR, local Whisper, mock).
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio segment to text.
    ///
    /// # Arguments
    /// * `audio_wav` - A complete WAV file holding the segment
    /// * `language` - Language code (e.g. "ar", "en") or "auto"
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String>;

    /// Name of the backend, for logs.
    fn name(&self) -> &str;
}

/// Implement Transcriber for Arc<T> to allow sharing across workers.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
        (**self).transcribe(audio_wav, language)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock transcriber for testing
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    name: String,
    response: String,
    should_fail: bool,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio_wav: &[u8], _language: &str) -> Result<String> {
        if self.should_fail {
            Err(ScribeError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
