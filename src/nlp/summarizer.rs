//! Summarization capability.

use crate::error::{Result, ScribeError};
use std::sync::Arc;

pub trait Summarizer: Send + Sync {
    /// Produce a summary of the whole transcript.
    fn summarize(&self, text: &str) -> Result<String>;

    fn name(&self) -> &str;
}

impl<T: Summarizer + ?Sized> Summarizer for Arc<T> {
    fn summarize(&self, text: &str) -> Result<String> {
        (**self).summarize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Scripted summarizer for tests.
#[derive(Debug, Clone)]
pub struct MockSummarizer {
    response: String,
    should_fail: bool,
}

impl MockSummarizer {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Summarizer for MockSummarizer {
    fn summarize(&self, _text: &str) -> Result<String> {
        if self.should_fail {
            Err(ScribeError::Summarization {
                message: "mock summarization failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
