//! Grammar-correction capability.

use crate::error::{Result, ScribeError};
use std::sync::Arc;

/// Rewrites a whole transcript with spelling and grammar fixed.
///
/// Implementations are shared between the CLI and the job thread, so they
/// take `&self` and must be `Send + Sync`.
pub trait GrammarCorrector: Send + Sync {
    fn correct(&self, text: &str) -> Result<String>;

    /// Return the name of this corrector for logging.
    fn name(&self) -> &str;
}

impl<T: GrammarCorrector + ?Sized> GrammarCorrector for Arc<T> {
    fn correct(&self, text: &str) -> Result<String> {
        (**self).correct(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Scripted corrector for tests.
#[derive(Debug, Clone, Default)]
pub struct MockCorrector {
    response: Option<String>,
    should_fail: bool,
}

impl MockCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `response` instead of echoing the input.
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl GrammarCorrector for MockCorrector {
    fn correct(&self, text: &str) -> Result<String> {
        if self.should_fail {
            return Err(ScribeError::Correction {
                message: "mock correction failure".to_string(),
            });
        }
        Ok(self.response.clone().unwrap_or_else(|| text.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_echoes_by_default() {
        assert_eq!(MockCorrector::new().correct("abc").unwrap(), "abc");
    }

    #[test]
    fn mock_scripted_response_and_failure() {
        let mock = MockCorrector::new().with_response("fixed");
        assert_eq!(mock.correct("broken").unwrap(), "fixed");

        let failing = MockCorrector::new().with_failure();
        assert!(matches!(
            failing.correct("x"),
            Err(ScribeError::Correction { .. })
        ));
    }

    #[test]
    fn arc_delegates() {
        let shared: Arc<dyn GrammarCorrector> = Arc::new(MockCorrector::new());
        assert_eq!(shared.name(), "mock");
        assert_eq!(shared.correct("نص").unwrap(), "نص");
    }
}
