//! Lemmatization capability and a local Arabic light lemmatizer.
//!
//! [`ArabicLemmatizer`] does not perform full morphological analysis. It
//! tokenizes the text, normalises every token the way Arabic lemma output is
//! usually normalised (diacritics, tatweel and hamza-carrying alef forms
//! removed) and strips the definite article with its attached proclitics.
//! That is enough for vocabulary detection, which only compares normalised
//! forms.

use crate::error::{Result, ScribeError};
use std::sync::Arc;

pub trait Lemmatizer: Send + Sync {
    /// Return one lemma per token, in text order.
    fn lemmatize(&self, text: &str) -> Result<Vec<String>>;

    fn name(&self) -> &str;
}

impl<T: Lemmatizer + ?Sized> Lemmatizer for Arc<T> {
    fn lemmatize(&self, text: &str) -> Result<Vec<String>> {
        (**self).lemmatize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

const TATWEEL: char = '\u{0640}';

/// Harakat, tanween, shaddah, sukun and superscript alef.
fn is_diacritic(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Quranic annotation marks.
fn is_small_diacritic(ch: char) -> bool {
    matches!(ch, '\u{0610}'..='\u{061A}' | '\u{06D6}'..='\u{06ED}')
}

/// Strip diacritics and tatweel and unify alef variants.
pub fn normalize_arabic(token: &str) -> String {
    token
        .chars()
        .filter(|&ch| ch != TATWEEL && !is_diacritic(ch) && !is_small_diacritic(ch))
        .map(|ch| match ch {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            other => other,
        })
        .collect()
}

/// Definite-article prefixes, longest first.
const ARTICLE_PREFIXES: [&str; 6] = ["وال", "بال", "كال", "فال", "لل", "ال"];

/// Shortest stem left behind after removing a prefix.
const MIN_STEM_CHARS: usize = 2;

fn strip_article(token: &str) -> &str {
    for prefix in ARTICLE_PREFIXES {
        if let Some(rest) = token.strip_prefix(prefix)
            && rest.chars().count() >= MIN_STEM_CHARS
        {
            return rest;
        }
    }
    token
}

/// Reduce one word to the form [`ArabicLemmatizer`] produces for it.
pub fn lemma_form(word: &str) -> String {
    strip_article(&normalize_arabic(word.trim())).to_string()
}

fn is_token_char(ch: char) -> bool {
    ch.is_alphanumeric() || is_diacritic(ch) || is_small_diacritic(ch) || ch == TATWEEL
}

/// Local rule-based lemmatizer for Arabic text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArabicLemmatizer;

impl ArabicLemmatizer {
    pub fn new() -> Self {
        Self
    }
}

impl Lemmatizer for ArabicLemmatizer {
    fn lemmatize(&self, text: &str) -> Result<Vec<String>> {
        let lemmas = text
            .split(|ch: char| !is_token_char(ch))
            .filter(|token| !token.is_empty())
            .map(lemma_form)
            .filter(|lemma| !lemma.is_empty())
            .collect();
        Ok(lemmas)
    }

    fn name(&self) -> &str {
        "arabic-light"
    }
}

/// Scripted lemmatizer for tests.
#[derive(Debug, Clone, Default)]
pub struct MockLemmatizer {
    lemmas: Vec<String>,
    should_fail: bool,
}

impl MockLemmatizer {
    pub fn new(lemmas: &[&str]) -> Self {
        Self {
            lemmas: lemmas.iter().map(|s| s.to_string()).collect(),
            should_fail: false,
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Lemmatizer for MockLemmatizer {
    fn lemmatize(&self, _text: &str) -> Result<Vec<String>> {
        if self.should_fail {
            return Err(ScribeError::Lemmatization {
                message: "mock lemmatization failure".to_string(),
            });
        }
        Ok(self.lemmas.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
