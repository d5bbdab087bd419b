//! Whole-document enrichment capabilities: correction, summarization, lemmatization.

pub mod corrector;
pub mod lemmatizer;
pub mod summarizer;

pub use corrector::GrammarCorrector;
pub use lemmatizer::{ArabicLemmatizer, Lemmatizer, lemma_form};
pub use summarizer::Summarizer;
