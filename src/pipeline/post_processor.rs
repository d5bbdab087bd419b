//! Whole-document enrichment stages run after transcription.
//!
//! Each stage reads the document built so far and returns a [`StageOutput`]
//! naming the single field it produces. The chain applies outputs in order;
//! a failing stage leaves its field unset and the remaining stages still run.

use crate::error::{Result, ScribeError};
use crate::nlp::{GrammarCorrector, Lemmatizer, Summarizer, lemma_form};
use crate::pipeline::accumulator::strip_placeholders;
use crate::pipeline::types::TranscriptDocument;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const STAGE_CORRECT: &str = "correct";
pub const STAGE_SUMMARIZE: &str = "summarize";
pub const STAGE_LEMMATIZE: &str = "lemmatize";
pub const STAGE_DETECT: &str = "detect";

/// Stage names in the only order they are ever run.
pub const STAGE_ORDER: [&str; 4] = [STAGE_CORRECT, STAGE_SUMMARIZE, STAGE_LEMMATIZE, STAGE_DETECT];

/// The one document field a stage writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutput {
    FullText(String),
    Summary(String),
    Lemmas(Vec<String>),
    DetectedWords(BTreeSet<String>),
}

impl StageOutput {
    fn apply(self, document: &mut TranscriptDocument) {
        match self {
            StageOutput::FullText(text) => document.full_text = text,
            StageOutput::Summary(summary) => document.summary = Some(summary),
            StageOutput::Lemmas(lemmas) => document.lemmas = Some(lemmas),
            StageOutput::DetectedWords(words) => document.detected_words = Some(words),
        }
    }
}

/// Trait for document post-processing stages.
pub trait PostProcessor: Send {
    fn process(&mut self, document: &TranscriptDocument) -> Result<StageOutput>;

    /// Name for logging and progress reporting.
    fn name(&self) -> &'static str;
}

/// Rewrites `full_text` with a grammar-correction capability.
///
/// On failure the accumulated text is kept as-is.
pub struct GrammarCorrectionStage {
    corrector: Arc<dyn GrammarCorrector>,
}

impl GrammarCorrectionStage {
    pub fn new(corrector: Arc<dyn GrammarCorrector>) -> Self {
        Self { corrector }
    }
}

impl PostProcessor for GrammarCorrectionStage {
    fn process(&mut self, document: &TranscriptDocument) -> Result<StageOutput> {
        let corrected = self.corrector.correct(&document.full_text)?;
        Ok(StageOutput::FullText(corrected.trim().to_string()))
    }

    fn name(&self) -> &'static str {
        STAGE_CORRECT
    }
}

pub struct SummarizationStage {
    summarizer: Arc<dyn Summarizer>,
}

impl SummarizationStage {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }
}

impl PostProcessor for SummarizationStage {
    fn process(&mut self, document: &TranscriptDocument) -> Result<StageOutput> {
        let summary = self.summarizer.summarize(&document.full_text)?;
        Ok(StageOutput::Summary(summary.trim().to_string()))
    }

    fn name(&self) -> &'static str {
        STAGE_SUMMARIZE
    }
}

/// Lemmatizes the transcribed words of `full_text`.
///
/// Failure placeholders are removed first so they never surface as lemmas.
pub struct LemmatizationStage {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl LemmatizationStage {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { lemmatizer }
    }
}

impl PostProcessor for LemmatizationStage {
    fn process(&mut self, document: &TranscriptDocument) -> Result<StageOutput> {
        let spoken = strip_placeholders(&document.full_text);
        Ok(StageOutput::Lemmas(self.lemmatizer.lemmatize(&spoken)?))
    }

    fn name(&self) -> &'static str {
        STAGE_LEMMATIZE
    }
}

/// Intersects `lemmas` with a fixed vocabulary of interest.
///
/// Vocabulary entries are reduced to lemma form when the stage is built, so
/// `الطالب` matches the lemma `طالب`. Fails when `lemmas` is absent, so
/// `detected_words` is absent too rather than an empty set that would read as
/// "nothing found".
pub struct DetectionStage {
    vocabulary: BTreeSet<String>,
}

impl DetectionStage {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary
                .into_iter()
                .map(|word| {
                    let word: String = word.into();
                    lemma_form(&word)
                })
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }
}

impl PostProcessor for DetectionStage {
    fn process(&mut self, document: &TranscriptDocument) -> Result<StageOutput> {
        let lemmas = document.lemmas.as_ref().ok_or_else(|| {
            ScribeError::Other("detection needs lemmas, which are unavailable".to_string())
        })?;
        let detected = lemmas
            .iter()
            .filter(|lemma| self.vocabulary.contains(lemma.as_str()))
            .cloned()
            .collect();
        Ok(StageOutput::DetectedWords(detected))
    }

    fn name(&self) -> &'static str {
        STAGE_DETECT
    }
}

/// Summary of one pass over the chain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub failed_stages: Vec<&'static str>,
    /// Set when `before_stage` asked to stop before every stage had run.
    pub stopped: bool,
}

/// Ordered list of stages applied to one document.
#[derive(Default)]
pub struct PostProcessorChain {
    stages: Vec<Box<dyn PostProcessor>>,
}

impl PostProcessorChain {
    pub fn new(stages: Vec<Box<dyn PostProcessor>>) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `document`.
    ///
    /// `before_stage` is called with each stage name before it runs; returning
    /// `false` stops the chain and leaves the remaining fields untouched.
    pub fn run(
        &mut self,
        document: &mut TranscriptDocument,
        mut before_stage: impl FnMut(&'static str) -> bool,
    ) -> ChainReport {
        let mut report = ChainReport::default();

        for stage in &mut self.stages {
            let name = stage.name();
            if !before_stage(name) {
                log::info!("Post-processing stopped before stage '{}'", name);
                report.stopped = true;
                break;
            }

            match stage.process(document) {
                Ok(output) => {
                    log::debug!("Stage '{}' succeeded", name);
                    output.apply(document);
                }
                Err(e) => {
                    log::warn!("Stage '{}' failed, leaving its field unset: {}", name, e);
                    report.failed_stages.push(name);
                }
            }
        }

        report
    }
}

/// The enrichment capabilities a chain can be built from.
///
/// A stage whose capability is `None` is skipped with a warning.
#[derive(Clone, Default)]
pub struct StageCapabilities {
    pub corrector: Option<Arc<dyn GrammarCorrector>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub lemmatizer: Option<Arc<dyn Lemmatizer>>,
}

/// Build the chain for the requested stage names.
///
/// Stages always run in `correct, summarize, lemmatize, detect` order no
/// matter how `requested` is ordered. Unknown names are rejected.
pub fn build_post_processors(
    requested: &[String],
    vocabulary: &[String],
    capabilities: &StageCapabilities,
) -> Result<PostProcessorChain> {
    if let Some(unknown) = requested
        .iter()
        .find(|name| !STAGE_ORDER.contains(&name.as_str()))
    {
        return Err(ScribeError::ConfigInvalidValue {
            key: "post_processing.stages".to_string(),
            message: format!(
                "unknown stage '{}' (expected one of: {})",
                unknown,
                STAGE_ORDER.join(", ")
            ),
        });
    }

    let wants = |stage: &str| requested.iter().any(|name| name == stage);
    let mut stages: Vec<Box<dyn PostProcessor>> = Vec::new();

    if wants(STAGE_CORRECT) {
        match &capabilities.corrector {
            Some(corrector) => stages.push(Box::new(GrammarCorrectionStage::new(corrector.clone()))),
            None => log::warn!("Stage 'correct' requested but the backend has no corrector"),
        }
    }
    if wants(STAGE_SUMMARIZE) {
        match &capabilities.summarizer {
            Some(summarizer) => stages.push(Box::new(SummarizationStage::new(summarizer.clone()))),
            None => log::warn!("Stage 'summarize' requested but the backend has no summarizer"),
        }
    }
    if wants(STAGE_LEMMATIZE) {
        match &capabilities.lemmatizer {
            Some(lemmatizer) => stages.push(Box::new(LemmatizationStage::new(lemmatizer.clone()))),
            None => log::warn!("Stage 'lemmatize' requested but no lemmatizer is available"),
        }
    }
    if wants(STAGE_DETECT) {
        stages.push(Box::new(DetectionStage::new(vocabulary.iter().cloned())));
    }

    Ok(PostProcessorChain::new(stages))
}
