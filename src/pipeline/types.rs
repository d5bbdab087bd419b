//! Data types flowing through a transcription job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::pipeline::error::JobError;

/// One fixed-duration slice of the input, covering `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Position in the job, starting at 0.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Segment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Outcome of transcribing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Ok(String),
    Err(String),
}

/// Result for a single segment, tagged with its index so it can be reordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentResult {
    pub index: usize,
    pub outcome: SegmentOutcome,
}

impl SegmentResult {
    pub fn ok(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            outcome: SegmentOutcome::Ok(text.into()),
        }
    }

    pub fn err(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            outcome: SegmentOutcome::Err(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, SegmentOutcome::Ok(_))
    }
}

/// The aggregated result handed to output collaborators.
///
/// Optional fields serialize as `null` when absent rather than being skipped
/// or defaulted, so readers can tell "stage failed or disabled" from "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptDocument {
    pub full_text: String,
    pub summary: Option<String>,
    pub lemmas: Option<Vec<String>>,
    pub detected_words: Option<BTreeSet<String>>,
}

impl TranscriptDocument {
    pub fn new(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            ..Self::default()
        }
    }
}

/// Lifecycle of a job, reported to the progress sink on every change.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Idle,
    Segmenting,
    Transcribing {
        completed: usize,
        total: usize,
        /// Index of the segment whose result was just accounted for.
        current_index: Option<usize>,
    },
    PostProcessing {
        stage: &'static str,
    },
    Completed(TranscriptDocument),
    Failed(String),
    Cancelled(TranscriptDocument),
}

impl JobState {
    /// Ordinal of the lifecycle phase; transitions never decrease it.
    pub(crate) fn phase(&self) -> u8 {
        match self {
            JobState::Idle => 0,
            JobState::Segmenting => 1,
            JobState::Transcribing { .. } => 2,
            JobState::PostProcessing { .. } => 3,
            JobState::Completed(_) | JobState::Failed(_) | JobState::Cancelled(_) => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase() == 4
    }

    /// Short label for logs and status lines.
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Segmenting => "segmenting",
            JobState::Transcribing { .. } => "transcribing",
            JobState::PostProcessing { .. } => "post-processing",
            JobState::Completed(_) => "completed",
            JobState::Failed(_) => "failed",
            JobState::Cancelled(_) => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Transcribing {
                completed,
                total,
                current_index: Some(index),
            } => write!(f, "transcribing {completed}/{total} (segment {index})"),
            JobState::Transcribing {
                completed, total, ..
            } => write!(f, "transcribing {completed}/{total}"),
            JobState::PostProcessing { stage } => write!(f, "post-processing: {stage}"),
            JobState::Failed(message) => write!(f, "failed: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Terminal outcome of a job.
#[derive(Debug)]
pub enum JobOutcome {
    Completed(JobReport),
    /// Cooperatively cancelled; carries whatever was finalized before the stop.
    Cancelled(JobReport),
    Failed(JobError),
}

impl JobOutcome {
    pub fn document(&self) -> Option<&TranscriptDocument> {
        match self {
            JobOutcome::Completed(report) | JobOutcome::Cancelled(report) => {
                Some(&report.document)
            }
            JobOutcome::Failed(_) => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }
}

/// Document plus bookkeeping about how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub document: TranscriptDocument,
    pub total_segments: usize,
    /// Indices of segments whose transcription failed (placeholders in `full_text`).
    pub failed_segments: Vec<usize>,
    /// Names of post-processing stages that failed and left their field unset.
    pub failed_stages: Vec<&'static str>,
}
