//! Ordered accumulation of segment results into the final text.
//!
//! Results may arrive in any order when segments are transcribed concurrently.
//! They are buffered by index and appended strictly in ascending order, so the
//! output never depends on completion order.

use crate::pipeline::types::{SegmentOutcome, SegmentResult};
use std::collections::BTreeMap;

const PLACEHOLDER_PREFIX: &str = "[transcription error: segment ";

/// Text inserted in place of a segment whose transcription failed.
pub fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}]")
}

/// Remove every failure placeholder from `text`, keeping only transcribed words.
///
/// Whitespace is collapsed to single spaces in the result.
pub fn strip_placeholders(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        let after = &rest[start + PLACEHOLDER_PREFIX.len()..];
        let digits = after.len() - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 && after[digits..].starts_with(']') {
            kept.push_str(&rest[..start]);
            kept.push(' ');
            rest = &after[digits + 1..];
        } else {
            kept.push_str(&rest[..start + PLACEHOLDER_PREFIX.len()]);
            rest = after;
        }
    }
    kept.push_str(rest);
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Final output of a [`ResultAccumulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulated {
    pub full_text: String,
    /// Segments appended in order (successes and placeholders).
    pub appended: usize,
    pub succeeded: usize,
    pub failed_segments: Vec<usize>,
    pub first_error: Option<String>,
    /// Results that arrived after a gap that was never filled (cancellation only).
    pub discarded: usize,
}

pub struct ResultAccumulator {
    delimiter: String,
    /// Results indexed by segment for ordering.
    pending: BTreeMap<usize, SegmentOutcome>,
    /// Next segment index to append.
    next_index: usize,
    parts: Vec<String>,
    succeeded: usize,
    failed_segments: Vec<usize>,
    first_error: Option<String>,
}

impl ResultAccumulator {
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            pending: BTreeMap::new(),
            next_index: 0,
            parts: Vec::new(),
            succeeded: 0,
            failed_segments: Vec::new(),
            first_error: None,
        }
    }

    /// Adds a result. Results for already-appended indices are ignored.
    pub fn push(&mut self, result: SegmentResult) {
        if result.index < self.next_index {
            log::warn!("Ignoring duplicate result for segment {}", result.index);
            return;
        }
        self.pending.insert(result.index, result.outcome);
        self.drain_ready();
    }

    fn drain_ready(&mut self) {
        while let Some(outcome) = self.pending.remove(&self.next_index) {
            match outcome {
                SegmentOutcome::Ok(text) => {
                    self.succeeded += 1;
                    let text = text.trim();
                    // Silent segments contribute no text (avoids doubled delimiters).
                    if !text.is_empty() {
                        self.parts.push(text.to_string());
                    }
                }
                SegmentOutcome::Err(message) => {
                    self.failed_segments.push(self.next_index);
                    self.first_error.get_or_insert(message);
                    self.parts.push(placeholder(self.next_index));
                }
            }
            self.next_index += 1;
        }
    }

    /// Number of segments appended so far, in order.
    pub fn appended(&self) -> usize {
        self.next_index
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Current text of every segment appended so far.
    pub fn text(&self) -> String {
        self.parts.join(&self.delimiter)
    }

    pub fn finish(self) -> Accumulated {
        let full_text = self.text();
        Accumulated {
            full_text,
            appended: self.next_index,
            succeeded: self.succeeded,
            failed_segments: self.failed_segments,
            first_error: self.first_error,
            discarded: self.pending.len(),
        }
    }
}
