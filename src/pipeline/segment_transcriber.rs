//! Adapter that runs one segment through the transcription capability.

use crate::audio::AudioSource;
use crate::pipeline::types::{Segment, SegmentResult};
use crate::stt::transcriber::Transcriber;
use std::sync::Arc;
use std::time::Instant;

/// Strips Whisper-style non-speech annotations (`[BLANK_AUDIO]`, `[Music]`)
/// and collapses runs of whitespace.
///
/// Unmatched opening brackets are kept as-is.
fn clean_transcription(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '[' {
            result.push(ch);
            continue;
        }
        let mut buf = String::new();
        let mut found_close = false;
        for inner in chars.by_ref() {
            if inner == ']' {
                found_close = true;
                break;
            }
            buf.push(inner);
        }
        if !found_close {
            result.push(ch);
            result.push_str(&buf);
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turns a [`Segment`] into a [`SegmentResult`], never failing the job.
///
/// Any error from audio export or the external capability is caught and
/// reported as `SegmentOutcome::Err` so remaining segments still run.
#[derive(Clone)]
pub struct SegmentTranscriber {
    transcriber: Arc<dyn Transcriber>,
    language: String,
}

impl SegmentTranscriber {
    pub fn new(transcriber: Arc<dyn Transcriber>, language: impl Into<String>) -> Self {
        Self {
            transcriber,
            language: language.into(),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.transcriber.name()
    }

    pub fn transcribe(&self, source: &AudioSource, segment: &Segment) -> SegmentResult {
        let audio = match source.encode_wav(segment.start_ms, segment.end_ms) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Segment {}: audio export failed: {}", segment.index, e);
                return SegmentResult::err(segment.index, e.to_string());
            }
        };

        log::debug!(
            "Segment {}: sending {}ms ({} bytes) to {}",
            segment.index,
            segment.duration_ms(),
            audio.len(),
            self.transcriber.name()
        );

        let start = Instant::now();
        match self.transcriber.transcribe(&audio, &self.language) {
            Ok(text) => {
                log::debug!(
                    "Segment {}: transcribed in {}ms",
                    segment.index,
                    start.elapsed().as_millis()
                );
                SegmentResult::ok(segment.index, clean_transcription(&text))
            }
            Err(e) => {
                log::warn!("Segment {}: transcription failed: {}", segment.index, e);
                SegmentResult::err(segment.index, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScribeError};
    use crate::pipeline::types::SegmentOutcome;
    use crate::stt::transcriber::MockTranscriber;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn one_second_source() -> AudioSource {
        AudioSource::new(vec![0i16; 16000], 16000, 1)
    }

    fn segment(index: usize, start_ms: u64, end_ms: u64) -> Segment {
        Segment {
            index,
            start_ms,
            end_ms,
        }
    }

    /// Records the audio and language it receives.
    struct RecordingTranscriber {
        seen: Mutex<Vec<(usize, u32, String)>>,
    }

    impl Transcriber for RecordingTranscriber {
        fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
            let reader = hound::WavReader::new(Cursor::new(audio_wav.to_vec()))
                .map_err(|e| ScribeError::Other(e.to_string()))?;
            let spec = reader.spec();
            let frames = reader.len() as usize / spec.channels as usize;
            self.seen
                .lock()
                .unwrap()
                .push((frames, spec.sample_rate, language.to_string()));
            Ok("ok".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_success_produces_ok_with_index() {
        let transcriber = Arc::new(MockTranscriber::new("mock").with_response("مرحبا"));
        let adapter = SegmentTranscriber::new(transcriber, "ar");

        let result = adapter.transcribe(&one_second_source(), &segment(4, 0, 500));

        assert_eq!(result.index, 4);
        assert_eq!(result.outcome, SegmentOutcome::Ok("مرحبا".to_string()));
    }

    #[test]
    fn test_failure_is_captured_not_propagated() {
        let transcriber = Arc::new(MockTranscriber::new("mock").with_failure());
        let adapter = SegmentTranscriber::new(transcriber, "ar");

        let result = adapter.transcribe(&one_second_source(), &segment(1, 0, 500));

        assert_eq!(result.index, 1);
        match result.outcome {
            SegmentOutcome::Err(message) => assert!(message.contains("mock transcription failure")),
            other => panic!("Expected Err outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_exports_exact_range_and_passes_language() {
        let recorder = Arc::new(RecordingTranscriber {
            seen: Mutex::new(Vec::new()),
        });
        let adapter = SegmentTranscriber::new(recorder.clone(), "ar");

        adapter.transcribe(&one_second_source(), &segment(0, 250, 750));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(8000, 16000, "ar".to_string())]);
    }

    #[test]
    fn test_clean_strips_bracket_annotations() {
        assert_eq!(clean_transcription("[BLANK_AUDIO]"), "");
        assert_eq!(clean_transcription("hello [Music] world"), "hello world");
    }

    #[test]
    fn test_clean_keeps_unmatched_bracket() {
        assert_eq!(clean_transcription("a [b c"), "a [b c");
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean_transcription("  one \n two\t three  "), "one two three");
    }

    #[test]
    fn test_clean_keeps_parentheses() {
        assert_eq!(clean_transcription("قال (مرة) أخرى"), "قال (مرة) أخرى");
    }
}
