//! Job-level failures.
//!
//! Segment transcription errors and post-processing stage errors are absorbed
//! into the output document; only the variants below end a job as `Failed`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The input could not be decoded, so there is nothing to segment.
    #[error("Failed to decode audio: {message}")]
    Decode { message: String },

    /// Every segment failed; there is no usable text at all.
    #[error("All {failed} segment(s) failed to transcribe (first error: {first_error})")]
    TotalTranscriptionFailure { failed: usize, first_error: String },

    /// The job was started with parameters it cannot honor.
    #[error("Invalid job configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Job thread terminated unexpectedly: {message}")]
    WorkerPanic { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_display() {
        let error = JobError::Decode {
            message: "not a WAV file".to_string(),
        };
        assert_eq!(error.to_string(), "Failed to decode audio: not a WAV file");
    }

    #[test]
    fn test_total_failure_display() {
        let error = JobError::TotalTranscriptionFailure {
            failed: 3,
            first_error: "quota exceeded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "All 3 segment(s) failed to transcribe (first error: quota exceeded)"
        );
    }

    #[test]
    fn test_invalid_config_display() {
        let error = JobError::InvalidConfig {
            message: "audio is 250s, limit is 200s".to_string(),
        };
        assert!(error.to_string().contains("limit is 200s"));
    }
}
