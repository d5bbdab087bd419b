//! Immutable decoded audio shared by every segment transcription of a job.

use crate::error::{Result, ScribeError};
use std::io::Cursor;

/// Decoded PCM audio: interleaved 16-bit samples at the file's native rate.
///
/// Never mutated after decoding, so concurrent segment workers can read from
/// it through a shared reference without further synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSource {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn frame_count(&self) -> u64 {
        self.samples.len() as u64 / self.channels as u64
    }

    /// Total duration in milliseconds, rounded up.
    ///
    /// A trailing partial millisecond counts as a whole one, so a segment
    /// ending at this value reaches the last frame.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count() * 1000).div_ceil(self.sample_rate as u64)
    }

    fn frame_at_ms(&self, ms: u64) -> u64 {
        (ms * self.sample_rate as u64 / 1000).min(self.frame_count())
    }

    /// Interleaved samples covering `[start_ms, end_ms)`, clamped to the source.
    pub fn range(&self, start_ms: u64, end_ms: u64) -> &[i16] {
        let channels = self.channels as usize;
        let start = self.frame_at_ms(start_ms) as usize * channels;
        let end = self.frame_at_ms(end_ms.max(start_ms)) as usize * channels;
        &self.samples[start..end]
    }

    /// Export `[start_ms, end_ms)` as a standalone 16-bit PCM WAV file in memory.
    pub fn encode_wav(&self, start_ms: u64, end_ms: u64) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut buffer, spec).map_err(|e| ScribeError::AudioEncode {
                    message: format!("Failed to create WAV writer: {}", e),
                })?;
            for &sample in self.range(start_ms, end_ms) {
                writer
                    .write_sample(sample)
                    .map_err(|e| ScribeError::AudioEncode {
                        message: format!("Failed to write sample: {}", e),
                    })?;
            }
            writer.finalize().map_err(|e| ScribeError::AudioEncode {
                message: format!("Failed to finalize WAV: {}", e),
            })?;
        }

        Ok(buffer.into_inner())
    }
}
