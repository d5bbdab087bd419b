//! WAV decoding for transcription jobs.

use crate::audio::source::AudioSource;
use crate::error::{Result, ScribeError};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Capability that turns a file on disk into decoded audio.
///
/// A decode failure is fatal to the job: nothing can be segmented without it.
pub trait AudioDecoder: Send + Sync {
    fn load(&self, path: &Path) -> Result<AudioSource>;
}

/// Decoder for RIFF/WAV files backed by `hound`.
///
/// Integer PCM of any bit depth and 32-bit float are normalized to 16-bit
/// samples; channel layout and sample rate are preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl WavDecoder {
    /// Decode from any reader (for testing/flexibility).
    pub fn from_reader<R: Read>(reader: R) -> Result<AudioSource> {
        let wav_reader = hound::WavReader::new(reader).map_err(|e| ScribeError::AudioDecode {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        let samples = read_as_i16(wav_reader, spec)?;

        Ok(AudioSource::new(samples, spec.sample_rate, spec.channels))
    }
}

impl AudioDecoder for WavDecoder {
    fn load(&self, path: &Path) -> Result<AudioSource> {
        let file = File::open(path).map_err(|e| ScribeError::AudioDecode {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

fn read_as_i16<R: Read>(mut reader: hound::WavReader<R>, spec: hound::WavSpec) -> Result<Vec<i16>> {
    let decode_err = |e: hound::Error| ScribeError::AudioDecode {
        message: format!("Failed to read WAV samples: {}", e),
    };

    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, bits) if bits <= 16 => {
            let shift = 16 - bits;
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| v << shift).map_err(decode_err))
                .collect()
        }
        (hound::SampleFormat::Int, bits) => {
            let shift = bits - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16).map_err(decode_err))
                .collect()
        }
        (hound::SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| {
                s.map(|v| (v * 32767.0).clamp(-32768.0, 32767.0) as i16)
                    .map_err(decode_err)
            })
            .collect(),
    }
}

/// Average interleaved channels down to mono.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
