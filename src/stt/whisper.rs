//! Local whisper.cpp transcription backend.
//!
//! Requires the `whisper` feature (and cmake at build time). Without it the
//! type still exists so configuration can name it, but transcription fails
//! with an explanatory error.

use crate::audio::WavDecoder;
use crate::audio::wav::{downmix_to_mono, resample};
use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::stt::transcriber::Transcriber;
use std::io::Cursor;
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperConfig {
    pub model_path: PathBuf,
    /// Inference threads (None = whisper.cpp default).
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            threads: None,
        }
    }
}

/// Decode a WAV segment into the 16 kHz mono f32 buffer whisper.cpp expects.
pub fn prepare_samples(audio_wav: &[u8]) -> Result<Vec<f32>> {
    let source = WavDecoder::from_reader(Cursor::new(audio_wav))?;
    let mono = downmix_to_mono(source.samples(), source.channels());
    let resampled = resample(&mono, source.sample_rate(), defaults::WHISPER_SAMPLE_RATE);
    Ok(resampled
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect())
}

fn model_name(config: &WhisperConfig) -> Result<String> {
    if !config.model_path.exists() {
        return Err(ScribeError::ModelNotFound {
            path: config.model_path.to_string_lossy().to_string(),
        });
    }
    Ok(config
        .model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string())
}

/// whisper.cpp transcriber. The context is behind a mutex, so concurrent
/// segment workers take turns on the model.
#[cfg(feature = "whisper")]
pub struct WhisperTranscriber {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperTranscriber {
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

#[cfg(feature = "whisper")]
impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // whisper.cpp logs to stderr unless hooked
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let model_name = model_name(&config)?;
        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| ScribeError::Transcription {
                message: "Invalid UTF-8 in model path".to_string(),
            })?;

        log::info!(
            "Loading Whisper model {} ({} backend)",
            path,
            defaults::gpu_backend()
        );
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| ScribeError::Transcription {
                message: format!("Failed to load Whisper model: {}", e),
            })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        let model_name = model_name(&config)?;
        Ok(Self { config, model_name })
    }

    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(feature = "whisper")]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio_wav: &[u8], language: &str) -> Result<String> {
        let samples = prepare_samples(audio_wav)?;

        let context = self
            .context
            .lock()
            .map_err(|e| ScribeError::Transcription {
                message: format!("Failed to acquire context lock: {}", e),
            })?;
        let mut state = context
            .create_state()
            .map_err(|e| ScribeError::Transcription {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        if language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(language));
        }
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| ScribeError::Transcription {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let text: String = state.as_iter().map(|segment| segment.to_string()).collect();
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

#[cfg(not(feature = "whisper"))]
impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, _audio_wav: &[u8], _language: &str) -> Result<String> {
        Err(ScribeError::Transcription {
            message: "Whisper support not compiled in; rebuild with --features whisper"
                .to_string(),
        })
    }

    fn name(&self) -> &str {
        "whisper"
    }
}
