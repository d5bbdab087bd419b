//! Default configuration constants for chunkscribe.
//!
//! Shared by the config types, the job driver and the CLI so every layer
//! agrees on the same fallbacks.

/// Default segment length in milliseconds.
///
/// One minute keeps each upload comfortably below typical cloud ASR request
/// limits while producing few enough segments that per-request overhead stays low.
pub const CHUNK_DURATION_MS: u64 = 60_000;

/// Default language code passed to the transcription capability.
pub const DEFAULT_LANGUAGE: &str = "ar";

/// Language value that lets the backend detect the spoken language.
pub const AUTO_LANGUAGE: &str = "auto";

/// Separator placed between consecutive segment outcomes in `full_text`.
pub const SEGMENT_DELIMITER: &str = " ";

/// Default number of segments transcribed concurrently.
pub const WORKERS: usize = 1;

/// Upper bound on concurrent segment transcriptions.
pub const MAX_WORKERS: usize = 16;

/// Sample rate expected by local Whisper inference.
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Default post-processing stages, in reference order.
pub const DEFAULT_STAGES: [&str; 4] = ["correct", "summarize", "lemmatize", "detect"];

/// Default location of the JSON result document.
pub const JSON_RESULT_PATH: &str = "results/result.json";

/// Capacity of the progress channel between the job and the CLI renderer.
pub const PROGRESS_BUFFER: usize = 64;

/// Environment variable holding the NLP Cloud API token.
pub const NLPCLOUD_TOKEN_ENV: &str = "NLPCLOUD_TOKEN";

/// Environment variable holding an OpenAI-compatible API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the Transkriptor API token.
pub const TRANSKRIPTOR_TOKEN_ENV: &str = "TRANSKRIPTOR_TOKEN";

/// Default HTTP timeout for a single cloud request, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 120;

/// Report the GPU backend compiled into this build.
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else {
        "CPU"
    }
}
