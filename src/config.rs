use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::pipeline::job::JobConfig;
use crate::pipeline::post_processor::STAGE_ORDER;
use crate::stt::{NlpCloudConfig, OpenAiConfig, TranskriptorConfig, WhisperConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub job: JobSection,
    pub transcriber: TranscriberSection,
    pub nlpcloud: NlpCloudSection,
    pub openai: OpenAiSection,
    pub transkriptor: TranskriptorSection,
    pub whisper: WhisperSection,
    pub post_processing: PostProcessingSection,
    pub output: OutputSection,
}

/// Segmentation and scheduling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobSection {
    pub chunk_duration_ms: u64,
    pub language: String,
    pub workers: usize,
    pub delimiter: String,
    /// 0 = unlimited
    pub max_duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriberSection {
    pub backend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NlpCloudSection {
    pub base_url: String,
    pub asr_model: String,
    pub llm_model: String,
    pub gpu: bool,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiSection {
    pub base_url: String,
    pub model: String,
    pub chat_model: String,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranskriptorSection {
    pub base_url: String,
    pub service: String,
    /// Empty = send the job language.
    pub locale: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API token.
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WhisperSection {
    pub model_path: PathBuf,
    /// 0 = let whisper.cpp decide
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostProcessingSection {
    pub stages: Vec<String>,
    pub detection_vocabulary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSection {
    /// Empty = do not write a text file.
    pub text_path: String,
    /// Empty = do not write a JSON file.
    pub json_path: String,
}

/// Transcription backend selected by `transcriber.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    NlpCloud,
    OpenAi,
    Transkriptor,
    Whisper,
}

impl Backend {
    pub const NAMES: [&'static str; 4] = ["nlpcloud", "openai", "transkriptor", "whisper"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::NlpCloud => "nlpcloud",
            Backend::OpenAi => "openai",
            Backend::Transkriptor => "transkriptor",
            Backend::Whisper => "whisper",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nlpcloud" => Ok(Backend::NlpCloud),
            "openai" => Ok(Backend::OpenAi),
            "transkriptor" => Ok(Backend::Transkriptor),
            "whisper" => Ok(Backend::Whisper),
            other => Err(ScribeError::ConfigInvalidValue {
                key: "transcriber.backend".to_string(),
                message: format!(
                    "unknown backend '{}' (expected one of: {})",
                    other,
                    Backend::NAMES.join(", ")
                ),
            }),
        }
    }
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            chunk_duration_ms: defaults::CHUNK_DURATION_MS,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            workers: defaults::WORKERS,
            delimiter: defaults::SEGMENT_DELIMITER.to_string(),
            max_duration_secs: 0,
        }
    }
}

impl Default for TranscriberSection {
    fn default() -> Self {
        Self {
            backend: Backend::NlpCloud.as_str().to_string(),
        }
    }
}

impl Default for NlpCloudSection {
    fn default() -> Self {
        let client = NlpCloudConfig::default();
        Self {
            base_url: client.base_url,
            asr_model: client.asr_model,
            llm_model: client.llm_model,
            gpu: client.gpu,
            timeout_secs: client.timeout_secs,
            token_env: defaults::NLPCLOUD_TOKEN_ENV.to_string(),
        }
    }
}

impl Default for OpenAiSection {
    fn default() -> Self {
        let client = OpenAiConfig::default();
        Self {
            base_url: client.base_url,
            model: client.model,
            chat_model: client.chat_model,
            timeout_secs: client.timeout_secs,
            api_key_env: defaults::OPENAI_API_KEY_ENV.to_string(),
        }
    }
}

impl Default for TranskriptorSection {
    fn default() -> Self {
        let client = TranskriptorConfig::default();
        Self {
            base_url: client.base_url,
            service: client.service,
            locale: client.locale,
            poll_interval_secs: client.poll_interval_secs,
            poll_timeout_secs: client.poll_timeout_secs,
            timeout_secs: client.timeout_secs,
            token_env: defaults::TRANSKRIPTOR_TOKEN_ENV.to_string(),
        }
    }
}

impl Default for WhisperSection {
    fn default() -> Self {
        Self {
            model_path: WhisperConfig::default().model_path,
            threads: 0,
        }
    }
}

impl Default for PostProcessingSection {
    fn default() -> Self {
        Self {
            stages: defaults::DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
            detection_vocabulary: Vec::new(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            text_path: String::new(),
            json_path: defaults::JSON_RESULT_PATH.to_string(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ScribeError {
    ScribeError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ScribeError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ScribeError::ConfigFileNotFound { .. }) => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - CHUNKSCRIBE_LANGUAGE → job.language
    /// - CHUNKSCRIBE_BACKEND → transcriber.backend
    /// - CHUNKSCRIBE_CHUNK_MS → job.chunk_duration_ms
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(language) = std::env::var("CHUNKSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.job.language = language;
        }

        if let Ok(backend) = std::env::var("CHUNKSCRIBE_BACKEND")
            && !backend.is_empty()
        {
            self.transcriber.backend = backend;
        }

        if let Ok(chunk) = std::env::var("CHUNKSCRIBE_CHUNK_MS")
            && !chunk.is_empty()
        {
            self.job.chunk_duration_ms = chunk.trim().parse().map_err(|_| {
                invalid(
                    "CHUNKSCRIBE_CHUNK_MS",
                    format!("'{}' is not a whole number of milliseconds", chunk),
                )
            })?;
        }

        Ok(self)
    }

    /// Reject values the job cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.job.chunk_duration_ms == 0 {
            return Err(invalid("job.chunk_duration_ms", "must be greater than zero"));
        }
        if self.job.workers == 0 || self.job.workers > defaults::MAX_WORKERS {
            return Err(invalid(
                "job.workers",
                format!("must be between 1 and {}", defaults::MAX_WORKERS),
            ));
        }
        if let Some(unknown) = self
            .post_processing
            .stages
            .iter()
            .find(|stage| !STAGE_ORDER.contains(&stage.as_str()))
        {
            return Err(invalid(
                "post_processing.stages",
                format!(
                    "unknown stage '{}' (expected one of: {})",
                    unknown,
                    STAGE_ORDER.join(", ")
                ),
            ));
        }
        if self.transkriptor.poll_timeout_secs == 0 {
            return Err(invalid(
                "transkriptor.poll_timeout_secs",
                "must be greater than zero",
            ));
        }
        self.backend()?;
        Ok(())
    }

    pub fn backend(&self) -> Result<Backend> {
        self.transcriber.backend.parse()
    }

    pub fn job_config(&self) -> JobConfig {
        JobConfig {
            chunk_duration_ms: self.job.chunk_duration_ms,
            language: self.job.language.clone(),
            workers: self.job.workers,
            delimiter: self.job.delimiter.clone(),
            max_duration_ms: (self.job.max_duration_secs > 0)
                .then(|| self.job.max_duration_secs.saturating_mul(1000)),
        }
    }

    pub fn nlpcloud_config(&self) -> NlpCloudConfig {
        NlpCloudConfig {
            base_url: self.nlpcloud.base_url.clone(),
            asr_model: self.nlpcloud.asr_model.clone(),
            llm_model: self.nlpcloud.llm_model.clone(),
            gpu: self.nlpcloud.gpu,
            timeout_secs: self.nlpcloud.timeout_secs,
        }
    }

    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.openai.base_url.clone(),
            model: self.openai.model.clone(),
            chat_model: self.openai.chat_model.clone(),
            timeout_secs: self.openai.timeout_secs,
        }
    }

    pub fn transkriptor_config(&self) -> TranskriptorConfig {
        TranskriptorConfig {
            base_url: self.transkriptor.base_url.clone(),
            service: self.transkriptor.service.clone(),
            locale: self.transkriptor.locale.clone(),
            poll_interval_secs: self.transkriptor.poll_interval_secs,
            poll_timeout_secs: self.transkriptor.poll_timeout_secs,
            timeout_secs: self.transkriptor.timeout_secs,
        }
    }

    pub fn whisper_config(&self) -> WhisperConfig {
        WhisperConfig {
            model_path: self.whisper.model_path.clone(),
            threads: (self.whisper.threads > 0).then_some(self.whisper.threads),
        }
    }

    /// Serialize back to TOML (for `config show`).
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScribeError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/chunkscribe/config.toml on Linux, or a path relative
    /// to the working directory if no config directory can be determined.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chunkscribe")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_chunkscribe_env() {
        remove_env("CHUNKSCRIBE_LANGUAGE");
        remove_env("CHUNKSCRIBE_BACKEND");
        remove_env("CHUNKSCRIBE_CHUNK_MS");
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.job.chunk_duration_ms, 60_000);
        assert_eq!(config.job.language, "ar");
        assert_eq!(config.job.workers, 1);
        assert_eq!(config.job.delimiter, " ");
        assert_eq!(config.job.max_duration_secs, 0);

        assert_eq!(config.backend().unwrap(), Backend::NlpCloud);
        assert_eq!(config.nlpcloud.token_env, "NLPCLOUD_TOKEN");
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.transkriptor.token_env, "TRANSKRIPTOR_TOKEN");
        assert_eq!(config.transkriptor.service, "Standard");

        assert_eq!(
            config.post_processing.stages,
            vec!["correct", "summarize", "lemmatize", "detect"]
        );
        assert!(config.post_processing.detection_vocabulary.is_empty());
        assert_eq!(config.output.json_path, "results/result.json");
        assert!(config.output.text_path.is_empty());

        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_config(
            r#"
            [job]
            chunk_duration_ms = 5000
            language = "en"
            workers = 4
            delimiter = "\n"
            max_duration_secs = 200

            [transcriber]
            backend = "openai"

            [openai]
            base_url = "http://localhost:8000/v1"
            model = "large-v3"

            [post_processing]
            stages = ["summarize"]
            detection_vocabulary = ["كتاب"]

            [output]
            text_path = "out.txt"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.job.chunk_duration_ms, 5000);
        assert_eq!(config.job.language, "en");
        assert_eq!(config.job.workers, 4);
        assert_eq!(config.job.delimiter, "\n");
        assert_eq!(config.backend().unwrap(), Backend::OpenAi);
        assert_eq!(config.openai.base_url, "http://localhost:8000/v1");
        assert_eq!(config.openai.model, "large-v3");
        assert_eq!(config.openai.chat_model, "gpt-4o-mini");
        assert_eq!(config.post_processing.stages, vec!["summarize"]);
        assert_eq!(config.post_processing.detection_vocabulary, vec!["كتاب"]);
        assert_eq!(config.output.text_path, "out.txt");
        assert_eq!(config.output.json_path, "results/result.json");

        let job = config.job_config();
        assert_eq!(job.max_duration_ms, Some(200_000));
        assert_eq!(job.workers, 4);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_config(
            r#"
            [nlpcloud]
            gpu = false
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert!(!config.nlpcloud.gpu);
        assert_eq!(config.nlpcloud.asr_model, "whisper");
        assert_eq!(config.job, JobSection::default());
        assert_eq!(config.output, OutputSection::default());
    }

    #[test]
    fn test_load_transkriptor_section() {
        let temp_file = write_config(
            r#"
            [transcriber]
            backend = "transkriptor"

            [transkriptor]
            locale = "ar-SA"
            poll_interval_secs = 2
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.backend().unwrap(), Backend::Transkriptor);
        let client = config.transkriptor_config();
        assert_eq!(client.locale, "ar-SA");
        assert_eq!(client.poll_interval_secs, 2);
        assert_eq!(client.poll_timeout_secs, 600);
        assert_eq!(client.base_url, "https://api.tor.app/developer");
    }

    #[test]
    fn test_validate_rejects_zero_poll_timeout() {
        let mut config = Config::default();
        config.transkriptor.poll_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transkriptor.poll_timeout_secs"));
    }

    #[test]
    fn test_unlimited_duration_maps_to_none() {
        assert_eq!(Config::default().job_config().max_duration_ms, None);
    }

    #[test]
    fn test_whisper_threads_zero_is_auto() {
        let mut config = Config::default();
        assert_eq!(config.whisper_config().threads, None);
        config.whisper.threads = 8;
        assert_eq!(config.whisper_config().threads, Some(8));
    }

    #[test]
    fn test_env_override_language_and_backend() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chunkscribe_env();

        set_env("CHUNKSCRIBE_LANGUAGE", "fr");
        set_env("CHUNKSCRIBE_BACKEND", "whisper");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.job.language, "fr");
        assert_eq!(config.backend().unwrap(), Backend::Whisper);
        assert_eq!(config.job.chunk_duration_ms, 60_000); // Not overridden

        clear_chunkscribe_env();
    }

    #[test]
    fn test_env_override_chunk() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chunkscribe_env();

        set_env("CHUNKSCRIBE_CHUNK_MS", "5000");
        let config = Config::default().with_env_overrides().unwrap();
        assert_eq!(config.job.chunk_duration_ms, 5000);

        set_env("CHUNKSCRIBE_CHUNK_MS", "five seconds");
        let result = Config::default().with_env_overrides();
        assert!(matches!(
            result,
            Err(ScribeError::ConfigInvalidValue { .. })
        ));

        clear_chunkscribe_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_chunkscribe_env();

        set_env("CHUNKSCRIBE_LANGUAGE", "");
        let config = Config::default().with_env_overrides().unwrap();

        assert_eq!(config.job.language, "ar");

        clear_chunkscribe_env();
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let mut config = Config::default();
        config.job.chunk_duration_ms = 0;
        match config.validate() {
            Err(ScribeError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "job.chunk_duration_ms")
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_worker_bounds() {
        let mut config = Config::default();
        config.job.workers = 0;
        assert!(config.validate().is_err());
        config.job.workers = defaults::MAX_WORKERS + 1;
        assert!(config.validate().is_err());
        config.job.workers = defaults::MAX_WORKERS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_stage() {
        let mut config = Config::default();
        config.post_processing.stages = vec!["translate".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("translate"));
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = Config::default();
        config.transcriber.backend = "azure".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("transcriber.backend"));
    }

    #[test]
    fn test_backend_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Backend>().unwrap(), Backend::OpenAi);
        assert_eq!(" whisper ".parse::<Backend>().unwrap(), Backend::Whisper);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_config(
            r#"
            [job
            language = "broken
        "#,
        );

        assert!(matches!(
            Config::load(temp_file.path()),
            Err(ScribeError::Config(_))
        ));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        let path = Config::default_path();
        assert!(path.ends_with("chunkscribe/config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_config("[job\n");
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = Config::default().to_toml_string().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }
}
