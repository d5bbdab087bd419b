//! Command-line interface for chunkscribe
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Transcribe long audio files in fixed-size chunks
#[derive(Parser, Debug)]
#[command(
    name = "chunkscribe",
    version,
    about = "Transcribe long audio files in fixed-size chunks",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// WAV file to transcribe
    #[arg(value_name = "AUDIO")]
    pub input: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Language code passed to the transcriber (e.g. ar, en, auto)
    #[arg(long, short = 'l', value_name = "LANG")]
    pub language: Option<String>,

    /// Segment length. Examples: 60s, 1m, 90s, 2m30s
    #[arg(long, short = 'c', value_name = "DURATION", value_parser = parse_duration_ms)]
    pub chunk: Option<u64>,

    /// Number of segments transcribed concurrently
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,

    /// Transcription backend (nlpcloud, openai, transkriptor, whisper)
    #[arg(long, short = 'b', value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Post-processing stages, comma-separated (correct,summarize,lemmatize,detect)
    #[arg(long, value_name = "STAGES", value_delimiter = ',')]
    pub stages: Option<Vec<String>>,

    /// Disable all post-processing stages
    #[arg(long, conflicts_with = "stages")]
    pub no_post_processing: bool,

    /// Reject inputs longer than this. Examples: 200s, 10m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub max_duration: Option<u64>,

    /// Write the plain-text transcript to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the JSON result to this file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Do not write the JSON result
    #[arg(long, conflicts_with = "json")]
    pub no_json: bool,
}

/// Parse a duration string into milliseconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `500ms`), and compound (`1h30m`, `2m30s`).
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs.saturating_mul(1000));
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

impl Cli {
    /// Apply command-line overrides on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(language) = &self.language {
            config.job.language = language.clone();
        }
        if let Some(chunk) = self.chunk {
            config.job.chunk_duration_ms = chunk;
        }
        if let Some(workers) = self.workers {
            config.job.workers = workers;
        }
        if let Some(backend) = &self.backend {
            config.transcriber.backend = backend.clone();
        }
        if let Some(stages) = &self.stages {
            config.post_processing.stages = stages
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if self.no_post_processing {
            config.post_processing.stages.clear();
        }
        if let Some(max_ms) = self.max_duration {
            config.job.max_duration_secs = max_ms.div_ceil(1000);
        }
        if let Some(output) = &self.output {
            config.output.text_path = output.to_string_lossy().to_string();
        }
        if let Some(json) = &self.json {
            config.output.json_path = json.to_string_lossy().to_string();
        }
        if self.no_json {
            config.output.json_path.clear();
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (file + environment) as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_command() {
        let cli = Cli::try_parse_from(["chunkscribe"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.input.is_none());
        assert!(cli.language.is_none());
        assert!(cli.chunk.is_none());
        assert!(cli.workers.is_none());
        assert!(cli.stages.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_input_and_options() {
        let cli = Cli::try_parse_from([
            "chunkscribe",
            "lecture.wav",
            "--language",
            "ar",
            "--chunk",
            "90s",
            "--workers",
            "3",
            "--backend",
            "openai",
            "--stages",
            "summarize,lemmatize",
            "-o",
            "out.txt",
        ])
        .unwrap();

        assert_eq!(cli.input, Some(PathBuf::from("lecture.wav")));
        assert_eq!(cli.language.as_deref(), Some("ar"));
        assert_eq!(cli.chunk, Some(90_000));
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.backend.as_deref(), Some("openai"));
        assert_eq!(
            cli.stages,
            Some(vec!["summarize".to_string(), "lemmatize".to_string()])
        );
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["chunkscribe", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_duration_ms() {
        assert_eq!(parse_duration_ms("60"), Ok(60_000));
        assert_eq!(parse_duration_ms("60s"), Ok(60_000));
        assert_eq!(parse_duration_ms("2m30s"), Ok(150_000));
        assert_eq!(parse_duration_ms("500ms"), Ok(500));
        assert!(parse_duration_ms("soon").is_err());
    }

    #[test]
    fn test_invalid_chunk_rejected() {
        assert!(Cli::try_parse_from(["chunkscribe", "a.wav", "--chunk", "abc"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "chunkscribe",
            "a.wav",
            "--chunk",
            "5s",
            "--workers",
            "2",
            "--max-duration",
            "200s",
            "--json",
            "out/result.json",
        ])
        .unwrap();
        let mut config = Config::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.job.chunk_duration_ms, 5_000);
        assert_eq!(config.job.workers, 2);
        assert_eq!(config.job.max_duration_secs, 200);
        assert_eq!(config.job.language, "ar");
        assert_eq!(config.output.json_path, "out/result.json");
    }

    #[test]
    fn test_no_post_processing_and_no_json() {
        let cli =
            Cli::try_parse_from(["chunkscribe", "a.wav", "--no-post-processing", "--no-json"])
                .unwrap();
        let mut config = Config::default();

        cli.apply_overrides(&mut config);

        assert!(config.post_processing.stages.is_empty());
        assert!(config.output.json_path.is_empty());
    }

    #[test]
    fn test_json_conflicts_with_no_json() {
        assert!(
            Cli::try_parse_from(["chunkscribe", "a.wav", "--json", "x.json", "--no-json"]).is_err()
        );
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["chunkscribe", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["chunkscribe", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }

    #[test]
    fn test_invalid_command_returns_error() {
        assert!(Cli::try_parse_from(["chunkscribe", "--unknown-flag"]).is_err());
    }
}
