//! Transcription command entry point.
//!
//! Wires the configured backend into a job:
//! decode → segment → transcribe → post-process → write

use crate::audio::WavDecoder;
use crate::backends::build_capabilities;
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, ScribeError};
use crate::output::{DocumentWriter, JsonWriter, TextWriter};
use crate::pipeline::post_processor::build_post_processors;
use crate::pipeline::types::{JobOutcome, JobReport, JobState, TranscriptDocument};
use crate::pipeline::{ChannelProgressSink, TranscriptionJob};
use crossbeam_channel::Receiver;
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Run the transcribe command: decode `input`, transcribe it chunk by chunk,
/// enrich the text and write the configured outputs.
///
/// Ctrl-C stops the job at the next segment or stage boundary; whatever was
/// finished by then is still written, and the command returns
/// [`ScribeError::Cancelled`].
pub async fn run_transcribe_command(config: Config, input: PathBuf, quiet: bool) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));

    let signal_flag = Arc::clone(&cancel);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current segment...");
            signal_flag.store(true, Ordering::SeqCst);
        }
    });

    // Blocking HTTP clients must be created and dropped off the async runtime.
    let result = tokio::task::spawn_blocking(move || transcribe(&config, &input, &cancel, quiet))
        .await
        .map_err(|e| ScribeError::Other(format!("Transcription task failed: {}", e)));

    signal_task.abort();
    result?
}

fn transcribe(config: &Config, input: &Path, cancel: &AtomicBool, quiet: bool) -> Result<()> {
    let capabilities = build_capabilities(config)?;
    let chain = build_post_processors(
        &config.post_processing.stages,
        &config.post_processing.detection_vocabulary,
        &capabilities.stages,
    )?;

    if !quiet {
        let stages = chain.stage_names();
        eprintln!(
            "Transcribing {} with {} ({}s segments, {} worker(s))",
            input.display().bold(),
            capabilities.transcriber.name().cyan(),
            config.job.chunk_duration_ms as f64 / 1000.0,
            config.job.workers
        );
        if !stages.is_empty() {
            eprintln!("{} {}", "Post-processing:".dimmed(), stages.join(" → "));
        }
    }

    let (tx, rx) = crossbeam_channel::bounded(defaults::PROGRESS_BUFFER);
    let renderer = thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || render_progress(rx, quiet))?;

    let outcome = {
        let mut job = TranscriptionJob::new(
            config.job_config(),
            Arc::new(WavDecoder),
            Arc::clone(&capabilities.transcriber),
        )
        .with_post_processors(chain)
        .with_progress_sink(Arc::new(ChannelProgressSink::new(tx)));
        job.run(input, cancel)
    };

    // The sink went away with the job, so the renderer has drained every state.
    if renderer.join().is_err() {
        log::warn!("Progress renderer terminated unexpectedly");
    }

    finish(config, outcome, quiet)
}

/// Write outputs for a terminal outcome and map it to the command result.
fn finish(config: &Config, outcome: JobOutcome, quiet: bool) -> Result<()> {
    match outcome {
        JobOutcome::Completed(report) => {
            write_outputs(config, &report.document, quiet)?;
            print_problems(&report);
            if config.output.text_path.is_empty() {
                print!("{}", TextWriter::render(&report.document));
                std::io::stdout().flush()?;
            }
            Ok(())
        }
        JobOutcome::Cancelled(report) => {
            if !quiet {
                eprintln!(
                    "{} keeping partial transcript",
                    "Cancelled:".yellow().bold()
                );
            }
            write_outputs(config, &report.document, quiet)?;
            Err(ScribeError::Cancelled)
        }
        JobOutcome::Failed(error) => Err(error.into()),
    }
}

fn output_writers(config: &Config) -> Vec<Box<dyn DocumentWriter>> {
    let mut writers: Vec<Box<dyn DocumentWriter>> = Vec::new();
    if !config.output.text_path.is_empty() {
        writers.push(Box::new(TextWriter::new(&config.output.text_path)));
    }
    if !config.output.json_path.is_empty() {
        writers.push(Box::new(JsonWriter::new(&config.output.json_path)));
    }
    writers
}

fn write_outputs(config: &Config, document: &TranscriptDocument, quiet: bool) -> Result<()> {
    for writer in output_writers(config) {
        writer.write(document)?;
        if !quiet {
            eprintln!("{} {}", "Saved".green(), writer.path().display());
        }
    }
    Ok(())
}

fn print_problems(report: &JobReport) {
    if !report.failed_segments.is_empty() {
        let indices: Vec<String> = report
            .failed_segments
            .iter()
            .map(|i| i.to_string())
            .collect();
        eprintln!(
            "{} {} of {} segment(s) failed: {}",
            "Warning:".yellow().bold(),
            report.failed_segments.len(),
            report.total_segments,
            indices.join(", ")
        );
    }
    if !report.failed_stages.is_empty() {
        eprintln!(
            "{} stage(s) left no output: {}",
            "Warning:".yellow().bold(),
            report.failed_stages.join(", ")
        );
    }
}

/// Print job progress to stderr until the job drops its sender.
fn render_progress(rx: Receiver<JobState>, quiet: bool) {
    let mut mid_line = false;
    for state in rx.iter() {
        if quiet {
            continue;
        }
        match &state {
            JobState::Transcribing {
                completed, total, ..
            } => {
                eprint!("\r{} {}/{}", "Transcribing".cyan(), completed, total);
                mid_line = true;
                continue;
            }
            JobState::Idle | JobState::Segmenting => continue,
            _ => {}
        }
        if mid_line {
            eprintln!();
            mid_line = false;
        }
        match &state {
            JobState::PostProcessing { stage } => {
                eprintln!("{} {}", "Post-processing".cyan(), stage)
            }
            JobState::Completed(_) => eprintln!("{}", "Done".green().bold()),
            JobState::Failed(message) => eprintln!("{} {}", "Failed:".red().bold(), message),
            _ => {}
        }
    }
    if mid_line {
        eprintln!();
    }
}
