//! Job driver: decoding, segmentation, transcription, post-processing.
//!
//! A [`TranscriptionJob`] owns its [`JobState`] and is the only thing that
//! changes it. It runs either synchronously through [`TranscriptionJob::run`]
//! or on a dedicated thread through [`TranscriptionJob::start`], which returns
//! a [`JobHandle`] for cancellation and joining.
//!
//! Segments are transcribed by up to `workers` scoped threads pulling from a
//! crossbeam work queue. Results come back over a channel in completion order
//! and the driver thread alone feeds them to the [`ResultAccumulator`], so the
//! final text never depends on scheduling.

use crate::audio::{AudioDecoder, AudioSource};
use crate::defaults;
use crate::pipeline::accumulator::{Accumulated, ResultAccumulator};
use crate::pipeline::error::JobError;
use crate::pipeline::post_processor::PostProcessorChain;
use crate::pipeline::progress::{NullProgressSink, ProgressSink};
use crate::pipeline::segment_transcriber::SegmentTranscriber;
use crate::pipeline::segmenter;
use crate::pipeline::types::{
    JobOutcome, JobReport, JobState, Segment, SegmentResult, TranscriptDocument,
};
use crate::stt::transcriber::Transcriber;
use crossbeam_channel::{bounded, unbounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Parameters of a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub chunk_duration_ms: u64,
    /// Language code handed to the transcription capability.
    pub language: String,
    /// Maximum number of segments transcribed at the same time.
    pub workers: usize,
    /// Separator between segment outcomes in `full_text`.
    pub delimiter: String,
    /// Longest accepted input. `None` accepts any length.
    pub max_duration_ms: Option<u64>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_duration_ms: defaults::CHUNK_DURATION_MS,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            workers: defaults::WORKERS,
            delimiter: defaults::SEGMENT_DELIMITER.to_string(),
            max_duration_ms: None,
        }
    }
}

impl JobConfig {
    fn check(&self) -> Result<(), JobError> {
        if self.chunk_duration_ms == 0 {
            return Err(JobError::InvalidConfig {
                message: "chunk duration must be greater than zero".to_string(),
            });
        }
        if self.workers == 0 {
            return Err(JobError::InvalidConfig {
                message: "at least one worker is required".to_string(),
            });
        }
        Ok(())
    }
}

/// Holds the current state and refuses transitions that go backwards.
struct StateTracker {
    current: JobState,
    sink: Arc<dyn ProgressSink>,
}

impl StateTracker {
    fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            current: JobState::Idle,
            sink,
        }
    }

    fn advance(&mut self, next: JobState) {
        if self.current.is_terminal() || next.phase() < self.current.phase() {
            log::error!(
                "Ignoring invalid job transition {} -> {}",
                self.current.label(),
                next.label()
            );
            return;
        }
        if next.phase() != self.current.phase() {
            log::info!("Job {} -> {}", self.current.label(), next.label());
        }
        self.sink.on_progress(&next);
        self.current = next;
    }
}

enum Finish {
    Completed,
    Cancelled,
}

/// One chunked transcription of one audio input.
pub struct TranscriptionJob {
    config: JobConfig,
    decoder: Arc<dyn AudioDecoder>,
    transcriber: Arc<dyn Transcriber>,
    post_processors: PostProcessorChain,
    progress: Arc<dyn ProgressSink>,
}

impl TranscriptionJob {
    pub fn new(
        config: JobConfig,
        decoder: Arc<dyn AudioDecoder>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            decoder,
            transcriber,
            post_processors: PostProcessorChain::default(),
            progress: Arc::new(NullProgressSink),
        }
    }

    pub fn with_post_processors(mut self, chain: PostProcessorChain) -> Self {
        self.post_processors = chain;
        self
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Run the job on a dedicated thread.
    pub fn start(self, path: impl Into<PathBuf>) -> std::io::Result<JobHandle> {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let path = path.into();

        let thread = thread::Builder::new()
            .name("transcription-job".to_string())
            .spawn(move || {
                let mut job = self;
                job.run(&path, &flag)
            })?;

        Ok(JobHandle { cancel, thread })
    }

    /// Decode `path` and run the whole job on the calling thread.
    pub fn run(&mut self, path: &Path, cancel: &AtomicBool) -> JobOutcome {
        let mut tracker = StateTracker::new(Arc::clone(&self.progress));
        tracker.advance(JobState::Segmenting);

        log::info!("Decoding {}", path.display());
        let result = self
            .decoder
            .load(path)
            .map_err(|e| JobError::Decode {
                message: e.to_string(),
            })
            .and_then(|source| self.drive(&source, cancel, &mut tracker));

        Self::finish(&mut tracker, result)
    }

    /// Run the job over audio that is already decoded.
    pub fn run_source(&mut self, source: &AudioSource, cancel: &AtomicBool) -> JobOutcome {
        let mut tracker = StateTracker::new(Arc::clone(&self.progress));
        tracker.advance(JobState::Segmenting);
        let result = self.drive(source, cancel, &mut tracker);
        Self::finish(&mut tracker, result)
    }

    fn finish(
        tracker: &mut StateTracker,
        result: Result<(Finish, JobReport), JobError>,
    ) -> JobOutcome {
        match result {
            Ok((Finish::Completed, report)) => {
                tracker.advance(JobState::Completed(report.document.clone()));
                JobOutcome::Completed(report)
            }
            Ok((Finish::Cancelled, report)) => {
                tracker.advance(JobState::Cancelled(report.document.clone()));
                JobOutcome::Cancelled(report)
            }
            Err(error) => {
                log::error!("Job failed: {}", error);
                tracker.advance(JobState::Failed(error.to_string()));
                JobOutcome::Failed(error)
            }
        }
    }

    fn drive(
        &mut self,
        source: &AudioSource,
        cancel: &AtomicBool,
        tracker: &mut StateTracker,
    ) -> Result<(Finish, JobReport), JobError> {
        let started = Instant::now();
        self.config.check()?;

        let duration_ms = source.duration_ms();
        if let Some(limit_ms) = self.config.max_duration_ms
            && duration_ms > limit_ms
        {
            return Err(JobError::InvalidConfig {
                message: format!(
                    "audio is {:.1}s long, the limit is {:.1}s",
                    duration_ms as f64 / 1000.0,
                    limit_ms as f64 / 1000.0
                ),
            });
        }

        let segments = segmenter::segment(duration_ms, self.config.chunk_duration_ms).map_err(
            |e| JobError::InvalidConfig {
                message: e.to_string(),
            },
        )?;
        let total = segments.len();
        log::info!(
            "Split {}ms of audio into {} segment(s) of up to {}ms",
            duration_ms,
            total,
            self.config.chunk_duration_ms
        );

        tracker.advance(JobState::Transcribing {
            completed: 0,
            total,
            current_index: None,
        });
        let (accumulated, stopped) = self.transcribe_all(source, &segments, cancel, tracker);

        if stopped {
            log::info!(
                "Cancelled after {} of {} segment(s)",
                accumulated.appended,
                total
            );
            let report = JobReport {
                document: TranscriptDocument::new(accumulated.full_text),
                total_segments: total,
                failed_segments: accumulated.failed_segments,
                failed_stages: Vec::new(),
            };
            return Ok((Finish::Cancelled, report));
        }

        if total > 0 && accumulated.succeeded == 0 {
            return Err(JobError::TotalTranscriptionFailure {
                failed: accumulated.failed_segments.len(),
                first_error: accumulated.first_error.unwrap_or_default(),
            });
        }

        let mut document = TranscriptDocument::new(accumulated.full_text);
        let mut failed_stages = Vec::new();
        let mut finish = Finish::Completed;

        // Nothing to enrich when the input was empty.
        if total > 0 && !self.post_processors.is_empty() {
            let chain_report = self.post_processors.run(&mut document, |stage| {
                if cancel.load(Ordering::SeqCst) {
                    return false;
                }
                tracker.advance(JobState::PostProcessing { stage });
                true
            });
            failed_stages = chain_report.failed_stages;
            if chain_report.stopped {
                finish = Finish::Cancelled;
            }
        }

        log::info!(
            "Job finished in {:.1}s: {} segment(s), {} failed, {} stage failure(s)",
            started.elapsed().as_secs_f64(),
            total,
            accumulated.failed_segments.len(),
            failed_stages.len()
        );

        let report = JobReport {
            document,
            total_segments: total,
            failed_segments: accumulated.failed_segments,
            failed_stages,
        };
        Ok((finish, report))
    }

    /// Returns the accumulated text and whether cancellation stopped the loop.
    fn transcribe_all(
        &self,
        source: &AudioSource,
        segments: &[Segment],
        cancel: &AtomicBool,
        tracker: &mut StateTracker,
    ) -> (Accumulated, bool) {
        let adapter = SegmentTranscriber::new(
            Arc::clone(&self.transcriber),
            self.config.language.clone(),
        );
        let mut progress = TranscriptionProgress {
            accumulator: ResultAccumulator::new(self.config.delimiter.clone()),
            received: 0,
            total: segments.len(),
        };

        let workers = self.config.workers.min(segments.len()).max(1);
        log::debug!(
            "Transcribing with backend '{}' on {} worker(s)",
            adapter.backend_name(),
            workers
        );

        let stopped = if workers == 1 {
            transcribe_sequential(&adapter, source, segments, cancel, &mut progress, tracker)
        } else {
            transcribe_parallel(
                &adapter,
                source,
                segments,
                workers,
                cancel,
                &mut progress,
                tracker,
            )
        };

        (progress.accumulator.finish(), stopped)
    }
}

struct TranscriptionProgress {
    accumulator: ResultAccumulator,
    received: usize,
    total: usize,
}

impl TranscriptionProgress {
    fn record(&mut self, result: SegmentResult, tracker: &mut StateTracker) {
        let index = result.index;
        self.accumulator.push(result);
        self.received += 1;
        tracker.advance(JobState::Transcribing {
            completed: self.received,
            total: self.total,
            current_index: Some(index),
        });
    }
}

fn transcribe_sequential(
    adapter: &SegmentTranscriber,
    source: &AudioSource,
    segments: &[Segment],
    cancel: &AtomicBool,
    progress: &mut TranscriptionProgress,
    tracker: &mut StateTracker,
) -> bool {
    for segment in segments {
        if cancel.load(Ordering::SeqCst) {
            return true;
        }
        let result = adapter.transcribe(source, segment);
        if cancel.load(Ordering::SeqCst) {
            log::info!(
                "Discarding segment {} result that finished after cancellation",
                segment.index
            );
            return true;
        }
        progress.record(result, tracker);
    }
    false
}

fn transcribe_parallel(
    adapter: &SegmentTranscriber,
    source: &AudioSource,
    segments: &[Segment],
    workers: usize,
    cancel: &AtomicBool,
    progress: &mut TranscriptionProgress,
    tracker: &mut StateTracker,
) -> bool {
    let (work_tx, work_rx) = bounded::<Segment>(segments.len());
    for segment in segments {
        if work_tx.send(*segment).is_err() {
            break;
        }
    }
    drop(work_tx);

    let (result_tx, result_rx) = unbounded::<SegmentResult>();

    thread::scope(|scope| {
        for worker in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while !cancel.load(Ordering::SeqCst) {
                    let Ok(segment) = work_rx.recv() else {
                        break;
                    };
                    if result_tx.send(adapter.transcribe(source, &segment)).is_err() {
                        break;
                    }
                }
                log::debug!("Segment worker {} exiting", worker);
            });
        }
        drop(result_tx);

        // Keep draining after cancellation so in-flight workers can finish.
        let mut stopped = false;
        for result in result_rx.iter() {
            if cancel.load(Ordering::SeqCst) {
                if !stopped {
                    log::info!("Cancellation observed, discarding remaining results");
                }
                stopped = true;
                continue;
            }
            progress.record(result, tracker);
        }
        // Workers that saw the flag exit without reporting their segment.
        stopped || (cancel.load(Ordering::SeqCst) && progress.received < progress.total)
    })
}

/// Handle to a job running on its own thread.
pub struct JobHandle {
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<JobOutcome>,
}

impl JobHandle {
    /// Ask the job to stop at the next segment or stage boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared cancellation flag, for wiring into signal handlers.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the job reaches a terminal state.
    pub fn wait(self) -> JobOutcome {
        self.thread.join().unwrap_or_else(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            JobOutcome::Failed(JobError::WorkerPanic { message })
        })
    }
}
