//! Chunked transcription pipeline.
//!
//! Audio is split into fixed-duration segments, each segment is transcribed
//! independently, the results are stitched back together in index order and
//! the resulting document goes through optional enrichment stages. The job
//! driver runs on its own thread and reports state changes to a
//! [`ProgressSink`].

pub mod accumulator;
pub mod error;
pub mod job;
pub mod post_processor;
pub mod progress;
pub mod segment_transcriber;
pub mod segmenter;
pub mod types;

pub use accumulator::{ResultAccumulator, placeholder};
pub use error::JobError;
pub use job::{JobConfig, JobHandle, TranscriptionJob};
pub use post_processor::{
    PostProcessor, PostProcessorChain, StageCapabilities, StageOutput, build_post_processors,
};
pub use progress::{ChannelProgressSink, LogProgressSink, NullProgressSink, ProgressSink};
pub use segment_transcriber::SegmentTranscriber;
pub use segmenter::segment;
pub use types::{
    JobOutcome, JobReport, JobState, Segment, SegmentOutcome, SegmentResult, TranscriptDocument,
};
