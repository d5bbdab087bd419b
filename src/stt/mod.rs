//! Speech-to-text backends.
//!
//! Every backend implements [`Transcriber`]; the NLP Cloud and OpenAI clients
//! additionally provide the grammar-correction and summarization capabilities.

pub(crate) mod http;
pub mod nlpcloud;
pub mod openai;
pub mod transcriber;
pub mod transkriptor;
pub mod whisper;

pub use nlpcloud::{NlpCloudClient, NlpCloudConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use transcriber::{MockTranscriber, Transcriber};
pub use transkriptor::{TranskriptorClient, TranskriptorConfig};
pub use whisper::{WhisperConfig, WhisperTranscriber};
