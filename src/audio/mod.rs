//! Audio decoding and per-segment export.

pub mod source;
pub mod wav;

pub use source::AudioSource;
pub use wav::{AudioDecoder, WavDecoder};
