//! Memory-image generation.
//!
//! Converts a raw test binary into the hex-per-line text file the testbench loads with
//! `$readmemh`. The pure encoding lives in `word` so it can be exercised without a
//! filesystem; `transcode` adds the file I/O.

/// File-to-file transcoding.
pub mod transcode;

/// Word records and the pure byte-to-text encoding.
pub mod word;

pub use transcode::{TranscodeSummary, transcode};
pub use word::{MemoryWord, ParseWordError, WORD_BYTES, encode_words, parse_image, render_image};
