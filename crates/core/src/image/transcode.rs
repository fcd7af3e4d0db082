//! Binary to memory-image transcoding.
//!
//! Reads a test binary in full, encodes it with [`encode_words`], and writes one record per
//! line to the memory-image path, creating missing parent directories first. The output is
//! always rewritten from scratch; an empty binary yields an existing, empty file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::word::{MemoryWord, WORD_BYTES, encode_words};
use crate::common::HarnessError;

/// What a transcode produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranscodeSummary {
    /// Number of records written.
    pub words: usize,
    /// Trailing bytes (0-3) that did not fill a word and were left out.
    pub dropped_bytes: usize,
}

/// Transcodes the binary at `input` into a memory image at `output`.
///
/// # Errors
///
/// Returns [`HarnessError::InputNotFound`] if `input` does not exist and
/// [`HarnessError::Io`] if it cannot be read or `output` cannot be written.
pub fn transcode(input: &Path, output: &Path) -> Result<TranscodeSummary, HarnessError> {
    let bytes = fs::read(input).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => HarnessError::InputNotFound {
            path: input.to_path_buf(),
        },
        _ => HarnessError::io(input, e),
    })?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HarnessError::io(parent, e))?;
    }

    let words = encode_words(&bytes);
    write_records(output, &words).map_err(|e| HarnessError::io(output, e))?;

    let summary = TranscodeSummary {
        words: words.len(),
        dropped_bytes: bytes.len() % WORD_BYTES,
    };
    if summary.dropped_bytes > 0 {
        warn!(
            input = %input.display(),
            dropped = summary.dropped_bytes,
            "binary length is not a multiple of 4; trailing bytes left out of memory image"
        );
    }
    debug!(
        input = %input.display(),
        output = %output.display(),
        words = summary.words,
        "memory image written"
    );
    Ok(summary)
}

fn write_records(output: &Path, words: &[MemoryWord]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(output)?);
    for word in words {
        writeln!(writer, "{word}")?;
    }
    writer.flush()
}
