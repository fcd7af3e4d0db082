//! Memory word records.
//!
//! A record is one 32-bit word rendered as exactly 8 lowercase hex digits. Bytes are read from
//! the binary in file order and interpreted little-endian, so the window `01 02 03 04` renders
//! as `04030201`. Trailing bytes that do not fill a whole window are never encoded.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Bytes per memory word.
pub const WORD_BYTES: usize = 4;

/// Hex digits per rendered record.
const RECORD_DIGITS: usize = WORD_BYTES * 2;

/// One 32-bit word of a memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryWord(pub u32);

impl MemoryWord {
    /// Builds a word from a 4-byte window in file order.
    pub const fn from_window(window: [u8; WORD_BYTES]) -> Self {
        Self(u32::from_le_bytes(window))
    }

    /// Returns the 4-byte window this word was read from, in file order.
    pub const fn to_window(self) -> [u8; WORD_BYTES] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for MemoryWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// A memory-image line that is not a valid word record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWordError {
    /// The record does not have exactly 8 characters.
    #[error("record '{record}' has {len} characters, expected 8")]
    Length {
        /// Offending record.
        record: String,
        /// Its length in characters.
        len: usize,
    },
    /// The record contains something other than lowercase hex digits.
    #[error("record '{record}' contains a character that is not a lowercase hex digit")]
    Digit {
        /// Offending record.
        record: String,
    },
    /// A specific line of an image failed to parse.
    #[error("line {line}: {source}")]
    Line {
        /// One-based line number.
        line: usize,
        /// Record-level failure.
        #[source]
        source: Box<ParseWordError>,
    },
}

impl FromStr for MemoryWord {
    type Err = ParseWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != RECORD_DIGITS {
            return Err(ParseWordError::Length {
                record: s.to_string(),
                len,
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ParseWordError::Digit {
                record: s.to_string(),
            });
        }
        u32::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseWordError::Digit {
                record: s.to_string(),
            })
    }
}

/// Splits `bytes` into whole 4-byte windows and encodes each one. A 1-3 byte tail is dropped.
pub fn encode_words(bytes: &[u8]) -> Vec<MemoryWord> {
    bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| MemoryWord::from_window([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Renders the full memory-image text for `bytes`: one record and a newline per window.
pub fn render_image(bytes: &[u8]) -> String {
    let words = encode_words(bytes);
    let mut out = String::with_capacity(words.len() * (RECORD_DIGITS + 1));
    for word in words {
        out.push_str(&word.to_string());
        out.push('\n');
    }
    out
}

/// Parses memory-image text back into the bytes it was rendered from.
///
/// # Errors
///
/// Returns [`ParseWordError::Line`] for the first line that is not a valid record.
pub fn parse_image(text: &str) -> Result<Vec<u8>, ParseWordError> {
    let mut bytes = Vec::with_capacity(text.len() / (RECORD_DIGITS + 1) * WORD_BYTES);
    for (idx, line) in text.lines().enumerate() {
        let word: MemoryWord = line.parse().map_err(|e| ParseWordError::Line {
            line: idx + 1,
            source: Box::new(e),
        })?;
        bytes.extend_from_slice(&word.to_window());
    }
    Ok(bytes)
}
