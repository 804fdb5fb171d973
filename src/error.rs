//! Typed errors raised by the labeling core.

use thiserror::Error;

pub type Result<T, E = TaggerError> = std::result::Result<T, E>;

/// Fatal failures for one unit of work (a corpus file, a dataset, a tokenizer).
///
/// Recoverable conditions (missing options, truncation) are reported as
/// [`crate::align::Diagnostic`] values instead.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// A corpus line carried a tag outside the label schema.
    #[error("unknown label in corpus at line {line}: {tag}")]
    UnknownTag { tag: String, line: usize },

    /// The tokenizer produced no character offsets for the encoded tokens.
    #[error("tokenizer did not return offsets for every token (text: {preview:?})")]
    MissingOffsets { preview: String },

    /// The tokenizer produced no word ids for a pre-split sentence.
    #[error("tokenizer did not return word ids for every token (words: {preview:?})")]
    MissingWordIds { preview: String },

    /// A word id pointed past the end of the sentence's label list.
    #[error("word index {index} out of range for sentence of {len} words")]
    WordIndexOutOfRange { index: usize, len: usize },

    /// Error bubbled up from the `tokenizers` crate.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokenizers::Error> for TaggerError {
    fn from(err: tokenizers::Error) -> Self {
        Self::Tokenizer(err.to_string())
    }
}

/// Leading characters of `text` used to identify an offending example.
pub fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
