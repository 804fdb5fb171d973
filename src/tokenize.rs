//! Sub-word tokenization seam.
//!
//! The labeling core only needs token ids plus either per-token offsets or
//! per-token source word indices. [`HfTokenizer`] provides both from a
//! `tokenizer.json`; tests plug in their own implementations.

use crate::error::{Result, TaggerError};
use crate::locate::CharSpan;
use std::path::Path;
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::debug;

/// Encoding of raw text with one optional span per token.
#[derive(Debug, Clone, Default)]
pub struct OffsetEncoding {
    pub ids: Vec<u32>,
    /// `None` for special/control tokens.
    pub offsets: Vec<Option<CharSpan>>,
    /// Tokens dropped by truncation.
    pub overflow_tokens: usize,
}

/// Encoding of a pre-split sentence with one optional word index per token.
#[derive(Debug, Clone, Default)]
pub struct WordEncoding {
    pub ids: Vec<u32>,
    /// `None` for tokens that belong to no input word.
    pub word_ids: Vec<Option<u32>>,
    pub overflow_tokens: usize,
}

pub trait SubwordTokenizer: Sync {
    fn encode_offsets(&self, text: &str) -> Result<OffsetEncoding>;
    fn encode_words(&self, words: &[String]) -> Result<WordEncoding>;
}

pub struct HfTokenizer {
    tokenizer: Tokenizer,
}

impl HfTokenizer {
    /// Loads `tokenizer.json` and truncates every encoding to `max_length` tokens.
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
            TaggerError::Tokenizer(format!("failed to load tokenizer from {}: {e}", path.display()))
        })?;
        tokenizer.with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))?;
        debug!(path = %path.display(), max_length, "tokenizer loaded");
        Ok(Self { tokenizer })
    }
}

/// Content tokens lost to truncation. Each overflow chunk is post-processed
/// with its own special tokens, which are not counted.
fn overflow_len(encoding: &Encoding) -> usize {
    encoding
        .get_overflowing()
        .iter()
        .flat_map(|o| o.get_special_tokens_mask())
        .filter(|&&special| special == 0)
        .count()
}

impl SubwordTokenizer for HfTokenizer {
    fn encode_offsets(&self, text: &str) -> Result<OffsetEncoding> {
        let encoding = self.tokenizer.encode(text, true)?;
        let offsets = encoding
            .get_offsets()
            .iter()
            .zip(encoding.get_special_tokens_mask())
            .map(|(&(start, end), &special)| (special == 0).then(|| CharSpan::new(start, end)))
            .collect();
        Ok(OffsetEncoding {
            ids: encoding.get_ids().to_vec(),
            offsets,
            overflow_tokens: overflow_len(&encoding),
        })
    }

    fn encode_words(&self, words: &[String]) -> Result<WordEncoding> {
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let encoding = self.tokenizer.encode(words.as_slice(), true)?;
        Ok(WordEncoding {
            ids: encoding.get_ids().to_vec(),
            word_ids: encoding.get_word_ids().to_vec(),
            overflow_tokens: overflow_len(&encoding),
        })
    }
}
