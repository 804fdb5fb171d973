//! Word-per-line corpus loader and first-sub-token label alignment.
//!
//! Each non-blank line is `WORD TAG`; a blank line ends a sentence. Lines
//! with another field count are skipped. An unknown tag rejects the whole
//! corpus.

use crate::align::{Diagnostic, LabeledSequence};
use crate::error::{Result, TaggerError, preview};
use crate::labels::{IGNORE_INDEX, LabelId, schema};
use crate::tokenize::SubwordTokenizer;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaggedSentence {
    pub words: Vec<String>,
    pub labels: Vec<LabelId>,
}

pub fn parse_conll(raw: &str) -> Result<Vec<TaggedSentence>> {
    let s = schema();
    let mut sentences = Vec::new();
    let mut current = TaggedSentence::default();

    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            if !current.words.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [word, tag] = parts.as_slice() else {
            debug!(line = i + 1, fields = parts.len(), "skipping malformed corpus line");
            continue;
        };
        let id = s.id(tag).ok_or_else(|| TaggerError::UnknownTag {
            tag: tag.to_string(),
            line: i + 1,
        })?;
        current.words.push(word.to_string());
        current.labels.push(id);
    }
    if !current.words.is_empty() {
        sentences.push(current);
    }
    Ok(sentences)
}

pub fn load_conll(path: &Path) -> Result<Vec<TaggedSentence>> {
    let raw = std::fs::read_to_string(path)?;
    parse_conll(&raw)
}

/// Gives each word's label to its first sub-token only.
///
/// Later sub-tokens of the same word and tokens with no word get
/// [`IGNORE_INDEX`].
pub fn align_first_subtoken(word_ids: &[Option<u32>], labels: &[LabelId]) -> Result<Vec<LabelId>> {
    let mut previous: Option<u32> = None;
    let mut out = Vec::with_capacity(word_ids.len());
    for &word_id in word_ids {
        let label = match word_id {
            Some(w) if Some(w) != previous => {
                let index = w as usize;
                *labels.get(index).ok_or(TaggerError::WordIndexOutOfRange {
                    index,
                    len: labels.len(),
                })?
            }
            _ => IGNORE_INDEX,
        };
        out.push(label);
        previous = word_id;
    }
    Ok(out)
}

pub fn label_sentence<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    sentence: &TaggedSentence,
) -> Result<LabeledSequence> {
    let encoding = tokenizer.encode_words(&sentence.words)?;
    if encoding.word_ids.len() != encoding.ids.len() {
        return Err(TaggerError::MissingWordIds {
            preview: preview(&sentence.words.join(" ")),
        });
    }
    let labels = align_first_subtoken(&encoding.word_ids, &sentence.labels)?;

    let mut diagnostics = Vec::new();
    if encoding.overflow_tokens > 0 {
        warn!(
            kept = encoding.ids.len(),
            overflow = encoding.overflow_tokens,
            "sentence truncated: {}...",
            preview(&sentence.words.join(" "))
        );
        diagnostics.push(Diagnostic::Truncated {
            kept: encoding.ids.len(),
            overflow: encoding.overflow_tokens,
        });
    }
    Ok(LabeledSequence {
        input_ids: encoding.ids,
        labels,
        diagnostics,
    })
}
