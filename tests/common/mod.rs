#![allow(dead_code)]

use mcq_tagger::error::Result;
use mcq_tagger::locate::CharSpan;
use mcq_tagger::tokenize::{OffsetEncoding, SubwordTokenizer, WordEncoding};

pub const CLS: u32 = 101;
pub const SEP: u32 = 102;

/// Splits on whitespace, then cuts each word into pieces of at most
/// `piece_len` bytes. Wraps the sequence in CLS/SEP and truncates to
/// `max_length` tokens including both.
pub struct PieceTokenizer {
    pub piece_len: usize,
    pub max_length: usize,
}

impl PieceTokenizer {
    pub fn words() -> Self {
        Self {
            piece_len: usize::MAX,
            max_length: 512,
        }
    }

    pub fn pieces(piece_len: usize) -> Self {
        Self {
            piece_len,
            max_length: 512,
        }
    }

    fn split_word(&self, start: usize, word: &str) -> Vec<CharSpan> {
        let mut out = Vec::new();
        let mut s = 0;
        while s < word.len() {
            let e = (s.saturating_add(self.piece_len)).min(word.len());
            out.push(CharSpan::new(start + s, start + e));
            s = e;
        }
        out
    }

    fn word_spans(text: &str) -> Vec<CharSpan> {
        let mut spans = Vec::new();
        let mut start = None;
        for (i, ch) in text.char_indices() {
            match (ch.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push(CharSpan::new(s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push(CharSpan::new(s, text.len()));
        }
        spans
    }

    fn wrap<T: Clone>(&self, content: Vec<T>, special: T) -> (Vec<T>, usize) {
        let budget = self.max_length.saturating_sub(2);
        let overflow = content.len().saturating_sub(budget);
        let mut out = vec![special.clone()];
        out.extend(content.into_iter().take(budget));
        out.push(special);
        (out, overflow)
    }

    fn ids(n: usize) -> Vec<u32> {
        let mut ids: Vec<u32> = (0..n as u32).map(|i| 1000 + i).collect();
        if let Some(first) = ids.first_mut() {
            *first = CLS;
        }
        if let Some(last) = ids.last_mut() {
            *last = SEP;
        }
        ids
    }
}

impl SubwordTokenizer for PieceTokenizer {
    fn encode_offsets(&self, text: &str) -> Result<OffsetEncoding> {
        let content: Vec<Option<CharSpan>> = Self::word_spans(text)
            .into_iter()
            .flat_map(|w| self.split_word(w.start, &text[w.start..w.end]))
            .map(Some)
            .collect();
        let (offsets, overflow_tokens) = self.wrap(content, None);
        Ok(OffsetEncoding {
            ids: Self::ids(offsets.len()),
            offsets,
            overflow_tokens,
        })
    }

    fn encode_words(&self, words: &[String]) -> Result<WordEncoding> {
        let content: Vec<Option<u32>> = words
            .iter()
            .enumerate()
            .flat_map(|(i, w)| {
                let n = self.split_word(0, w).len();
                std::iter::repeat_n(Some(i as u32), n)
            })
            .collect();
        let (word_ids, overflow_tokens) = self.wrap(content, None);
        Ok(WordEncoding {
            ids: Self::ids(word_ids.len()),
            word_ids,
            overflow_tokens,
        })
    }
}

/// Returns ids without any offsets or word ids.
pub struct BareTokenizer;

impl SubwordTokenizer for BareTokenizer {
    fn encode_offsets(&self, _text: &str) -> Result<OffsetEncoding> {
        Ok(OffsetEncoding {
            ids: vec![CLS, 7, SEP],
            offsets: Vec::new(),
            overflow_tokens: 0,
        })
    }

    fn encode_words(&self, _words: &[String]) -> Result<WordEncoding> {
        Ok(WordEncoding {
            ids: vec![CLS, 7, SEP],
            word_ids: Vec::new(),
            overflow_tokens: 0,
        })
    }
}

pub fn id(name: &str) -> i64 {
    mcq_tagger::labels::schema()
        .id(name)
        .unwrap_or_else(|| panic!("unknown label {name}"))
}
