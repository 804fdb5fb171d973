//! Finds the question and option substrings inside an example's text.

use crate::labels::{MAX_OPTIONS, OptionKey, OptionTable};
use serde::{Deserialize, Serialize};

/// `[start, end)` byte offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, other: &CharSpan) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSpans {
    pub question: CharSpan,
    pub options: OptionTable<Option<CharSpan>>,
    /// Options whose text was not found after the cursor.
    pub missing: Vec<OptionKey>,
    /// Options beyond the fifth that were never searched.
    pub dropped_options: usize,
}

impl LocatedSpans {
    pub fn located_options(&self) -> impl Iterator<Item = (OptionKey, CharSpan)> + '_ {
        self.options
            .iter()
            .filter_map(|(key, span)| span.map(|s| (key, s)))
    }
}

/// Cursor-advancing substring search.
///
/// The question is taken to start the text. Each option is searched from a
/// cursor that begins `question_gap` bytes after the question and moves to
/// `option_gap` bytes past every match. A miss leaves the cursor in place.
#[derive(Debug, Clone, Copy)]
pub struct SpanLocator {
    pub question_gap: usize,
    pub option_gap: usize,
}

impl Default for SpanLocator {
    fn default() -> Self {
        Self {
            question_gap: 1,
            option_gap: 3,
        }
    }
}

impl SpanLocator {
    pub fn new(question_gap: usize, option_gap: usize) -> Self {
        Self {
            question_gap,
            option_gap,
        }
    }

    pub fn locate<S: AsRef<str>>(&self, text: &str, question: &str, options: &[S]) -> LocatedSpans {
        let question_span = CharSpan::new(0, question.len());
        let mut located = LocatedSpans {
            question: question_span,
            options: OptionTable::default(),
            missing: Vec::new(),
            dropped_options: options.len().saturating_sub(MAX_OPTIONS),
        };

        let mut cursor = question.len() + self.question_gap;
        for (key, option) in OptionKey::ALL.into_iter().zip(options) {
            let option = option.as_ref();
            match find_from(text, option, cursor) {
                Some(start) => {
                    let end = start + option.len();
                    located.options[key] = Some(CharSpan::new(start, end));
                    cursor = end + self.option_gap;
                }
                None => located.missing.push(key),
            }
        }
        located
    }
}

fn find_from(text: &str, needle: &str, cursor: usize) -> Option<usize> {
    let from = ceil_char_boundary(text, cursor)?;
    text[from..].find(needle).map(|i| from + i)
}

fn ceil_char_boundary(text: &str, mut i: usize) -> Option<usize> {
    while i <= text.len() {
        if text.is_char_boundary(i) {
            return Some(i);
        }
        i += 1;
    }
    None
}
