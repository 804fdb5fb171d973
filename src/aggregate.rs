//! Turns token-level predictions back into a structured MCQ record.

use crate::labels::{OptionKey, OptionTable};
use crate::locate::CharSpan;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One token's predicted tag as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrediction {
    pub label: String,
    /// `None` for special tokens.
    pub span: Option<CharSpan>,
    #[serde(default)]
    pub score: f32,
}

/// A run of contiguous same-class tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub entity_group: String,
    pub word: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

impl EntityGroup {
    pub fn new(entity_group: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            entity_group: entity_group.into(),
            word: word.into(),
            start: 0,
            end: 0,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct McqRecord {
    pub question: String,
    pub options: OptionTable<String>,
}

fn split_tag(label: &str) -> (Option<char>, &str) {
    match label.split_once('-') {
        Some(("B", class)) => (Some('B'), class),
        Some(("I", class)) => (Some('I'), class),
        _ => (None, label),
    }
}

struct OpenGroup {
    class: String,
    span: CharSpan,
    scores: Vec<f32>,
}

impl OpenGroup {
    fn close(self, text: &str) -> EntityGroup {
        let word = text
            .get(self.span.start..self.span.end)
            .unwrap_or_default()
            .to_string();
        let score = self.scores.iter().sum::<f32>() / self.scores.len().max(1) as f32;
        EntityGroup {
            entity_group: self.class,
            word,
            start: self.span.start,
            end: self.span.end,
            score,
        }
    }
}

/// Merges contiguous token predictions of one class into entity groups.
///
/// A `B-` tag or a class change starts a new group. `O` tokens and tokens
/// without offsets close the open group and are not emitted.
pub fn group_entities(text: &str, predictions: &[TokenPrediction]) -> Vec<EntityGroup> {
    let mut groups = Vec::new();
    let mut open: Option<OpenGroup> = None;

    for p in predictions {
        let (bi, class) = split_tag(&p.label);
        let span = match p.span {
            Some(s) if !s.is_empty() && class != "O" => s,
            _ => {
                if let Some(g) = open.take() {
                    groups.push(g.close(text));
                }
                continue;
            }
        };
        match open.as_mut() {
            Some(g) if g.class == class && bi != Some('B') => {
                g.span.end = span.end;
                g.scores.push(p.score);
            }
            _ => {
                if let Some(g) = open.take() {
                    groups.push(g.close(text));
                }
                open = Some(OpenGroup {
                    class: class.to_string(),
                    span,
                    scores: vec![p.score],
                });
            }
        }
    }
    if let Some(g) = open {
        groups.push(g.close(text));
    }
    groups
}

/// Concatenates group text per class in encounter order.
///
/// Options never predicted stay empty. Option classes whose key is not one
/// of A to E are ignored.
pub fn aggregate(groups: &[EntityGroup]) -> McqRecord {
    let mut record = McqRecord::default();
    for g in groups {
        let class = g.entity_group.as_str();
        if class.starts_with("QUESTION") {
            record.question.push_str(&g.word);
            record.question.push(' ');
        } else if class.starts_with("OPTION_") {
            let key = class.split('_').nth(1).and_then(OptionKey::from_letter);
            match key {
                Some(key) => {
                    record.options[key].push_str(&g.word);
                    record.options[key].push(' ');
                }
                None => debug!(class, "ignoring unrecognized option key"),
            }
        }
    }
    record.question = record.question.trim().to_string();
    for (_, option) in record.options.iter_mut() {
        *option = option.trim().to_string();
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_tag_handles_plain_and_prefixed() {
        assert_eq!(split_tag("B-OPTION_A"), (Some('B'), "OPTION_A"));
        assert_eq!(split_tag("I-QUESTION"), (Some('I'), "QUESTION"));
        assert_eq!(split_tag("O"), (None, "O"));
        assert_eq!(split_tag("QUESTION"), (None, "QUESTION"));
    }
}
