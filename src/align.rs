//! Span-to-token BIO alignment for the offset-based pipeline.

use crate::dataset::McqExample;
use crate::error::{Result, TaggerError, preview};
use crate::labels::{Entity, LabelId, OUTSIDE, OptionKey, schema};
use crate::locate::{CharSpan, LocatedSpans, SpanLocator};
use crate::tokenize::SubwordTokenizer;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Non-fatal conditions noticed while labeling one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    OptionNotFound { key: char },
    OptionsDropped { count: usize },
    Truncated { kept: usize, overflow: usize },
    SpanCut { entity: String },
}

/// Token ids paired 1:1 with label ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSequence {
    pub input_ids: Vec<u32>,
    pub labels: Vec<LabelId>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Assigns a BIO label to every token from the located spans.
///
/// A token is labeled for a span only when its offsets lie fully inside it;
/// it gets the `B-` tag when it starts exactly at the span start. Tokens
/// without offsets stay `O`. Spans are applied question first, then A to E;
/// located spans never overlap since each search starts past the previous
/// match.
pub fn align_offsets(offsets: &[Option<CharSpan>], spans: &LocatedSpans) -> Vec<LabelId> {
    let mut labels = vec![OUTSIDE; offsets.len()];
    tag_span(&mut labels, offsets, spans.question, Entity::Question);
    for (key, span) in spans.located_options() {
        tag_span(&mut labels, offsets, span, Entity::Option(key));
    }
    labels
}

fn tag_span(labels: &mut [LabelId], offsets: &[Option<CharSpan>], span: CharSpan, entity: Entity) {
    let s = schema();
    let (begin, inside) = (s.begin(entity), s.inside(entity));
    for (label, token) in labels.iter_mut().zip(offsets) {
        let Some(token) = (*token).filter(|t| !t.is_empty()) else {
            continue;
        };
        if span.contains(&token) {
            *label = if token.start == span.start { begin } else { inside };
        }
    }
}

/// Spans that extend past the last kept token after truncation.
fn cut_spans(offsets: &[Option<CharSpan>], spans: &LocatedSpans) -> Vec<Entity> {
    let Some(last_end) = offsets.iter().flatten().map(|t| t.end).max() else {
        return Vec::new();
    };
    std::iter::once((Entity::Question, spans.question))
        .chain(
            spans
                .located_options()
                .map(|(k, s)| (Entity::Option(k), s)),
        )
        .filter(|(_, s)| !s.is_empty() && s.end > last_end)
        .map(|(e, _)| e)
        .collect()
}

/// Tokenizes one example and labels it, collecting diagnostics.
pub fn label_example<T: SubwordTokenizer + ?Sized>(
    tokenizer: &T,
    example: &McqExample,
    locator: &SpanLocator,
) -> Result<LabeledSequence> {
    let encoding = tokenizer.encode_offsets(&example.text)?;
    if encoding.offsets.len() != encoding.ids.len() {
        return Err(TaggerError::MissingOffsets {
            preview: preview(&example.text),
        });
    }

    let spans = locator.locate(&example.text, &example.question, &example.options);
    let labels = align_offsets(&encoding.offsets, &spans);

    let mut diagnostics = Vec::new();
    if spans.dropped_options > 0 {
        warn!(
            "example has more than 5 options, truncating: {}...",
            preview(&example.text)
        );
        diagnostics.push(Diagnostic::OptionsDropped {
            count: spans.dropped_options,
        });
    }
    diagnostics.extend(
        spans
            .missing
            .iter()
            .map(|k: &OptionKey| Diagnostic::OptionNotFound { key: k.letter() }),
    );
    if encoding.overflow_tokens > 0 {
        warn!(
            kept = encoding.ids.len(),
            overflow = encoding.overflow_tokens,
            "tokenized sequence exceeds max_length for text: {}...",
            preview(&example.text)
        );
        diagnostics.push(Diagnostic::Truncated {
            kept: encoding.ids.len(),
            overflow: encoding.overflow_tokens,
        });
        diagnostics.extend(
            cut_spans(&encoding.offsets, &spans)
                .into_iter()
                .map(|e| Diagnostic::SpanCut {
                    entity: e.class_name(),
                }),
        );
    }

    Ok(LabeledSequence {
        input_ids: encoding.ids,
        labels,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans_with_question(end: usize) -> LocatedSpans {
        SpanLocator::default().locate(&"x".repeat(end), &"x".repeat(end), &[] as &[&str])
    }

    #[test]
    fn cut_spans_reports_question_past_last_token() {
        let spans = spans_with_question(10);
        let offsets = vec![None, Some(CharSpan::new(0, 4)), None];
        assert_eq!(cut_spans(&offsets, &spans), vec![Entity::Question]);
    }

    #[test]
    fn cut_spans_empty_without_tokens() {
        let spans = spans_with_question(10);
        assert!(cut_spans(&[None, None], &spans).is_empty());
    }
}
