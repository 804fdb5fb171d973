mod common;

use common::{BareTokenizer, PieceTokenizer, id};
use mcq_tagger::align::{Diagnostic, align_offsets, label_example};
use mcq_tagger::dataset::McqExample;
use mcq_tagger::error::TaggerError;
use mcq_tagger::labels::IGNORE_INDEX;
use mcq_tagger::locate::{CharSpan, SpanLocator};
use mcq_tagger::tokenize::SubwordTokenizer;

fn example(question: &str, options: &[&str], text: &str) -> McqExample {
    McqExample::new(question, options.iter().map(|s| s.to_string()).collect(), text)
}

fn arithmetic() -> McqExample {
    example("What is 2+2?", &["3", "4", "5"], "What is 2+2? 3 , 4 , 5")
}

#[test]
fn labels_question_and_options_per_word() {
    let tok = PieceTokenizer::words();
    let seq = label_example(&tok, &arithmetic(), &SpanLocator::default()).unwrap();

    let expected = vec![
        0,
        id("B-QUESTION"),
        id("I-QUESTION"),
        id("I-QUESTION"),
        id("B-OPTION_A"),
        0,
        id("B-OPTION_B"),
        0,
        id("B-OPTION_C"),
        0,
    ];
    assert_eq!(seq.labels, expected);
    assert_eq!(seq.input_ids.len(), seq.labels.len());
    assert!(seq.diagnostics.is_empty());
}

#[test]
fn sub_word_pieces_get_inside_tags() {
    let tok = PieceTokenizer::pieces(2);
    let ex = example("Capital?", &["Paris", "Rome"], "Capital? Paris , Rome");
    let seq = label_example(&tok, &ex, &SpanLocator::default()).unwrap();

    // [CLS] Ca pi ta l? Pa ri s , Ro me [SEP]
    let expected = vec![
        0,
        id("B-QUESTION"),
        id("I-QUESTION"),
        id("I-QUESTION"),
        id("I-QUESTION"),
        id("B-OPTION_A"),
        id("I-OPTION_A"),
        id("I-OPTION_A"),
        0,
        id("B-OPTION_B"),
        id("I-OPTION_B"),
        0,
    ];
    assert_eq!(seq.labels, expected);
}

#[test]
fn alignment_is_idempotent() {
    let tok = PieceTokenizer::pieces(3);
    let ex = arithmetic();
    let enc = tok.encode_offsets(&ex.text).unwrap();
    let spans = SpanLocator::default().locate(&ex.text, &ex.question, &ex.options);
    assert_eq!(align_offsets(&enc.offsets, &spans), align_offsets(&enc.offsets, &spans));
}

#[test]
fn tokens_straddling_a_span_boundary_stay_outside() {
    let spans = SpanLocator::default().locate("abc def", "abc d", &[] as &[&str]);
    let offsets = vec![None, Some(CharSpan::new(0, 3)), Some(CharSpan::new(4, 7)), None];
    assert_eq!(
        align_offsets(&offsets, &spans),
        vec![0, id("B-QUESTION"), 0, 0]
    );
}

#[test]
fn special_and_empty_tokens_stay_outside() {
    let spans = SpanLocator::default().locate("Q? a", "Q?", &["a"]);
    let offsets = vec![
        None,
        Some(CharSpan::new(0, 0)),
        Some(CharSpan::new(0, 2)),
        Some(CharSpan::new(3, 4)),
        None,
    ];
    let labels = align_offsets(&offsets, &spans);
    assert_eq!(labels, vec![0, 0, id("B-QUESTION"), id("B-OPTION_A"), 0]);
    assert!(!labels.contains(&IGNORE_INDEX));
}

#[test]
fn tokens_outside_every_span_are_o() {
    let tok = PieceTokenizer::words();
    let ex = example("Q?", &["b"], "Q? noise b trailing words");
    let seq = label_example(&tok, &ex, &SpanLocator::default()).unwrap();
    assert_eq!(
        seq.labels,
        vec![0, id("B-QUESTION"), 0, id("B-OPTION_A"), 0, 0, 0]
    );
}

#[test]
fn sixth_option_is_never_tagged() {
    let tok = PieceTokenizer::words();
    let ex = example(
        "Q?",
        &["a", "b", "c", "d", "e", "f"],
        "Q? a , b , c , d , e , f",
    );
    let seq = label_example(&tok, &ex, &SpanLocator::default()).unwrap();

    assert_eq!(seq.labels[10], id("B-OPTION_E"));
    assert_eq!(seq.labels[12], 0);
    let max = seq.labels.iter().copied().max().unwrap();
    assert!(max <= id("I-OPTION_E"));
    assert!(seq.diagnostics.contains(&Diagnostic::OptionsDropped { count: 1 }));
}

#[test]
fn missing_option_is_reported_not_fatal() {
    let tok = PieceTokenizer::words();
    let ex = example("Q?", &["zz", "y"], "Q? x , y");
    let seq = label_example(&tok, &ex, &SpanLocator::default()).unwrap();
    assert_eq!(
        seq.labels,
        vec![0, id("B-QUESTION"), 0, 0, id("B-OPTION_B"), 0]
    );
    assert_eq!(seq.diagnostics, vec![Diagnostic::OptionNotFound { key: 'A' }]);
}

#[test]
fn truncation_keeps_available_tokens_and_reports_cut_spans() {
    let tok = PieceTokenizer {
        piece_len: usize::MAX,
        max_length: 4,
    };
    let seq = label_example(&tok, &arithmetic(), &SpanLocator::default()).unwrap();

    assert_eq!(seq.labels, vec![0, id("B-QUESTION"), id("I-QUESTION"), 0]);
    assert_eq!(
        seq.diagnostics,
        vec![
            Diagnostic::Truncated { kept: 4, overflow: 6 },
            Diagnostic::SpanCut { entity: "QUESTION".into() },
            Diagnostic::SpanCut { entity: "OPTION_A".into() },
            Diagnostic::SpanCut { entity: "OPTION_B".into() },
            Diagnostic::SpanCut { entity: "OPTION_C".into() },
        ]
    );
}

#[test]
fn missing_offsets_is_fatal_and_names_the_example() {
    let err = label_example(&BareTokenizer, &arithmetic(), &SpanLocator::default()).unwrap_err();
    match err {
        TaggerError::MissingOffsets { preview } => assert!(preview.starts_with("What is 2+2?")),
        other => panic!("unexpected error: {other}"),
    }
}
