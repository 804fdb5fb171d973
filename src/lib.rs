//! Labels multiple-choice questions for token classification.
//!
//! Training data: question/option substrings are located in the text
//! ([`locate`]) and projected onto sub-word tokens as BIO tags ([`align`]),
//! or read from a word-per-line corpus ([`conll`]). Inference: per-token
//! predictions are grouped and folded into an [`aggregate::McqRecord`].

pub mod aggregate;
pub mod align;
pub mod cli;
pub mod config;
pub mod conll;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod labels;
pub mod locate;
pub mod normalize;
pub mod prepare;
pub mod report;
pub mod tokenize;
pub mod util;
