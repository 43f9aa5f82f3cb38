//! Text analysis for metric computation.
//!
//! Holds the token model, the BLEU tokenizers and the language-based
//! tokenizer selection.

pub mod language;
pub mod token;
pub mod tokenizer;
