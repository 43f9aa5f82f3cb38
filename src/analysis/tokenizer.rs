//! Tokenizer implementations for the BLEU-style metric.
//!
//! BLEU counts word n-grams, so its value depends on how a segment is split
//! into words. The character-n-gram metric does not tokenize at all.
//!
//! # Available Tokenizers
//!
//! - [`mteval13a::Mteval13aTokenizer`] - mteval-v13a word/punctuation splitting (default)
//! - [`zh::ZhTokenizer`] - splits CJK characters apart, 13a rules elsewhere
//! - [`character::CharTokenizer`] - every non-whitespace character is a token
//!
//! # Examples
//!
//! ```
//! use versio::analysis::tokenizer::Tokenizer;
//! use versio::analysis::tokenizer::mteval13a::Mteval13aTokenizer;
//!
//! let tokenizer = Mteval13aTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Hello, world!").unwrap().collect();
//! assert_eq!(tokens.len(), 4);
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so one tokenizer can be shared by every
/// scoring call.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for logging and score signatures).
    fn name(&self) -> &'static str;

    /// Tokenize and keep only the token texts.
    fn words(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.tokenize(text)?.map(|token| token.text).collect())
    }
}

pub mod character;
pub mod mteval13a;
pub mod zh;
