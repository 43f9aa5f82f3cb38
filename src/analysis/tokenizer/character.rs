//! Character tokenizer for languages written without spaces (ja, km).

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Every non-whitespace character becomes its own token.
#[derive(Clone, Debug, Default)]
pub struct CharTokenizer;

impl CharTokenizer {
    /// Create a new character tokenizer.
    pub fn new() -> Self {
        CharTokenizer
    }
}

impl Tokenizer for CharTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| Token::new(c.to_string()))
            .collect();
        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "char"
    }
}
