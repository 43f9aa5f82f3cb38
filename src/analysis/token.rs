//! Token types for metric tokenization.
//!
//! # Examples
//!
//! ```
//! use versio::analysis::token::{Token, tokens_from_words};
//!
//! let tokens = tokens_from_words(" Hallo ,  Welt ");
//! assert_eq!(tokens, vec![Token::new("Hallo"), Token::new(","), Token::new("Welt")]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token represents a single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,
}

impl Token {
    /// Create a new token.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Token { text: text.into() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens produced by a tokenizer.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

/// Build tokens from the whitespace-separated words of `text`.
pub fn tokens_from_words(text: &str) -> Vec<Token> {
    text.split_whitespace().map(Token::new).collect()
}
