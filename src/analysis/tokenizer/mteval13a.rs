//! mteval-v13a tokenizer.
//!
//! The default tokenization of the WMT evaluation scripts: symbols and most
//! punctuation become separate tokens, periods and commas are split off
//! unless they sit inside a number, and a dash after a digit is split off.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::token::{TokenStream, tokens_from_words};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

lazy_static! {
    static ref SYMBOLS: Regex = Regex::new(r"([\{-~\[-` -&\(-\+:-@/])").unwrap();
    static ref PERIOD_COMMA_AFTER_NON_DIGIT: Regex = Regex::new(r"([^0-9])([\.,])").unwrap();
    static ref PERIOD_COMMA_BEFORE_NON_DIGIT: Regex = Regex::new(r"([\.,])([^0-9])").unwrap();
    static ref DASH_AFTER_DIGIT: Regex = Regex::new(r"([0-9])(-)").unwrap();
}

/// Apply the language-independent splitting rules and normalise spaces.
///
/// Shared with [`super::zh::ZhTokenizer`], which runs it after spacing out
/// CJK characters.
pub fn split_punctuation(line: &str) -> String {
    let line = SYMBOLS.replace_all(line, " $1 ");
    let line = PERIOD_COMMA_AFTER_NON_DIGIT.replace_all(&line, "$1 $2 ");
    let line = PERIOD_COMMA_BEFORE_NON_DIGIT.replace_all(&line, " $1 $2");
    let line = DASH_AFTER_DIGIT.replace_all(&line, "$1 $2 ");
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenizer reproducing mteval-v13a.
#[derive(Clone, Debug, Default)]
pub struct Mteval13aTokenizer;

impl Mteval13aTokenizer {
    /// Create a new 13a tokenizer.
    pub fn new() -> Self {
        Mteval13aTokenizer
    }

    /// Tokenize to a single space-separated string.
    pub fn tokenize_to_string(&self, text: &str) -> String {
        let mut line = text
            .replace("<skipped>", "")
            .replace("-\n", "")
            .replace('\n', " ");
        if line.contains('&') {
            line = line
                .replace("&quot;", "\"")
                .replace("&amp;", "&")
                .replace("&lt;", "<")
                .replace("&gt;", ">");
        }
        split_punctuation(&format!(" {line} "))
    }
}

impl Tokenizer for Mteval13aTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokenized = self.tokenize_to_string(text);
        Ok(Box::new(tokens_from_words(&tokenized).into_iter()))
    }

    fn name(&self) -> &'static str {
        "13a"
    }
}
