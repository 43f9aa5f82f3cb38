//! Chinese tokenizer.
//!
//! Chinese text has no spaces between words, so every CJK character becomes
//! its own token. Everything else goes through the 13a splitting rules.

use crate::analysis::token::{TokenStream, tokens_from_words};
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::mteval13a::split_punctuation;
use crate::error::Result;

/// Code point ranges treated as CJK: ideographs, compatibility ideographs,
/// radicals, strokes, CJK punctuation, phonetic symbols, full-width forms and
/// enclosed/compatibility symbol blocks.
const CJK_RANGES: &[(char, char)] = &[
    ('\u{3400}', '\u{4DB5}'),   // CJK Unified Ideographs Extension A
    ('\u{4E00}', '\u{9FA5}'),   // CJK Unified Ideographs
    ('\u{9FA6}', '\u{9FBB}'),   // CJK Unified Ideographs, Unicode 4.1
    ('\u{F900}', '\u{FA2D}'),   // CJK Compatibility Ideographs
    ('\u{FA30}', '\u{FA6A}'),   // CJK Compatibility Ideographs, Unicode 3.2
    ('\u{FA70}', '\u{FAD9}'),   // CJK Compatibility Ideographs, Unicode 4.1
    ('\u{20000}', '\u{2A6D6}'), // CJK Unified Ideographs Extension B
    ('\u{2F800}', '\u{2FA1D}'), // CJK Compatibility Supplement
    ('\u{FF00}', '\u{FFEF}'),   // Full-width ASCII and punctuation, half-width kana, Hangul
    ('\u{2E80}', '\u{2EFF}'),   // CJK Radicals Supplement
    ('\u{3000}', '\u{303F}'),   // CJK Symbols and Punctuation
    ('\u{31C0}', '\u{31EF}'),   // CJK Strokes
    ('\u{2F00}', '\u{2FDF}'),   // Kangxi Radicals
    ('\u{2FF0}', '\u{2FFF}'),   // Ideographic Description Characters
    ('\u{3100}', '\u{312F}'),   // Bopomofo
    ('\u{31A0}', '\u{31BF}'),   // Bopomofo Extended
    ('\u{FE10}', '\u{FE1F}'),   // Vertical Forms
    ('\u{FE30}', '\u{FE4F}'),   // CJK Compatibility Forms
    ('\u{2600}', '\u{26FF}'),   // Miscellaneous Symbols
    ('\u{2700}', '\u{27BF}'),   // Dingbats
    ('\u{3200}', '\u{32FF}'),   // Enclosed CJK Letters and Months
    ('\u{3300}', '\u{33FF}'),   // CJK Compatibility
];

/// Whether `c` is split out as a single-character token.
pub fn is_chinese_char(c: char) -> bool {
    CJK_RANGES.iter().any(|&(lo, hi)| lo <= c && c <= hi)
}

/// Tokenizer for Chinese targets.
#[derive(Clone, Debug, Default)]
pub struct ZhTokenizer;

impl ZhTokenizer {
    /// Create a new Chinese tokenizer.
    pub fn new() -> Self {
        ZhTokenizer
    }

    /// Tokenize to a single space-separated string.
    pub fn tokenize_to_string(&self, text: &str) -> String {
        let mut spaced = String::with_capacity(text.len() * 2);
        for c in text.trim().chars() {
            if is_chinese_char(c) {
                spaced.push(' ');
                spaced.push(c);
                spaced.push(' ');
            } else {
                spaced.push(c);
            }
        }
        split_punctuation(&spaced)
    }
}

impl Tokenizer for ZhTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokenized = self.tokenize_to_string(text);
        Ok(Box::new(tokens_from_words(&tokenized).into_iter()))
    }

    fn name(&self) -> &'static str {
        "zh"
    }
}
