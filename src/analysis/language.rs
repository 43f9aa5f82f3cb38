//! Tokenizer selection by target language.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::character::CharTokenizer;
use crate::analysis::tokenizer::mteval13a::Mteval13aTokenizer;
use crate::analysis::tokenizer::zh::ZhTokenizer;
use crate::error::{Result, VersioError};

/// The tokenizers BLEU can be computed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// mteval-v13a rules.
    #[default]
    #[serde(rename = "13a")]
    Mteval13a,
    /// CJK characters split apart.
    Zh,
    /// One token per character.
    Char,
}

impl TokenizerKind {
    /// Build the tokenizer for this kind.
    pub fn tokenizer(self) -> Box<dyn Tokenizer> {
        match self {
            TokenizerKind::Mteval13a => Box::new(Mteval13aTokenizer::new()),
            TokenizerKind::Zh => Box::new(ZhTokenizer::new()),
            TokenizerKind::Char => Box::new(CharTokenizer::new()),
        }
    }

    /// Short name used in score signatures.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenizerKind::Mteval13a => "13a",
            TokenizerKind::Zh => "zh",
            TokenizerKind::Char => "char",
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenizerKind {
    type Err = VersioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "13a" | "mteval13a" => Ok(TokenizerKind::Mteval13a),
            "zh" => Ok(TokenizerKind::Zh),
            "char" => Ok(TokenizerKind::Char),
            other => Err(VersioError::invalid_argument(format!("Unknown tokenizer: {other}"))),
        }
    }
}

/// Pick the BLEU tokenizer for a target language code.
///
/// Only the primary subtag is looked at, case-insensitively, so `ZH-Hans`
/// and `zh_TW` both select the Chinese tokenizer. Unknown codes fall back to
/// 13a.
pub fn tokenizer_for(lang: &str) -> TokenizerKind {
    let primary = lang
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "ja" | "km" => TokenizerKind::Char,
        "zh" => TokenizerKind::Zh,
        _ => TokenizerKind::Mteval13a,
    }
}
