//! Span markup for word and character diffs.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::diff::matcher::{OpTag, SequenceMatcher};
use crate::error::{Result, VersioError};

pub const SUBSTITUTION_CLASS: &str = "diff diff-sub";
pub const DELETION_CLASS: &str = "diff diff-del";
pub const INSERTION_CLASS: &str = "diff diff-ins";

lazy_static! {
    static ref SPAN_TAG: Regex = Regex::new(r#"<span class="diff diff-(?:sub|del|ins)">|</span>"#).unwrap();
}

/// Granularity of a diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Whitespace-separated words, rejoined with a single space.
    #[default]
    Word,
    /// Extended grapheme clusters, rejoined without separator.
    Character,
}

impl DiffMode {
    /// Text placed between tokens when rebuilding a side.
    pub fn separator(self) -> &'static str {
        match self {
            DiffMode::Word => " ",
            DiffMode::Character => "",
        }
    }

    /// Split text into the tokens this mode compares.
    pub fn tokens(self, text: &str) -> Vec<&str> {
        match self {
            DiffMode::Word => text.split_whitespace().collect(),
            DiffMode::Character => text.graphemes(true).collect(),
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffMode::Word => write!(f, "word"),
            DiffMode::Character => write!(f, "character"),
        }
    }
}

impl FromStr for DiffMode {
    type Err = VersioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "word" | "words" => Ok(DiffMode::Word),
            "char" | "character" | "characters" => Ok(DiffMode::Character),
            other => Err(VersioError::invalid_argument(format!("Unknown diff mode: {other}"))),
        }
    }
}

fn wrap(class: &str, tokens: &[&str], separator: &str) -> String {
    format!("<span class=\"{class}\">{}</span>", tokens.join(separator))
}

/// Mark up the differences between two texts.
///
/// Returns the inputs unchanged when either is empty or both are equal.
pub fn annotate(text1: &str, text2: &str, mode: DiffMode) -> (String, String) {
    let (marked1, marked2, _) = annotate_with_similarity(text1, text2, mode);
    (marked1, marked2)
}

/// Like [`annotate`], also returning the token similarity in `[0, 1]`
/// (matched tokens on both sides over all tokens).
pub fn annotate_with_similarity(text1: &str, text2: &str, mode: DiffMode) -> (String, String, f64) {
    if text1 == text2 {
        return (text1.to_string(), text2.to_string(), 1.0);
    }
    if text1.is_empty() || text2.is_empty() {
        return (text1.to_string(), text2.to_string(), 0.0);
    }

    let tokens1 = mode.tokens(text1);
    let tokens2 = mode.tokens(text2);
    let separator = mode.separator();
    let matcher = SequenceMatcher::new(&tokens1, &tokens2);

    let mut parts1: Vec<String> = Vec::new();
    let mut parts2: Vec<String> = Vec::new();
    for op in matcher.opcodes() {
        let run1 = &tokens1[op.a_start..op.a_end];
        let run2 = &tokens2[op.b_start..op.b_end];
        match op.tag {
            OpTag::Equal => {
                parts1.push(run1.join(separator));
                parts2.push(run2.join(separator));
            }
            OpTag::Replace => {
                parts1.push(wrap(SUBSTITUTION_CLASS, run1, separator));
                parts2.push(wrap(SUBSTITUTION_CLASS, run2, separator));
            }
            OpTag::Delete => parts1.push(wrap(DELETION_CLASS, run1, separator)),
            OpTag::Insert => parts2.push(wrap(INSERTION_CLASS, run2, separator)),
        }
    }
    (parts1.join(separator), parts2.join(separator), matcher.ratio())
}

/// Remove the markup added by [`annotate`].
pub fn strip_markers(annotated: &str) -> String {
    SPAN_TAG.replace_all(annotated, "").into_owned()
}

/// One line of a side-by-side comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiffRow {
    /// 1-based segment number.
    pub line: usize,
    pub a: String,
    pub b: String,
    pub a_marked: String,
    pub b_marked: String,
    /// Token similarity of `a` and `b`, 1.0 when identical.
    pub similarity: f64,
}

impl DiffRow {
    pub fn is_identical(&self) -> bool {
        self.a == self.b
    }
}

/// Annotate two streams segment by segment; the shorter stream decides the
/// number of rows.
pub fn annotate_streams(a: &[String], b: &[String], mode: DiffMode) -> Vec<DiffRow> {
    a.iter()
        .zip(b)
        .enumerate()
        .map(|(i, (left, right))| {
            let (a_marked, b_marked, similarity) = annotate_with_similarity(left, right, mode);
            DiffRow {
                line: i + 1,
                a: left.clone(),
                b: right.clone(),
                a_marked,
                b_marked,
                similarity,
            }
        })
        .collect()
}
