//! SGML extractor and the line-level SGML helpers shared with the aligner.
//!
//! WMT SGML files put one `<seg>` per line:
//!
//! ```text
//! <tstset setid="newstest2019" srclang="en" trglang="de">
//! <doc sysid="ref" docid="abc-news.1" genre="news" origlang="en">
//! <p>
//! <seg id="1">Erster Satz.</seg>
//! </p>
//! </doc>
//! </tstset>
//! ```
//!
//! Extraction keeps the text of every `<seg>` line, in file order, and
//! ignores every other line.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;
use crate::extraction::SegmentExtractor;
use crate::extraction::cache;
use crate::segment::{CanonicalStream, Selector};

lazy_static! {
    static ref SEG_LINE: Regex = Regex::new(r"^<seg(?P<attrs>[^>]*)>(?P<text>.*)</seg>$").unwrap();
    static ref ATTRIBUTE: Regex =
        Regex::new(r#"(?P<name>[A-Za-z_][\w.-]*)\s*=\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'|(?P<bare>[^\s>"']+))"#)
            .unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// A `<seg>` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegLine {
    /// Value of the `id` attribute, when numeric.
    pub id: Option<u32>,
    /// Segment text with whitespace runs collapsed.
    pub text: String,
}

/// Parse one line of SGML; `None` unless it is a complete `<seg>` element.
pub fn parse_seg_line(line: &str) -> Option<SegLine> {
    let caps = SEG_LINE.captures(line.trim())?;
    let attrs = parse_attributes(caps.name("attrs").map_or("", |m| m.as_str()));
    let id = attrs.get("id").and_then(|v| v.trim().parse::<u32>().ok());
    let text = collapse_whitespace(caps.name("text").map_or("", |m| m.as_str()));
    Some(SegLine { id, text })
}

/// Parse `name="value"` pairs (double, single or unquoted values).
///
/// Attribute names are lower-cased; values are kept verbatim.
pub fn parse_attributes(attrs: &str) -> AHashMap<String, String> {
    ATTRIBUTE
        .captures_iter(attrs)
        .filter_map(|caps| {
            let name = caps.name("name")?.as_str().to_ascii_lowercase();
            let value = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .or_else(|| caps.name("bare"))
                .map_or("", |m| m.as_str());
            Some((name, value.to_string()))
        })
        .collect()
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Extract all `<seg>` texts from SGML source, in order.
pub fn segments_from_str(contents: &str) -> CanonicalStream {
    contents
        .lines()
        .filter_map(parse_seg_line)
        .map(|seg| seg.text)
        .collect()
}

/// Extractor for line-oriented SGML files.
///
/// SGML files hold a single side, so the selector is not consulted; document
/// filtering happens in [`crate::alignment`] before extraction.
#[derive(Clone, Debug, Default)]
pub struct SgmlExtractor;

impl SgmlExtractor {
    /// Create a new SGML extractor.
    pub fn new() -> Self {
        SgmlExtractor
    }
}

impl SegmentExtractor for SgmlExtractor {
    fn extract(
        &self,
        path: &Path,
        _selector: &Selector,
        _collection: Option<&str>,
    ) -> Result<CanonicalStream> {
        let target = cache::derived_text_path(path);
        // An SGML file holds a single side, so every selector reads the same lines.
        cache::memoize(&target, self.name(), || {
            let contents = fs::read_to_string(path)?;
            Ok(segments_from_str(&contents))
        })
    }

    fn name(&self) -> &'static str {
        "sgml"
    }
}
