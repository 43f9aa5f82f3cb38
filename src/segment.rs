//! Core segment types shared by extraction, alignment and scoring.
//!
//! A [`CanonicalStream`] is the currency between the layers: one string per
//! segment, gap-free, with [`MISSING_TRANSLATION`] standing in for segments
//! one side does not provide.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VersioError};

/// Placeholder emitted when a reference or hypothesis lacks a segment that
/// the source provides. Keeps all streams of a test set the same length.
pub const MISSING_TRANSLATION: &str = "NO TRANSLATION AVAILABLE";

/// Ordered per-segment texts, one entry per output line.
pub type CanonicalStream = Vec<String>;

/// A single translatable unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Owning document, when the input format has documents.
    pub document_id: Option<String>,
    /// Positive id, unique within its document.
    pub segment_id: u32,
    /// Segment text.
    pub text: String,
}

impl Segment {
    /// Create a segment that belongs to a document.
    pub fn new<D: Into<String>, T: Into<String>>(document_id: D, segment_id: u32, text: T) -> Self {
        Segment {
            document_id: Some(document_id.into()),
            segment_id,
            text: text.into(),
        }
    }
}

/// Which side of a multi-sided file to extract.
///
/// Exactly one side is selected per extraction call; the type makes the
/// "no selector" and "several selectors" states impossible to express.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "side", content = "id", rename_all = "lowercase")]
pub enum Selector {
    /// The `src` side.
    Source,
    /// The `ref` side produced by the given translator.
    Reference(String),
    /// The `hyp` side produced by the given system.
    Hypothesis(String),
}

impl Selector {
    /// Build a selector from loosely-typed parts, as received from a form or
    /// command line. Exactly one part must be set.
    pub fn from_parts(
        source: bool,
        translator: Option<&str>,
        system: Option<&str>,
    ) -> Result<Self> {
        match (source, translator, system) {
            (true, None, None) => Ok(Selector::Source),
            (false, Some(translator), None) => Ok(Selector::Reference(translator.to_string())),
            (false, None, Some(system)) => Ok(Selector::Hypothesis(system.to_string())),
            (false, None, None) => Err(VersioError::validation(
                "one of source, reference or system must be provided",
            )),
            _ => Err(VersioError::validation(
                "only one of source, reference or system must be provided",
            )),
        }
    }

    /// Short label used in log lines.
    pub fn label(&self) -> String {
        match self {
            Selector::Source => "source".to_string(),
            Selector::Reference(translator) => format!("reference[{translator}]"),
            Selector::Hypothesis(system) => format!("hypothesis[{system}]"),
        }
    }
}

/// Supported input file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// One segment per line.
    Text,
    /// Line-oriented SGML (`<seg id="..">..</seg>`).
    Sgml,
    /// WMT XML (`dataset > doc > src|ref|hyp > p > seg`).
    Xml,
}

impl FileFormat {
    /// File extensions accepted for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Text => &["txt"],
            FileFormat::Sgml => &["sgm", "sgml"],
            FileFormat::Xml => &["xml"],
        }
    }

    /// Guess the format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        [FileFormat::Text, FileFormat::Sgml, FileFormat::Xml]
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Reject files whose extension does not match the declared format.
    pub fn check_extension<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match FileFormat::from_path(path) {
            Some(found) if found == *self => Ok(()),
            _ => Err(VersioError::validation(format!(
                "{} does not have a .{} extension",
                path.display(),
                self.extensions().join(" / .")
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Text => "text",
            FileFormat::Sgml => "sgml",
            FileFormat::Xml => "xml",
        };
        write!(f, "{name}")
    }
}

impl FromStr for FileFormat {
    type Err = VersioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(FileFormat::Text),
            "sgml" | "sgm" => Ok(FileFormat::Sgml),
            "xml" => Ok(FileFormat::Xml),
            other => Err(VersioError::validation(format!("unknown file format: {other}"))),
        }
    }
}
