//! Document alignment for SGML submissions.
//!
//! SGML gives no guarantee that a submission lists its documents in the
//! reference order, or lists the same documents at all. The aligner rebuilds
//! the hypothesis in reference order, keeping only documents both sides
//! share and dropping test suites, and writes the result to a derived
//! `<stem>.filtered.sgm` file.
//!
//! Documents the hypothesis lacks are not invented here; they are filled
//! with the missing-translation sentinel when streams are paired for scoring
//! (see [`pair_with_reference`]).

use std::fs;
use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::error::{Result, VersioError};
use crate::extraction::cache;
use crate::extraction::sgml::{parse_attributes, parse_seg_line};
use crate::segment::{CanonicalStream, MISSING_TRANSLATION, Segment};

lazy_static! {
    static ref DOC_OPEN: Regex = Regex::new(r"(?i)^<doc(?P<attrs>\s[^>]*)?>").unwrap();
    static ref DOC_CLOSE: Regex = Regex::new(r"(?i)^</doc\s*>").unwrap();
    static ref SET_OPEN: Regex = Regex::new(r"(?i)^<(?P<tag>tstset|refset|srcset)\b[^>]*>").unwrap();
}

/// One `<doc>` block of an SGML file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SgmlDocument {
    /// The `docid` attribute.
    pub id: String,
    /// All attributes of the opening tag, names lower-cased.
    pub attributes: AHashMap<String, String>,
    /// Raw lines from `<doc ...>` to `</doc>`, inclusive.
    pub lines: Vec<String>,
    /// Parsed `<seg>` lines, in order. A `<seg>` without a numeric id gets
    /// its 1-based position.
    pub segments: Vec<Segment>,
}

impl SgmlDocument {
    /// Test suites carry a `testsuite` attribute or a `testsuite` id prefix.
    pub fn is_test_suite(&self) -> bool {
        self.attributes.contains_key("testsuite")
            || self.id.to_ascii_lowercase().starts_with("testsuite")
    }

    /// Lookup key for matching documents across files.
    pub fn key(&self) -> String {
        self.id.to_lowercase()
    }
}

/// A parsed SGML file: wrapper tag plus its documents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SgmlFile {
    /// Opening `<tstset ...>` (or `refset`/`srcset`) line, if any.
    pub header: Option<String>,
    /// Documents in file order.
    pub documents: Vec<SgmlDocument>,
}

impl SgmlFile {
    /// Parse SGML source.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut header = None;
        let mut documents = Vec::new();
        let mut current: Option<SgmlDocument> = None;

        for (line_no, raw) in contents.lines().enumerate() {
            let line = raw.trim();

            if let Some(caps) = DOC_OPEN.captures(line) {
                if current.is_some() {
                    return Err(VersioError::validation(format!(
                        "line {}: <doc> opened inside another <doc>",
                        line_no + 1
                    )));
                }
                let attributes = parse_attributes(caps.name("attrs").map_or("", |m| m.as_str()));
                let id = attributes.get("docid").cloned().ok_or_else(|| {
                    VersioError::validation(format!("line {}: <doc> without docid", line_no + 1))
                })?;
                current = Some(SgmlDocument {
                    id,
                    attributes,
                    lines: vec![raw.to_string()],
                    segments: Vec::new(),
                });
                continue;
            }

            match current.as_mut() {
                Some(doc) => {
                    doc.lines.push(raw.to_string());
                    if let Some(seg) = parse_seg_line(line) {
                        let segment_id = seg.id.unwrap_or(doc.segments.len() as u32 + 1);
                        doc.segments.push(Segment::new(doc.id.as_str(), segment_id, seg.text));
                    }
                    if DOC_CLOSE.is_match(line) {
                        documents.extend(current.take());
                    }
                }
                None => {
                    if header.is_none() && SET_OPEN.is_match(line) {
                        header = Some(raw.to_string());
                    }
                }
            }
        }

        if let Some(doc) = current {
            return Err(VersioError::validation(format!(
                "document {} is not closed",
                doc.id
            )));
        }

        Ok(SgmlFile { header, documents })
    }

    /// Read and parse an SGML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(&fs::read_to_string(path.as_ref())?)
    }

    /// Ids of the documents that take part in scoring, in file order.
    pub fn scored_document_ids(&self) -> Vec<&str> {
        self.documents
            .iter()
            .filter(|doc| !doc.is_test_suite())
            .map(|doc| doc.id.as_str())
            .collect()
    }

    /// Serialise back to SGML text.
    pub fn to_sgml(&self) -> String {
        let close = self
            .header
            .as_deref()
            .and_then(|h| SET_OPEN.captures(h.trim()))
            .and_then(|caps| caps.name("tag").map(|m| m.as_str().to_string()))
            .unwrap_or_else(|| "tstset".to_string());

        let mut out = String::new();
        out.push_str(self.header.as_deref().unwrap_or("<tstset>"));
        out.push('\n');
        for doc in &self.documents {
            for line in &doc.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(&format!("</{close}>\n"));
        out
    }
}

/// Rebuild `hypothesis` in the document order of `reference`.
///
/// Only non-test-suite documents present in both files survive. Documents are
/// matched on their lower-cased id.
pub fn filter_hypothesis(reference: &SgmlFile, hypothesis: &SgmlFile) -> SgmlFile {
    let by_key: AHashMap<String, &SgmlDocument> = hypothesis
        .documents
        .iter()
        .filter(|doc| !doc.is_test_suite())
        .map(|doc| (doc.key(), doc))
        .collect();

    let mut seen = AHashSet::new();
    let mut documents = Vec::new();
    for id in reference.scored_document_ids() {
        let key = id.to_lowercase();
        if !seen.insert(key.clone()) {
            continue;
        }
        match by_key.get(&key) {
            Some(doc) => documents.push((*doc).clone()),
            None => debug!("Hypothesis has no document {id}"),
        }
    }

    SgmlFile {
        header: hypothesis.header.clone(),
        documents,
    }
}

/// Write the reference-ordered hypothesis next to `hypothesis_path` and
/// return the derived path. An existing derived file is reused as is.
pub fn align_files<R: AsRef<Path>, H: AsRef<Path>>(
    reference_path: R,
    hypothesis_path: H,
) -> Result<PathBuf> {
    let hypothesis_path = hypothesis_path.as_ref();
    let target = cache::derived_sibling_path(hypothesis_path, "filtered");
    if target.exists() {
        debug!("Using cached filtered hypothesis {}", target.display());
        return Ok(target);
    }

    let reference = SgmlFile::from_path(reference_path.as_ref())?;
    let hypothesis = SgmlFile::from_path(hypothesis_path)?;
    let filtered = filter_hypothesis(&reference, &hypothesis);
    if filtered.documents.is_empty() {
        return Err(VersioError::alignment(format!(
            "{} shares no documents with the reference",
            hypothesis_path.display()
        )));
    }

    cache::write_once(&target, filtered.to_sgml().as_bytes())?;
    info!(
        "Aligned {} of {} hypothesis documents to the reference order",
        filtered.documents.len(),
        hypothesis.documents.len()
    );
    Ok(target)
}

/// Pair hypothesis and reference segments by `(document, segment id)`.
///
/// Returns `(hypothesis, reference)` streams of equal length, one entry per
/// reference segment of every scored reference document. Reference segments
/// the hypothesis lacks get [`MISSING_TRANSLATION`]; hypothesis segments
/// without a reference counterpart are dropped.
pub fn pair_with_reference(
    reference: &SgmlFile,
    hypothesis: &SgmlFile,
) -> (CanonicalStream, CanonicalStream) {
    let mut hyp_segments: AHashMap<(String, u32), &str> = AHashMap::new();
    for doc in hypothesis.documents.iter().filter(|doc| !doc.is_test_suite()) {
        for seg in &doc.segments {
            hyp_segments
                .entry((doc.key(), seg.segment_id))
                .or_insert(seg.text.as_str());
        }
    }

    let mut hyp_stream = Vec::new();
    let mut ref_stream = Vec::new();
    let mut seen = AHashSet::new();
    for doc in reference.documents.iter().filter(|doc| !doc.is_test_suite()) {
        if !seen.insert(doc.key()) {
            continue;
        }
        for seg in &doc.segments {
            let text = hyp_segments
                .get(&(doc.key(), seg.segment_id))
                .copied()
                .unwrap_or(MISSING_TRANSLATION);
            hyp_stream.push(text.to_string());
            ref_stream.push(seg.text.clone());
        }
    }
    (hyp_stream, ref_stream)
}
