//! WMT XML extractor.
//!
//! Expected layout:
//!
//! ```text
//! dataset[id]
//!   collection[id]            (optional, may nest)
//!     doc[id, origlang, testsuite?]
//!       src[lang]  > p > seg[id]
//!       ref[lang, translator] > p > seg[id]
//!       hyp[system] > p > seg[id]
//! ```
//!
//! The source side defines the segment ids of each document. Reference and
//! hypothesis lines are emitted for exactly those ids, with
//! [`MISSING_TRANSLATION`] where the selected side has no segment.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use roxmltree::{Document, Node};

use crate::error::{Result, VersioError};
use crate::extraction::SegmentExtractor;
use crate::extraction::cache;
use crate::segment::{CanonicalStream, MISSING_TRANSLATION, Selector};

/// Extractor for WMT XML test sets and submissions.
#[derive(Clone, Debug, Default)]
pub struct XmlExtractor;

impl XmlExtractor {
    /// Create a new XML extractor.
    pub fn new() -> Self {
        XmlExtractor
    }
}

impl SegmentExtractor for XmlExtractor {
    fn extract(
        &self,
        path: &Path,
        selector: &Selector,
        collection: Option<&str>,
    ) -> Result<CanonicalStream> {
        let target = cache::derived_text_path(path);
        let producer = match collection {
            Some(id) => format!("{} in {id}", selector.label()),
            None => selector.label(),
        };
        cache::memoize(&target, &producer, || {
            let contents = fs::read_to_string(path)?;
            segments_from_str(&contents, selector, collection)
        })
    }

    fn name(&self) -> &'static str {
        "xml"
    }
}

/// Extract the selected side from XML source.
///
/// Returns an empty stream when `collection` names no collection in the file.
pub fn segments_from_str(
    contents: &str,
    selector: &Selector,
    collection: Option<&str>,
) -> Result<CanonicalStream> {
    let document = Document::parse(contents)?;
    let root = document.root_element();

    let scope = match collection {
        Some(id) => match find_collection(root, id) {
            Some(node) => node,
            None => {
                warn!("Collection {id} not found, no segments extracted");
                return Ok(Vec::new());
            }
        },
        None => root,
    };

    let mut lines = Vec::new();
    for doc in scope.descendants().filter(|n| n.has_tag_name("doc")) {
        if doc.has_attribute("testsuite") {
            debug!(
                "Skipping test suite document {}",
                doc.attribute("id").unwrap_or("?")
            );
            continue;
        }

        let src = side_segments(doc.children().filter(|n| n.has_tag_name("src")))?;
        let selected = match selector {
            Selector::Source => None,
            Selector::Reference(translator) => Some(
                doc.children()
                    .find(|n| n.has_tag_name("ref") && n.attribute("translator") == Some(translator.as_str())),
            ),
            Selector::Hypothesis(system) => Some(
                doc.children()
                    .find(|n| n.has_tag_name("hyp") && n.attribute("system") == Some(system.as_str())),
            ),
        };

        match selected {
            None => lines.extend(src.into_values()),
            Some(side) => {
                let side = match side {
                    Some(node) => side_segments(std::iter::once(node))?,
                    None => BTreeMap::new(),
                };
                for id in src.keys() {
                    let text = side
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| MISSING_TRANSLATION.to_string());
                    lines.push(text);
                }
            }
        }
    }

    Ok(lines)
}

/// Find the `collection` element with the given id anywhere below `root`.
pub(crate) fn find_collection<'a, 'input>(
    root: Node<'a, 'input>,
    id: &str,
) -> Option<Node<'a, 'input>> {
    root.descendants()
        .find(|n| n.has_tag_name("collection") && n.attribute("id") == Some(id))
}

/// Collect `seg` descendants of the given side elements, keyed by numeric id.
fn side_segments<'a, 'input: 'a, I>(sides: I) -> Result<BTreeMap<u32, String>>
where
    I: Iterator<Item = Node<'a, 'input>>,
{
    let mut segments = BTreeMap::new();
    for side in sides {
        for seg in side.descendants().filter(|n| n.has_tag_name("seg")) {
            segments.insert(seg_id(seg)?, seg_text(seg));
        }
    }
    Ok(segments)
}

/// Parse the positive integer `id` attribute of a `seg` element.
pub(crate) fn seg_id(seg: Node) -> Result<u32> {
    let raw = seg
        .attribute("id")
        .ok_or_else(|| VersioError::validation("seg element without id attribute"))?;
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(VersioError::validation(format!(
            "seg id {raw:?} is not a positive integer"
        ))),
    }
}

/// Concatenated text content of a `seg`, kept on one line.
fn seg_text(seg: Node) -> String {
    seg.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<dataset id="wmt21">
  <collection id="news">
    <doc id="d1" origlang="en">
      <src lang="en"><p>
        <seg id="2">Second.</seg>
        <seg id="1">First.</seg>
        <seg id="10">Tenth.</seg>
      </p></src>
      <ref lang="de" translator="A"><p>
        <seg id="1">Erstens.</seg>
        <seg id="2">Zweitens.</seg>
        <seg id="10">Zehntens.</seg>
      </p></ref>
      <hyp system="sys1"><p>
        <seg id="1">Eins.</seg>
        <seg id="10">Zehn &amp; mehr.</seg>
      </p></hyp>
    </doc>
    <doc id="ts1" origlang="en" testsuite="challenge">
      <src lang="en"><p><seg id="1">Suite.</seg></p></src>
      <hyp system="sys1"><p><seg id="1">Suite.</seg></p></hyp>
    </doc>
  </collection>
  <collection id="speech">
    <doc id="s1" origlang="en">
      <src lang="en"><p><seg id="1">Spoken.</seg></p></src>
    </doc>
  </collection>
</dataset>
"#;

    #[test]
    fn test_source_in_numeric_order() {
        let lines = segments_from_str(SAMPLE, &Selector::Source, None).unwrap();
        assert_eq!(lines, vec!["First.", "Second.", "Tenth.", "Spoken."]);
    }

    #[test]
    fn test_reference_by_translator() {
        let lines =
            segments_from_str(SAMPLE, &Selector::Reference("A".to_string()), Some("news")).unwrap();
        assert_eq!(lines, vec!["Erstens.", "Zweitens.", "Zehntens."]);
    }

    #[test]
    fn test_missing_hypothesis_segments_are_filled() {
        let lines =
            segments_from_str(SAMPLE, &Selector::Hypothesis("sys1".to_string()), Some("news"))
                .unwrap();
        assert_eq!(lines, vec!["Eins.", MISSING_TRANSLATION, "Zehn & mehr."]);
    }

    #[test]
    fn test_unknown_system_fills_every_segment() {
        let lines =
            segments_from_str(SAMPLE, &Selector::Hypothesis("other".to_string()), None).unwrap();
        assert_eq!(lines, vec![MISSING_TRANSLATION; 4]);
    }

    #[test]
    fn test_unknown_collection_is_empty() {
        let lines = segments_from_str(SAMPLE, &Selector::Source, Some("nope")).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_collection_restriction() {
        let lines = segments_from_str(SAMPLE, &Selector::Source, Some("speech")).unwrap();
        assert_eq!(lines, vec!["Spoken."]);
    }

    #[test]
    fn test_invalid_seg_id() {
        let xml = r#"<dataset><doc id="d"><src lang="en"><p><seg id="x">a</seg></p></src></doc></dataset>"#;
        let err = segments_from_str(xml, &Selector::Source, None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_malformed_xml() {
        let err = segments_from_str("<dataset><doc>", &Selector::Source, None).unwrap_err();
        assert!(matches!(err, VersioError::Xml(_)));
    }

    #[test]
    fn test_multiline_seg_stays_on_one_line() {
        let xml = "<dataset><doc id=\"d\"><src lang=\"en\"><p><seg id=\"1\">a\nb</seg></p></src></doc></dataset>";
        let lines = segments_from_str(xml, &Selector::Source, None).unwrap();
        assert_eq!(lines, vec!["a b"]);
    }

    #[test]
    fn test_xml_extractor_writes_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wmt21.en-de.xml");
        fs::write(&path, SAMPLE).unwrap();

        let lines = XmlExtractor::new()
            .extract(&path, &Selector::Source, Some("speech"))
            .unwrap();
        assert_eq!(lines, vec!["Spoken."]);
        assert_eq!(
            fs::read_to_string(dir.path().join("wmt21.en-de.txt")).unwrap(),
            "Spoken.\n"
        );
    }
}
