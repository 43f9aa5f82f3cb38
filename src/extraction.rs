//! Format extractors.
//!
//! Turn a test-set or submission file into a [`CanonicalStream`]. Each
//! [`FileFormat`] variant is backed by one [`SegmentExtractor`]
//! implementation; [`extract`] picks it once at the boundary.
//!
//! # Available Extractors
//!
//! - [`text::TextExtractor`] - one segment per line, no cache
//! - [`sgml::SgmlExtractor`] - `<seg>` lines, cached to a derived `.txt`
//! - [`xml::XmlExtractor`] - WMT XML tree, cached to a derived `.txt`
//!
//! # Examples
//!
//! ```no_run
//! use versio::extraction::extract;
//! use versio::segment::{FileFormat, Selector};
//!
//! let lines = extract(
//!     "newstest2021.en-de.all.xml",
//!     FileFormat::Xml,
//!     &Selector::Reference("A".to_string()),
//!     None,
//! )
//! .unwrap();
//! println!("{} reference segments", lines.len());
//! ```

use std::path::Path;

use log::info;

use crate::error::{Result, VersioError};
use crate::extraction::inventory::XmlInventory;
use crate::segment::{CanonicalStream, FileFormat, Selector};

pub mod cache;
pub mod inventory;
pub mod sgml;
pub mod text;
pub mod xml;

/// Trait for format-specific segment extraction.
///
/// Implementations must return either a complete stream or an error, never a
/// partial one, and must be idempotent: a second call on the same inputs
/// yields the same lines.
pub trait SegmentExtractor: Send + Sync {
    /// Extract the selected side of `path`, optionally restricted to one
    /// collection of documents.
    fn extract(
        &self,
        path: &Path,
        selector: &Selector,
        collection: Option<&str>,
    ) -> Result<CanonicalStream>;

    /// Get the name of this extractor (for logging).
    fn name(&self) -> &'static str;
}

/// Extract the selected side of a file in the declared format.
///
/// The file extension must agree with `format`. Every failure, including I/O
/// and XML parse errors, is reported as a validation error.
pub fn extract<P: AsRef<Path>>(
    path: P,
    format: FileFormat,
    selector: &Selector,
    collection: Option<&str>,
) -> Result<CanonicalStream> {
    let path = path.as_ref();
    format.check_extension(path)?;

    let lines = match format {
        FileFormat::Text => text::TextExtractor::new().extract(path, selector, collection),
        FileFormat::Sgml => sgml::SgmlExtractor::new().extract(path, selector, collection),
        FileFormat::Xml => xml::XmlExtractor::new().extract(path, selector, collection),
    }
    .map_err(|e| e.into_validation())?;

    info!(
        "Extracted {} {} segments from {}",
        lines.len(),
        selector.label(),
        path.display()
    );
    Ok(lines)
}

/// Selector for the hypothesis side of a submission file.
///
/// An XML file without an explicit system must contain exactly one; other
/// formats hold a single side and ignore the system.
pub fn hypothesis_selector<P: AsRef<Path>>(
    path: P,
    format: FileFormat,
    system: Option<&str>,
) -> Result<Selector> {
    let system = match (format, system) {
        (_, Some(system)) => system.to_string(),
        (FileFormat::Xml, None) => XmlInventory::from_path(path.as_ref())
            .and_then(|inventory| inventory.validate_hypothesis().map(str::to_string))
            .map_err(VersioError::into_validation)?,
        (_, None) => String::new(),
    };
    Ok(Selector::Hypothesis(system))
}

/// Selector for the reference side of a test-set file.
///
/// An XML file without an explicit translator uses its default translator.
pub fn reference_selector<P: AsRef<Path>>(
    path: P,
    format: FileFormat,
    translator: Option<&str>,
) -> Result<Selector> {
    let translator = match (format, translator) {
        (_, Some(translator)) => translator.to_string(),
        (FileFormat::Xml, None) => {
            let inventory =
                XmlInventory::from_path(path.as_ref()).map_err(VersioError::into_validation)?;
            inventory
                .default_translator()
                .map(str::to_string)
                .ok_or_else(|| VersioError::validation("no reference translator found"))?
        }
        (_, None) => String::new(),
    };
    Ok(Selector::Reference(translator))
}

/// Extract the hypothesis of a submission file, resolving the system as
/// [`hypothesis_selector`] does.
pub fn extract_hypothesis<P: AsRef<Path>>(
    path: P,
    format: FileFormat,
    system: Option<&str>,
) -> Result<CanonicalStream> {
    let selector = hypothesis_selector(path.as_ref(), format, system)?;
    extract(path, format, &selector, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hyp.txt");
        fs::write(&path, "a\n").unwrap();

        let err = extract(&path, FileFormat::Xml, &Selector::Source, None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_extract_missing_file_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.sgm");

        let err = extract(&path, FileFormat::Sgml, &Selector::Source, None).unwrap_err();
        assert!(err.is_validation());
        assert!(!cache::derived_text_path(&path).exists());
    }

    #[test]
    fn test_extract_dispatches_on_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hyp.txt");
        fs::write(&path, "eins  \nzwei\n").unwrap();

        let lines = extract(&path, FileFormat::Text, &Selector::Source, None).unwrap();
        assert_eq!(lines, vec!["eins", "zwei"]);
    }

    const HYPOTHESIS_XML: &str = r#"<dataset id="t">
  <doc id="d1" origlang="en">
    <src lang="en"><p><seg id="1">Hello</seg></p></src>
    <ref lang="de" translator="B"><p><seg id="1">Hallo</seg></p></ref>
    <ref lang="de" translator="A"><p><seg id="1">Hallo!</seg></p></ref>
    <hyp system="sys"><p><seg id="1">Hallo du</seg></p></hyp>
  </doc>
</dataset>
"#;

    #[test]
    fn test_selectors_default_from_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.xml");
        fs::write(&path, HYPOTHESIS_XML).unwrap();

        assert_eq!(
            hypothesis_selector(&path, FileFormat::Xml, None).unwrap(),
            Selector::Hypothesis("sys".to_string())
        );
        assert_eq!(
            reference_selector(&path, FileFormat::Xml, None).unwrap(),
            Selector::Reference("A".to_string())
        );
        assert_eq!(
            reference_selector(&path, FileFormat::Xml, Some("B")).unwrap(),
            Selector::Reference("B".to_string())
        );
        assert_eq!(extract_hypothesis(&path, FileFormat::Xml, None).unwrap(), vec!["Hallo du"]);
    }

    #[test]
    fn test_selectors_ignore_single_side_formats() {
        let path = Path::new("missing.sgm");
        assert_eq!(
            hypothesis_selector(path, FileFormat::Sgml, None).unwrap(),
            Selector::Hypothesis(String::new())
        );
        assert_eq!(
            reference_selector(path, FileFormat::Text, None).unwrap(),
            Selector::Reference(String::new())
        );
    }
}
