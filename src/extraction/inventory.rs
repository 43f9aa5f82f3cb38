//! Pre-extraction validation of XML files.
//!
//! An [`XmlInventory`] records which source languages, reference languages,
//! translators and systems a file contains. Test-set and submission files are
//! checked against it before anything is extracted or scored.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VersioError};
use crate::extraction::xml::seg_id;

/// Languages, translators and systems found in one XML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlInventory {
    /// `lang` attributes of `src` elements.
    pub source_languages: BTreeSet<String>,
    /// `lang` attributes of `ref` elements.
    pub reference_languages: BTreeSet<String>,
    /// `translator` attributes of `ref` elements.
    pub translators: BTreeSet<String>,
    /// `system` attributes of `hyp` elements.
    pub systems: BTreeSet<String>,
    /// Number of `doc` elements, test suites included.
    pub documents: usize,
    /// Number of `doc` elements flagged as test suites.
    pub test_suites: usize,
}

impl XmlInventory {
    /// Read and inventory an XML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            VersioError::validation(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::from_xml(&contents)
    }

    /// Inventory XML source, checking the structural rules on the way:
    /// the root is `dataset`, every `doc` has an `id`, every `seg` id is a
    /// positive integer.
    pub fn from_xml(contents: &str) -> Result<Self> {
        let document = Document::parse(contents).map_err(|e| VersioError::from(e).into_validation())?;
        let root = document.root_element();
        if !root.has_tag_name("dataset") {
            return Err(VersioError::validation(format!(
                "root element must be <dataset>, found <{}>",
                root.tag_name().name()
            )));
        }

        let mut inventory = XmlInventory::default();
        for node in root.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "doc" => {
                    if node.attribute("id").is_none() {
                        return Err(VersioError::validation("doc element without id attribute"));
                    }
                    inventory.documents += 1;
                    if node.has_attribute("testsuite") {
                        inventory.test_suites += 1;
                    }
                }
                "src" => {
                    if let Some(lang) = node.attribute("lang") {
                        inventory.source_languages.insert(lang.to_string());
                    }
                }
                "ref" => {
                    if let Some(lang) = node.attribute("lang") {
                        inventory.reference_languages.insert(lang.to_string());
                    }
                    if let Some(translator) = node.attribute("translator") {
                        inventory.translators.insert(translator.to_string());
                    }
                }
                "hyp" => {
                    if let Some(system) = node.attribute("system") {
                        inventory.systems.insert(system.to_string());
                    }
                }
                "seg" => {
                    seg_id(node)?;
                }
                _ => {}
            }
        }
        Ok(inventory)
    }

    /// Check a source file: exactly one source language, matching `expected`
    /// when given. Returns that language.
    pub fn validate_source(&self, expected: Option<&str>) -> Result<&str> {
        let lang = exactly_one(&self.source_languages, "source language")?;
        if let Some(expected) = expected
            && !lang.eq_ignore_ascii_case(expected)
        {
            return Err(VersioError::validation(format!(
                "source language {lang} does not match the expected {expected}"
            )));
        }
        Ok(lang)
    }

    /// Check a reference file: at least one reference language and one
    /// translator.
    pub fn validate_reference(&self) -> Result<()> {
        if self.reference_languages.is_empty() {
            return Err(VersioError::validation("no reference language found"));
        }
        if self.translators.is_empty() {
            return Err(VersioError::validation("no reference translator found"));
        }
        Ok(())
    }

    /// Check a submission file: exactly one system. Returns the system id.
    pub fn validate_hypothesis(&self) -> Result<&str> {
        exactly_one(&self.systems, "system")
    }

    /// Translator used when a test set does not name one.
    pub fn default_translator(&self) -> Option<&str> {
        self.translators.iter().next().map(String::as_str)
    }
}

fn exactly_one<'a>(values: &'a BTreeSet<String>, what: &str) -> Result<&'a str> {
    match values.len() {
        1 => Ok(values.iter().next().map(String::as_str).unwrap_or_default()),
        0 => Err(VersioError::validation(format!("no {what} found"))),
        n => Err(VersioError::validation(format!(
            "expected exactly one {what}, found {n}: {}",
            values.iter().cloned().collect::<Vec<_>>().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SET: &str = r#"<dataset id="t">
  <doc id="d1" origlang="en">
    <src lang="en"><p><seg id="1">a</seg></p></src>
    <ref lang="de" translator="B"><p><seg id="1">b</seg></p></ref>
    <ref lang="de" translator="A"><p><seg id="1">c</seg></p></ref>
  </doc>
  <doc id="d2" origlang="en" testsuite="x">
    <src lang="en"><p><seg id="1">a</seg></p></src>
  </doc>
</dataset>"#;

    #[test]
    fn test_inventory_counts() {
        let inventory = XmlInventory::from_xml(TEST_SET).unwrap();
        assert_eq!(inventory.source_languages.len(), 1);
        assert_eq!(inventory.reference_languages.len(), 1);
        assert_eq!(inventory.translators.len(), 2);
        assert!(inventory.systems.is_empty());
        assert_eq!(inventory.documents, 2);
        assert_eq!(inventory.test_suites, 1);
        assert_eq!(inventory.default_translator(), Some("A"));
    }

    #[test]
    fn test_validate_source() {
        let inventory = XmlInventory::from_xml(TEST_SET).unwrap();
        assert_eq!(inventory.validate_source(None).unwrap(), "en");
        assert_eq!(inventory.validate_source(Some("EN")).unwrap(), "en");
        assert!(inventory.validate_source(Some("cs")).unwrap_err().is_validation());

        let two = r#"<dataset><doc id="d"><src lang="en"/><src lang="fr"/></doc></dataset>"#;
        let inventory = XmlInventory::from_xml(two).unwrap();
        assert!(inventory.validate_source(None).is_err());
    }

    #[test]
    fn test_validate_reference() {
        let inventory = XmlInventory::from_xml(TEST_SET).unwrap();
        assert!(inventory.validate_reference().is_ok());

        let no_translator = r#"<dataset><doc id="d"><ref lang="de"/></doc></dataset>"#;
        let inventory = XmlInventory::from_xml(no_translator).unwrap();
        assert!(inventory.validate_reference().is_err());
    }

    #[test]
    fn test_validate_hypothesis() {
        let one = r#"<dataset><doc id="d"><hyp system="s1"/></doc></dataset>"#;
        let inventory = XmlInventory::from_xml(one).unwrap();
        assert_eq!(inventory.validate_hypothesis().unwrap(), "s1");

        let two = r#"<dataset><doc id="d"><hyp system="s1"/><hyp system="s2"/></doc></dataset>"#;
        let inventory = XmlInventory::from_xml(two).unwrap();
        let err = inventory.validate_hypothesis().unwrap_err();
        assert!(err.to_string().contains("s1, s2"));

        let inventory = XmlInventory::from_xml(TEST_SET).unwrap();
        assert!(inventory.validate_hypothesis().is_err());
    }

    #[test]
    fn test_structure_checks() {
        assert!(XmlInventory::from_xml("<tstset/>").unwrap_err().is_validation());
        assert!(XmlInventory::from_xml("<dataset><doc/></dataset>").is_err());
        assert!(
            XmlInventory::from_xml(r#"<dataset><doc id="d"><src lang="en"><seg id="0">a</seg></src></doc></dataset>"#)
                .is_err()
        );
        assert!(XmlInventory::from_xml("not xml").unwrap_err().is_validation());
    }
}
