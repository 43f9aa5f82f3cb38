//! Test-set and submission descriptors.
//!
//! Both are plain serde structs loaded from JSON. Relative file paths in a
//! JSON file are resolved against the directory that contains it.
//!
//! # Examples
//!
//! ```
//! use versio::config::TestSetConfig;
//! use versio::segment::FileFormat;
//!
//! let json = r#"{
//!     "name": "newstest2021",
//!     "source_language": "en",
//!     "target_language": "de",
//!     "file_format": "xml",
//!     "src_file": "newstest2021.en-de.xml",
//!     "ref_file": "newstest2021.en-de.xml"
//! }"#;
//! let config = TestSetConfig::from_json_str(json).unwrap();
//! assert_eq!(config.file_format, FileFormat::Xml);
//! assert!(config.compute_scores);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VersioError};
use crate::metrics::{BleuConfig, ChrfConfig};
use crate::segment::FileFormat;

fn default_compute_scores() -> bool {
    true
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VersioError::validation(format!("cannot read config {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// A competition test set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestSetConfig {
    pub name: String,
    pub source_language: String,
    pub target_language: String,
    pub file_format: FileFormat,
    pub src_file: PathBuf,
    pub ref_file: PathBuf,
    /// Restrict extraction to one collection of the XML files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Reference translator; the first one in the file when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
    /// When false, submissions are never scored and rank by time only.
    #[serde(default = "default_compute_scores")]
    pub compute_scores: bool,
    #[serde(default)]
    pub bleu: BleuConfig,
    #[serde(default)]
    pub chrf: ChrfConfig,
}

impl TestSetConfig {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(
        name: S,
        source_language: S,
        target_language: S,
        file_format: FileFormat,
        src_file: P,
        ref_file: P,
    ) -> Self {
        TestSetConfig {
            name: name.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            file_format,
            src_file: src_file.into(),
            ref_file: ref_file.into(),
            collection: None,
            translator: None,
            compute_scores: true,
            bleu: BleuConfig::default(),
            chrf: ChrfConfig::default(),
        }
    }

    pub fn with_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_translator<S: Into<String>>(mut self, translator: S) -> Self {
        self.translator = Some(translator.into());
        self
    }

    pub fn with_compute_scores(mut self, compute_scores: bool) -> Self {
        self.compute_scores = compute_scores;
        self
    }

    pub fn with_bleu(mut self, bleu: BleuConfig) -> Self {
        self.bleu = bleu;
        self
    }

    pub fn with_chrf(mut self, chrf: ChrfConfig) -> Self {
        self.chrf = chrf;
        self
    }

    /// Check the metric settings.
    pub fn validate(&self) -> Result<()> {
        self.bleu.validate()?;
        self.chrf.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TestSetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file, resolving relative paths against its directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: TestSetConfig = read_json(path)?;
        config.validate()?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.src_file = resolve(base, &config.src_file);
        config.ref_file = resolve(base, &config.ref_file);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One uploaded submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub name: String,
    pub file_format: FileFormat,
    pub hyp_file: PathBuf,
    /// System id to select; taken from the file when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Name of the test set this submission was made for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_set: Option<String>,
}

impl SubmissionConfig {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, file_format: FileFormat, hyp_file: P) -> Self {
        SubmissionConfig {
            name: name.into(),
            file_format,
            hyp_file: hyp_file.into(),
            system: None,
            test_set: None,
        }
    }

    pub fn with_system<S: Into<String>>(mut self, system: S) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_test_set<S: Into<String>>(mut self, test_set: S) -> Self {
        self.test_set = Some(test_set.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file, resolving a relative `hyp_file` against its
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: SubmissionConfig = read_json(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.hyp_file = resolve(base, &config.hyp_file);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Smoothing;
    use tempfile::TempDir;

    #[test]
    fn test_test_set_defaults() {
        let json = r#"{
            "name": "wmt",
            "source_language": "en",
            "target_language": "zh",
            "file_format": "sgml",
            "src_file": "src.sgm",
            "ref_file": "ref.sgm"
        }"#;
        let config = TestSetConfig::from_json_str(json).unwrap();
        assert!(config.compute_scores);
        assert!(config.collection.is_none());
        assert_eq!(config.bleu, BleuConfig::default());
        assert_eq!(config.chrf.char_order, 6);
    }

    #[test]
    fn test_metric_overrides() {
        let json = r#"{
            "name": "wmt",
            "source_language": "en",
            "target_language": "de",
            "file_format": "text",
            "src_file": "src.txt",
            "ref_file": "ref.txt",
            "compute_scores": false,
            "bleu": { "smooth": { "floor": 0.1 }, "lowercase": true }
        }"#;
        let config = TestSetConfig::from_json_str(json).unwrap();
        assert!(!config.compute_scores);
        assert_eq!(config.bleu.smooth, Smoothing::Floor(0.1));
        assert!(config.bleu.lowercase);
        assert_eq!(config.bleu.max_ngram_order, 4);
    }

    #[test]
    fn test_degenerate_metric_settings_are_rejected() {
        let base = r#""name": "wmt", "source_language": "en", "target_language": "de",
            "file_format": "text", "src_file": "src.txt", "ref_file": "ref.txt""#;
        for metrics in [
            r#""bleu": { "max_ngram_order": 0 }"#,
            r#""bleu": { "smooth": { "floor": -1.0 } }"#,
            r#""chrf": { "char_order": 0 }"#,
            r#""chrf": { "beta": -2.0 }"#,
        ] {
            let json = format!("{{ {base}, {metrics} }}");
            let err = TestSetConfig::from_json_str(&json).unwrap_err();
            assert!(err.is_validation(), "{metrics}: {err}");
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("testset.json");
        fs::write(&path, format!("{{ {base}, \"bleu\": {{ \"max_ngram_order\": 0 }} }}")).unwrap();
        assert!(TestSetConfig::from_file(&path).unwrap_err().is_validation());
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("testset.json");
        let config = TestSetConfig::new("t", "en", "de", FileFormat::Xml, "a.xml", "b.xml")
            .with_collection("general");
        fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = TestSetConfig::from_file(&path).unwrap();
        assert_eq!(loaded.src_file, dir.path().join("a.xml"));
        assert_eq!(loaded.ref_file, dir.path().join("b.xml"));
        assert_eq!(loaded.collection.as_deref(), Some("general"));
    }

    #[test]
    fn test_submission_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub.json");
        let submission = SubmissionConfig::new("run1", FileFormat::Sgml, "/abs/hyp.sgm")
            .with_system("sys-A")
            .with_test_set("newstest2019");
        fs::write(&path, submission.to_json().unwrap()).unwrap();

        let loaded = SubmissionConfig::from_file(&path).unwrap();
        assert_eq!(loaded, submission);
    }

    #[test]
    fn test_missing_file_is_validation_error() {
        let err = SubmissionConfig::from_file("/nonexistent/sub.json").unwrap_err();
        assert!(err.is_validation());
    }
}
