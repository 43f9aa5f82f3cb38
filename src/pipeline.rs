//! Evaluation of one submission against one test set.
//!
//! The steps run in a fixed order:
//!
//! 1. **validate**: metric settings, file extensions, XML structure, SGML
//!    document structure, language and translator/system counts.
//! 2. **extract**: reference and hypothesis canonical streams.
//! 3. **align**: SGML submissions against SGML references are rebuilt in
//!    reference document order and paired segment by segment.
//! 4. **score**: BLEU and chrF with the target language's tokenizer.
//!
//! Problems with the input files (unreadable, malformed, wrong encoding) are
//! returned as validation errors from any of the first three steps. Only a
//! failure of the metrics themselves, such as streams of different lengths,
//! is recorded as a failed score. A reference without segments (for
//! instance an unknown collection) leaves the score pending.

use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::alignment::{SgmlFile, align_files, pair_with_reference};
use crate::analysis::language::{TokenizerKind, tokenizer_for};
use crate::config::{SubmissionConfig, TestSetConfig};
use crate::error::{Result, VersioError};
use crate::extraction::extract;
use crate::extraction::inventory::XmlInventory;
use crate::scoring::{ScoreComputer, ScoreOutcome, ScoreRecord, ScoreState, SubmissionScore};
use crate::segment::{CanonicalStream, FileFormat, Selector};

/// Translator and system resolved during validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validated {
    pub translator: Option<String>,
    pub system: Option<String>,
}

/// Equal-length hypothesis and reference streams.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignedStreams {
    pub hypothesis: CanonicalStream,
    pub reference: CanonicalStream,
}

impl AlignedStreams {
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }
}

/// One side of an evaluation: a file, its format and the side to read.
#[derive(Clone, Debug)]
pub struct StreamSource<'a> {
    pub path: &'a Path,
    pub format: FileFormat,
    pub selector: Selector,
}

impl<'a> StreamSource<'a> {
    pub fn new(path: &'a Path, format: FileFormat, selector: Selector) -> Self {
        StreamSource { path, format, selector }
    }
}

/// Build the hypothesis and reference streams to score.
///
/// Two SGML files are aligned by document and paired by segment id; any
/// other combination is extracted side by side. Every error is reported as a
/// validation error.
pub fn aligned_streams(
    reference: &StreamSource<'_>,
    hypothesis: &StreamSource<'_>,
    collection: Option<&str>,
) -> Result<AlignedStreams> {
    let streams = if reference.format == FileFormat::Sgml && hypothesis.format == FileFormat::Sgml {
        align_sgml(reference.path, hypothesis.path)
    } else {
        extract(reference.path, reference.format, &reference.selector, collection).and_then(|reference| {
            let hypothesis = extract(hypothesis.path, hypothesis.format, &hypothesis.selector, collection)?;
            Ok(AlignedStreams { hypothesis, reference })
        })
    };
    streams.map_err(VersioError::into_validation)
}

fn align_sgml(reference_path: &Path, hypothesis_path: &Path) -> Result<AlignedStreams> {
    let filtered = align_files(reference_path, hypothesis_path)?;
    let reference = SgmlFile::from_path(reference_path)?;
    let hypothesis = SgmlFile::from_path(&filtered)?;
    let (hypothesis, reference) = pair_with_reference(&reference, &hypothesis);
    Ok(AlignedStreams { hypothesis, reference })
}

/// Outcome of [`Evaluator::evaluate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub test_set: String,
    pub submission: String,
    pub translator: Option<String>,
    pub system: Option<String>,
    pub tokenizer: TokenizerKind,
    /// Number of scored segments; zero when scoring did not run.
    pub segments: usize,
    pub score: ScoreRecord,
    /// Why scoring failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Evaluation {
    pub fn state(&self) -> ScoreState {
        self.score.into()
    }
}

/// Runs the evaluation steps for submissions to one test set.
#[derive(Debug)]
pub struct Evaluator {
    test_set: TestSetConfig,
    computer: ScoreComputer,
}

impl Evaluator {
    pub fn new(test_set: TestSetConfig) -> Self {
        let computer = ScoreComputer::with_configs(
            tokenizer_for(&test_set.target_language),
            test_set.bleu.clone(),
            test_set.chrf.clone(),
        );
        Evaluator { test_set, computer }
    }

    pub fn test_set(&self) -> &TestSetConfig {
        &self.test_set
    }

    pub fn computer(&self) -> &ScoreComputer {
        &self.computer
    }

    /// Check the test-set files and the submission before anything is
    /// extracted.
    pub fn validate(&self, submission: &SubmissionConfig) -> Result<Validated> {
        let test_set = &self.test_set;
        test_set.validate()?;
        if let Some(name) = &submission.test_set
            && name != &test_set.name
        {
            return Err(VersioError::validation(format!(
                "submission {} was made for test set {name}, not {}",
                submission.name, test_set.name
            )));
        }
        test_set.file_format.check_extension(&test_set.src_file)?;
        test_set.file_format.check_extension(&test_set.ref_file)?;
        submission.file_format.check_extension(&submission.hyp_file)?;

        let mut validated = Validated::default();

        if test_set.file_format == FileFormat::Xml {
            let source = XmlInventory::from_path(&test_set.src_file)?;
            source.validate_source(Some(&test_set.source_language))?;

            let reference = if test_set.ref_file == test_set.src_file {
                source
            } else {
                XmlInventory::from_path(&test_set.ref_file)?
            };
            reference.validate_reference()?;
            let translator = match &test_set.translator {
                Some(translator) if reference.translators.contains(translator) => translator.clone(),
                Some(translator) => {
                    return Err(VersioError::validation(format!(
                        "translator {translator} not found in {}",
                        test_set.ref_file.display()
                    )));
                }
                None => reference
                    .default_translator()
                    .map(str::to_string)
                    .ok_or_else(|| VersioError::validation("no reference translator found"))?,
            };
            debug!("Using reference translator {translator}");
            validated.translator = Some(translator);
        }

        match submission.file_format {
            FileFormat::Xml => {
                let hypothesis = XmlInventory::from_path(&submission.hyp_file)?;
                let system = hypothesis.validate_hypothesis()?;
                if let Some(expected) = &submission.system
                    && expected != system
                {
                    return Err(VersioError::validation(format!(
                        "submission declares system {expected} but the file contains {system}"
                    )));
                }
                validated.system = Some(system.to_string());
            }
            FileFormat::Sgml => {
                let hypothesis =
                    SgmlFile::from_path(&submission.hyp_file).map_err(VersioError::into_validation)?;
                debug!(
                    "{} holds {} SGML documents",
                    submission.hyp_file.display(),
                    hypothesis.documents.len()
                );
                validated.system = submission.system.clone();
            }
            FileFormat::Text => validated.system = submission.system.clone(),
        }

        Ok(validated)
    }

    /// Extract and align the streams to be scored.
    pub fn streams(&self, submission: &SubmissionConfig, validated: &Validated) -> Result<AlignedStreams> {
        let test_set = &self.test_set;
        let reference = StreamSource::new(
            &test_set.ref_file,
            test_set.file_format,
            Selector::Reference(validated.translator.clone().unwrap_or_default()),
        );
        let hypothesis = StreamSource::new(
            &submission.hyp_file,
            submission.file_format,
            Selector::Hypothesis(validated.system.clone().unwrap_or_default()),
        );
        aligned_streams(&reference, &hypothesis, test_set.collection.as_deref())
    }

    /// Score the submission; `None` when the reference has no segments.
    fn compute(
        &self,
        submission: &SubmissionConfig,
        validated: &Validated,
    ) -> Result<Option<(usize, ScoreOutcome)>> {
        let streams = self.streams(submission, validated)?;
        if streams.is_empty() {
            warn!(
                "No reference segments for {} in {}, leaving the score pending",
                submission.name, self.test_set.name
            );
            return Ok(None);
        }
        let outcome = self.computer.score(&streams.hypothesis, &streams.reference);
        Ok(Some((streams.len(), outcome)))
    }

    /// Validate, extract, align and score one submission.
    ///
    /// Input errors are returned. With scores disabled on the test set,
    /// nothing past validation runs and the score stays pending.
    pub fn evaluate(&self, submission: &SubmissionConfig) -> Result<Evaluation> {
        let mut score = SubmissionScore::pending();
        self.evaluate_into(submission, &mut score)
    }

    /// Like [`Evaluator::evaluate`], recording into an existing score. A
    /// score that is already terminal is left alone and nothing is computed.
    /// On error the score is not touched.
    pub fn evaluate_into(
        &self,
        submission: &SubmissionConfig,
        score: &mut SubmissionScore,
    ) -> Result<Evaluation> {
        let validated = self.validate(submission)?;
        let mut segments = 0;
        let mut failure = None;

        if !self.test_set.compute_scores {
            debug!("Scores disabled for {}, skipping {}", self.test_set.name, submission.name);
        } else if !score.needs_scoring() {
            debug!("{} already has a final score", submission.name);
        } else if let Some((count, outcome)) = self.compute(submission, &validated)? {
            segments = count;
            if let ScoreOutcome::Failed(reason) = &outcome {
                failure = Some(reason.clone());
            }
            score.record(outcome);
            info!(
                "Evaluated {} on {}: {:?}",
                submission.name,
                self.test_set.name,
                score.state()
            );
        }

        Ok(Evaluation {
            test_set: self.test_set.name.clone(),
            submission: submission.name.clone(),
            translator: validated.translator,
            system: validated.system,
            tokenizer: self.computer.tokenizer(),
            segments,
            score: score.record_value(),
            failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const REFERENCE_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<dataset id="test">
  <doc id="d1" origlang="en">
    <src lang="en"><p><seg id="1">Hello world</seg><seg id="2">Good morning</seg></p></src>
    <ref lang="de" translator="B"><p><seg id="1">Hallo Welt</seg><seg id="2">Guten Morgen</seg></p></ref>
    <ref lang="de" translator="A"><p><seg id="1">Hallo, Welt</seg><seg id="2">Guten Morgen</seg></p></ref>
  </doc>
</dataset>
"#;

    fn hypothesis_xml(system: &str) -> String {
        format!(
            r#"<dataset id="test">
  <doc id="d1" origlang="en">
    <src lang="en"><p><seg id="1">Hello world</seg><seg id="2">Good morning</seg></p></src>
    <hyp system="{system}"><p><seg id="1">Hallo Welt</seg><seg id="2">Guten Morgen</seg></p></hyp>
  </doc>
</dataset>
"#
        )
    }

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn xml_test_set(dir: &Path) -> TestSetConfig {
        let path = write(dir, "test.xml", REFERENCE_XML);
        TestSetConfig::new("test", "en", "de", FileFormat::Xml, path.clone(), path)
    }

    #[test]
    fn test_default_translator_is_first() {
        let dir = TempDir::new().unwrap();
        let hyp = write(dir.path(), "hyp.xml", &hypothesis_xml("sys"));
        let evaluator = Evaluator::new(xml_test_set(dir.path()));

        let submission = SubmissionConfig::new("run", FileFormat::Xml, hyp);
        let validated = evaluator.validate(&submission).unwrap();
        assert_eq!(validated.translator.as_deref(), Some("A"));
        assert_eq!(validated.system.as_deref(), Some("sys"));
    }

    #[test]
    fn test_evaluate_xml() {
        let dir = TempDir::new().unwrap();
        let hyp = write(dir.path(), "hyp.xml", &hypothesis_xml("sys"));
        let evaluator = Evaluator::new(xml_test_set(dir.path()).with_translator("B"));

        let evaluation = evaluator
            .evaluate(&SubmissionConfig::new("run", FileFormat::Xml, hyp))
            .unwrap();
        assert_eq!(evaluation.segments, 2);
        match evaluation.state() {
            ScoreState::Scored(scores) => assert!((scores.chrf - 100.0).abs() < 1e-9),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_wrong_source_language_is_rejected() {
        let dir = TempDir::new().unwrap();
        let hyp = write(dir.path(), "hyp.xml", &hypothesis_xml("sys"));
        let mut test_set = xml_test_set(dir.path());
        test_set.source_language = "fr".to_string();

        let err = Evaluator::new(test_set)
            .evaluate(&SubmissionConfig::new("run", FileFormat::Xml, hyp))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_system_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let hyp = write(dir.path(), "hyp.xml", &hypothesis_xml("sys"));
        let submission = SubmissionConfig::new("run", FileFormat::Xml, hyp).with_system("other");

        let err = Evaluator::new(xml_test_set(dir.path()))
            .evaluate(&submission)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_scores_disabled_stay_pending() {
        let dir = TempDir::new().unwrap();
        let hyp = write(dir.path(), "hyp.xml", &hypothesis_xml("sys"));
        let evaluator = Evaluator::new(xml_test_set(dir.path()).with_compute_scores(false));

        let evaluation = evaluator
            .evaluate(&SubmissionConfig::new("run", FileFormat::Xml, hyp))
            .unwrap();
        assert_eq!(evaluation.score, ScoreRecord::default());
        assert_eq!(evaluation.segments, 0);
        assert!(!dir.path().join("hyp.txt").exists());
    }

    #[test]
    fn test_degenerate_metrics_are_rejected() {
        let dir = TempDir::new().unwrap();
        let reference = write(dir.path(), "ref.txt", "eins\n");
        let hyp = write(dir.path(), "hyp.txt", "eins\n");
        let test_set =
            TestSetConfig::new("plain", "en", "de", FileFormat::Text, reference.clone(), reference)
                .with_chrf(crate::metrics::ChrfConfig::default().with_beta(f64::NAN));

        let mut score = SubmissionScore::pending();
        let err = Evaluator::new(test_set)
            .evaluate_into(&SubmissionConfig::new("run", FileFormat::Text, hyp), &mut score)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(score.needs_scoring());
    }

    #[test]
    fn test_length_mismatch_becomes_failure() {
        let dir = TempDir::new().unwrap();
        let reference = write(dir.path(), "ref.txt", "eins\nzwei\n");
        let hyp = write(dir.path(), "hyp.txt", "eins\n");
        let test_set =
            TestSetConfig::new("plain", "en", "de", FileFormat::Text, reference.clone(), reference);

        let evaluation = Evaluator::new(test_set)
            .evaluate(&SubmissionConfig::new("run", FileFormat::Text, hyp))
            .unwrap();
        assert_eq!(evaluation.state(), ScoreState::Failed);
        assert_eq!(evaluation.score.bleu, Some(-1.0));
        assert!(evaluation.failure.is_some());
    }

    #[test]
    fn test_terminal_score_is_not_recomputed() {
        let dir = TempDir::new().unwrap();
        let reference = write(dir.path(), "ref.txt", "eins\n");
        let hyp = write(dir.path(), "hyp.txt", "eins\n");
        let test_set =
            TestSetConfig::new("plain", "en", "de", FileFormat::Text, reference.clone(), reference);
        let evaluator = Evaluator::new(test_set);
        let submission = SubmissionConfig::new("run", FileFormat::Text, hyp);

        let mut score = SubmissionScore::pending();
        score.record(ScoreOutcome::Failed("earlier".into()));
        let evaluation = evaluator.evaluate_into(&submission, &mut score).unwrap();
        assert_eq!(evaluation.state(), ScoreState::Failed);

        score.reset();
        let evaluation = evaluator.evaluate_into(&submission, &mut score).unwrap();
        assert!(matches!(evaluation.state(), ScoreState::Scored(_)));
    }
}
