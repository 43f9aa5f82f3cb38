//! Pairwise human judgements between two submissions.
//!
//! Two submissions can be compared only when they were made for the same
//! test set. A [`Comparison`] lines their outputs up segment by segment, and
//! a judge records which of the two segments on a line is better as a
//! [`PairwiseRanking`].
//!
//! # Examples
//!
//! ```
//! use versio::ranking::PairwiseRank;
//!
//! let rank: PairwiseRank = "A>B".parse().unwrap();
//! assert_eq!(rank, PairwiseRank::Better);
//! assert_eq!(rank.reversed().to_string(), "A<B");
//! ```

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SubmissionConfig;
use crate::diff::{DiffMode, DiffRow, annotate_streams};
use crate::error::{Result, VersioError};
use crate::extraction::extract_hypothesis;

/// Verdict on one line: how segment A compares to segment B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairwiseRank {
    #[serde(rename = "A>B")]
    Better,
    #[serde(rename = "A<B")]
    Worse,
    #[serde(rename = "A=B")]
    Equal,
}

impl PairwiseRank {
    pub fn symbol(&self) -> &'static str {
        match self {
            PairwiseRank::Better => "A>B",
            PairwiseRank::Worse => "A<B",
            PairwiseRank::Equal => "A=B",
        }
    }

    /// The same verdict with A and B swapped.
    pub fn reversed(self) -> Self {
        match self {
            PairwiseRank::Better => PairwiseRank::Worse,
            PairwiseRank::Worse => PairwiseRank::Better,
            PairwiseRank::Equal => PairwiseRank::Equal,
        }
    }
}

impl fmt::Display for PairwiseRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for PairwiseRank {
    type Err = VersioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a>b" | "better" => Ok(PairwiseRank::Better),
            "a<b" | "worse" => Ok(PairwiseRank::Worse),
            "a=b" | "equal" => Ok(PairwiseRank::Equal),
            other => Err(VersioError::validation(format!(
                "unknown rank {other}, expected A>B, A<B or A=B"
            ))),
        }
    }
}

/// Name of the test set both submissions were made for.
///
/// Fails when either submission does not name its test set, or when they
/// name different ones.
pub fn check_same_test_set(a: &SubmissionConfig, b: &SubmissionConfig) -> Result<String> {
    match (&a.test_set, &b.test_set) {
        (Some(left), Some(right)) if left == right => Ok(left.clone()),
        (Some(left), Some(right)) => Err(VersioError::validation(format!(
            "submissions {} and {} cannot be compared: test sets {left} and {right} differ",
            a.name, b.name
        ))),
        _ => Err(VersioError::validation(format!(
            "submissions {} and {} cannot be compared without their test sets",
            a.name, b.name
        ))),
    }
}

/// One judgement of segment A against segment B.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseRanking {
    pub rank: PairwiseRank,
    pub test_set: String,
    pub submission_a: String,
    pub submission_b: String,
    /// Team or person who made the judgement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    /// 1-based segment number in the test set.
    pub line_number: usize,
    pub segment_a: String,
    pub segment_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_segment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PairwiseRanking {
    /// Create a checked judgement, timestamped now.
    pub fn new<S: Into<String>>(
        rank: PairwiseRank,
        test_set: S,
        submission_a: S,
        submission_b: S,
        line_number: usize,
        segment_a: S,
        segment_b: S,
    ) -> Result<Self> {
        let ranking = PairwiseRanking {
            rank,
            test_set: test_set.into(),
            submission_a: submission_a.into(),
            submission_b: submission_b.into(),
            submitted_by: None,
            line_number,
            segment_a: segment_a.into(),
            segment_b: segment_b.into(),
            src_segment: None,
            ref_segment: None,
            created_at: Utc::now(),
        };
        ranking.validate()?;
        Ok(ranking)
    }

    pub fn with_judge<S: Into<String>>(mut self, judge: S) -> Self {
        self.submitted_by = Some(judge.into());
        self
    }

    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.src_segment = Some(source.into());
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.ref_segment = Some(reference.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check a judgement read back from storage.
    pub fn validate(&self) -> Result<()> {
        if self.line_number == 0 {
            return Err(VersioError::validation("line numbers start at 1"));
        }
        if self.segment_a.trim().is_empty() || self.segment_b.trim().is_empty() {
            return Err(VersioError::validation("segments A and B must not be blank"));
        }
        if self.test_set.is_empty() {
            return Err(VersioError::validation(
                "segments A and B must come from the same test set",
            ));
        }
        Ok(())
    }

    /// The same judgement seen from B's side.
    pub fn swapped(&self) -> Self {
        PairwiseRanking {
            rank: self.rank.reversed(),
            submission_a: self.submission_b.clone(),
            submission_b: self.submission_a.clone(),
            segment_a: self.segment_b.clone(),
            segment_b: self.segment_a.clone(),
            ..self.clone()
        }
    }
}

impl fmt::Display for PairwiseRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PairwiseRanking(rank={}, A={}, B={}, line={}, testset={})",
            self.rank, self.submission_a, self.submission_b, self.line_number, self.test_set
        )
    }
}

/// Two submissions to the same test set, lined up segment by segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub test_set: String,
    pub submission_a: String,
    pub submission_b: String,
    pub rows: Vec<DiffRow>,
}

impl Comparison {
    /// Row for a 1-based line number.
    pub fn row(&self, line_number: usize) -> Option<&DiffRow> {
        line_number.checked_sub(1).and_then(|index| self.rows.get(index))
    }

    /// Record a verdict on one line of this comparison.
    pub fn judge(&self, line_number: usize, rank: PairwiseRank) -> Result<PairwiseRanking> {
        let row = self.row(line_number).ok_or_else(|| {
            VersioError::validation(format!(
                "line {line_number} is outside the {} compared segments",
                self.rows.len()
            ))
        })?;
        PairwiseRanking::new(
            rank,
            self.test_set.as_str(),
            self.submission_a.as_str(),
            self.submission_b.as_str(),
            row.line,
            row.a.as_str(),
            row.b.as_str(),
        )
    }
}

/// Line up two submissions after checking they share a test set.
pub fn compare(a: &SubmissionConfig, b: &SubmissionConfig, mode: DiffMode) -> Result<Comparison> {
    let test_set = check_same_test_set(a, b)?;
    let output_a = extract_hypothesis(&a.hyp_file, a.file_format, a.system.as_deref())?;
    let output_b = extract_hypothesis(&b.hyp_file, b.file_format, b.system.as_deref())?;
    if output_a.len() != output_b.len() {
        debug!(
            "{} has {} segments and {} has {}, comparing the common prefix",
            a.name,
            output_a.len(),
            b.name,
            output_b.len()
        );
    }

    Ok(Comparison {
        test_set,
        submission_a: a.name.clone(),
        submission_b: b.name.clone(),
        rows: annotate_streams(&output_a, &output_b, mode),
    })
}

/// Verdict counts for one pair of submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTally {
    pub better: usize,
    pub worse: usize,
    pub equal: usize,
}

impl RankTally {
    /// Count the judgements between `a` and `b`, turning those recorded the
    /// other way round to A's side. Other pairs and test sets are skipped.
    pub fn between<'a, I>(rankings: I, test_set: &str, a: &str, b: &str) -> Self
    where
        I: IntoIterator<Item = &'a PairwiseRanking>,
    {
        let mut tally = RankTally::default();
        for ranking in rankings {
            if ranking.test_set != test_set {
                continue;
            }
            let rank = if ranking.submission_a == a && ranking.submission_b == b {
                ranking.rank
            } else if ranking.submission_a == b && ranking.submission_b == a {
                ranking.rank.reversed()
            } else {
                continue;
            };
            tally.add(rank);
        }
        tally
    }

    pub fn add(&mut self, rank: PairwiseRank) {
        match rank {
            PairwiseRank::Better => self.better += 1,
            PairwiseRank::Worse => self.worse += 1,
            PairwiseRank::Equal => self.equal += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.better + self.worse + self.equal
    }
}

/// Read judgements stored one JSON object per line. A missing file holds
/// none.
pub fn load_rankings<P: AsRef<Path>>(path: P) -> Result<Vec<PairwiseRanking>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rankings = Vec::new();
    for (line_no, line) in fs::read_to_string(path)?.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let ranking: PairwiseRanking = serde_json::from_str(line).map_err(|e| {
            VersioError::validation(format!("{}:{}: {e}", path.display(), line_no + 1))
        })?;
        ranking.validate()?;
        rankings.push(ranking);
    }
    Ok(rankings)
}

/// Append one judgement to a JSON-lines file.
pub fn append_ranking<P: AsRef<Path>>(path: P, ranking: &PairwiseRanking) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
    let mut line = serde_json::to_string(ranking)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    Ok(())
}
