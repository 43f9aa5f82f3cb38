//! Score computation and the per-submission score lifecycle.
//!
//! [`ScoreComputer`] never returns an error: any failure while scoring is
//! folded into [`ScoreOutcome::Failed`]. [`SubmissionScore`] records the
//! outcome once and persists it as a [`ScoreRecord`], where a BLEU value of
//! [`FAILURE_SENTINEL`] marks a failed computation so it is not retried.
//!
//! # Examples
//!
//! ```
//! use versio::analysis::language::tokenizer_for;
//! use versio::scoring::{ScoreComputer, ScoreState, SubmissionScore};
//!
//! let computer = ScoreComputer::new(tokenizer_for("de"));
//! let hyps = vec!["Guten Morgen".to_string()];
//! let refs = vec!["Guten Morgen".to_string()];
//!
//! let mut score = SubmissionScore::pending();
//! score.record(computer.score(&hyps, &refs));
//! assert!(matches!(score.state(), ScoreState::Scored(_)));
//! ```

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::language::{TokenizerKind, tokenizer_for};
use crate::error::{Result, VersioError};
use crate::metrics::{Bleu, BleuConfig, Chrf, ChrfConfig, Metric};

/// BLEU value persisted for a failed computation.
pub const FAILURE_SENTINEL: f64 = -1.0;

/// Both metric values, each on a 0-100 scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    pub bleu: f64,
    pub chrf: f64,
}

impl fmt::Display for MetricScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BLEU {:.2} chrF {:.2}", self.bleu, self.chrf)
    }
}

/// Result of one scoring attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum ScoreOutcome {
    Scored(MetricScores),
    /// Scoring failed; the string says why.
    Failed(String),
}

impl ScoreOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScoreOutcome::Failed(_))
    }

    pub fn scores(&self) -> Option<MetricScores> {
        match self {
            ScoreOutcome::Scored(scores) => Some(*scores),
            ScoreOutcome::Failed(_) => None,
        }
    }
}

/// Computes BLEU and chrF for parallel streams with a fixed tokenizer.
#[derive(Debug)]
pub struct ScoreComputer {
    tokenizer: TokenizerKind,
    bleu: Bleu,
    chrf: Chrf,
}

impl ScoreComputer {
    /// Computer with default metric parameters.
    pub fn new(tokenizer: TokenizerKind) -> Self {
        Self::with_configs(tokenizer, BleuConfig::default(), ChrfConfig::default())
    }

    /// Computer whose tokenizer is chosen from the target language.
    pub fn for_language(target_language: &str) -> Self {
        Self::new(tokenizer_for(target_language))
    }

    pub fn with_configs(tokenizer: TokenizerKind, bleu: BleuConfig, chrf: ChrfConfig) -> Self {
        ScoreComputer {
            tokenizer,
            bleu: Bleu::new(bleu, tokenizer.tokenizer()),
            chrf: Chrf::new(chrf),
        }
    }

    pub fn tokenizer(&self) -> TokenizerKind {
        self.tokenizer
    }

    /// Short description of the metric settings, e.g. `tok:13a|smooth:Exp|order:4|chrf:6,2`.
    pub fn signature(&self) -> String {
        let bleu = self.bleu.config();
        let chrf = self.chrf.config();
        format!(
            "tok:{}|smooth:{:?}|order:{}|lc:{}|chrf:{},{}",
            self.bleu.tokenizer_name(),
            bleu.smooth,
            bleu.max_ngram_order,
            bleu.lowercase,
            chrf.char_order,
            chrf.beta
        )
    }

    /// Compute both metrics, propagating errors.
    pub fn try_score(&self, hyps: &[String], refs: &[String]) -> Result<MetricScores> {
        let bleu = self.bleu.corpus_score(hyps, refs)?;
        let chrf = self.chrf.corpus_score(hyps, refs)?;
        if !bleu.is_finite() || !chrf.is_finite() {
            return Err(VersioError::scoring(format!(
                "non-finite score (BLEU {bleu}, chrF {chrf})"
            )));
        }
        Ok(MetricScores { bleu, chrf })
    }

    /// Compute both metrics. Errors become [`ScoreOutcome::Failed`].
    pub fn score(&self, hyps: &[String], refs: &[String]) -> ScoreOutcome {
        match self.try_score(hyps, refs) {
            Ok(scores) => {
                info!("Scored {} segments: {} ({})", hyps.len(), scores, self.signature());
                ScoreOutcome::Scored(scores)
            }
            Err(e) => {
                warn!("Scoring failed: {e}");
                ScoreOutcome::Failed(e.to_string())
            }
        }
    }
}

/// In-memory score state of a submission.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ScoreState {
    #[default]
    Pending,
    Scored(MetricScores),
    Failed,
}

impl ScoreState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ScoreState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

/// Persisted form of [`ScoreState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub bleu: Option<f64>,
    pub chrf: Option<f64>,
}

impl From<ScoreState> for ScoreRecord {
    fn from(state: ScoreState) -> Self {
        match state {
            ScoreState::Pending => ScoreRecord::default(),
            ScoreState::Scored(scores) => ScoreRecord {
                bleu: Some(scores.bleu),
                chrf: Some(scores.chrf),
            },
            ScoreState::Failed => ScoreRecord {
                bleu: Some(FAILURE_SENTINEL),
                chrf: None,
            },
        }
    }
}

impl From<ScoreRecord> for ScoreState {
    fn from(record: ScoreRecord) -> Self {
        match (record.bleu, record.chrf) {
            (None, _) => ScoreState::Pending,
            (Some(bleu), _) if bleu == FAILURE_SENTINEL => ScoreState::Failed,
            (Some(bleu), Some(chrf)) => ScoreState::Scored(MetricScores { bleu, chrf }),
            // A BLEU value without chrF predates chrF scoring; recompute it.
            (Some(_), None) => ScoreState::Pending,
        }
    }
}

/// Score lifecycle of one submission: `Pending -> Scored | Failed`, once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionScore {
    state: ScoreState,
}

impl SubmissionScore {
    pub fn pending() -> Self {
        SubmissionScore::default()
    }

    /// Restore from a persisted record.
    pub fn from_record(record: ScoreRecord) -> Self {
        SubmissionScore {
            state: record.into(),
        }
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    pub fn record_value(&self) -> ScoreRecord {
        self.state.into()
    }

    /// Whether a computation should be attempted.
    pub fn needs_scoring(&self) -> bool {
        self.state.is_pending()
    }

    /// Record an outcome. Returns `false` and leaves the state untouched
    /// when the score is already terminal.
    pub fn record(&mut self, outcome: ScoreOutcome) -> bool {
        if self.state.is_terminal() {
            debug!("Ignoring score outcome, state is already {:?}", self.state);
            return false;
        }
        self.state = match outcome {
            ScoreOutcome::Scored(scores) => ScoreState::Scored(scores),
            ScoreOutcome::Failed(_) => ScoreState::Failed,
        };
        true
    }

    /// Clear back to pending so the score is computed again.
    pub fn reset(&mut self) {
        self.state = ScoreState::Pending;
    }
}
