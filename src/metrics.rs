//! Corpus-level translation quality metrics.
//!
//! Both metrics accumulate sufficient statistics segment by segment and
//! compute one score for the whole corpus at the end, so a corpus score is
//! not the mean of sentence scores.
//!
//! # Examples
//!
//! ```
//! use versio::analysis::language::TokenizerKind;
//! use versio::metrics::{Bleu, BleuConfig, Chrf, ChrfConfig, Metric};
//!
//! let hyps = vec!["the cat sat on the mat".to_string()];
//! let refs = vec!["the cat sat on the mat".to_string()];
//!
//! let bleu = Bleu::new(BleuConfig::default(), TokenizerKind::Mteval13a.tokenizer());
//! assert!((bleu.corpus_score(&hyps, &refs).unwrap() - 100.0).abs() < 1e-9);
//!
//! let chrf = Chrf::new(ChrfConfig::default());
//! assert!((chrf.corpus_score(&hyps, &refs).unwrap() - 100.0).abs() < 1e-9);
//! ```

use crate::error::{Result, VersioError};

pub mod bleu;
pub mod chrf;
pub mod ngram;

pub use bleu::{Bleu, BleuConfig, BleuScore, BleuStats, Smoothing};
pub use chrf::{Chrf, ChrfConfig, ChrfScore, ChrfStats};

/// A corpus-level metric over parallel hypothesis/reference streams.
pub trait Metric: Send + Sync {
    /// Score the corpus on a 0-100 scale.
    fn corpus_score(&self, hyps: &[String], refs: &[String]) -> Result<f64>;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;
}

/// Reject streams of different lengths.
pub(crate) fn check_parallel(hyps: &[String], refs: &[String]) -> Result<()> {
    if hyps.len() != refs.len() {
        return Err(VersioError::scoring(format!(
            "hypothesis has {} segments but reference has {}",
            hyps.len(),
            refs.len()
        )));
    }
    Ok(())
}
