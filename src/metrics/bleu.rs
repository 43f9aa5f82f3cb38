//! Corpus BLEU.
//!
//! Clipped n-gram matches and n-gram totals are summed over all segments,
//! then combined into a geometric mean of modified precisions scaled by a
//! brevity penalty. Each hypothesis has exactly one reference.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::Tokenizer;
use crate::error::{Result, VersioError};
use crate::metrics::ngram::{clipped_matches, total, word_ngrams};
use crate::metrics::{Metric, check_parallel};

/// Stand-in for `ln(0)` so that a zero precision drives the score to zero.
const LOG_ZERO: f64 = -9_999_999_999.0;

fn safe_log(value: f64) -> f64 {
    if value == 0.0 { LOG_ZERO } else { value.ln() }
}

/// Treatment of n-gram orders without any match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    /// The k-th zero-match order gets precision `100 / (2^k * total)`.
    #[default]
    Exp,
    /// No smoothing: a zero-match order makes the score zero.
    None,
    /// A zero-match order gets precision `100 * value / total`.
    Floor(f64),
}

/// BLEU parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleuConfig {
    /// Highest n-gram order.
    pub max_ngram_order: usize,
    /// Smoothing for zero-match orders.
    pub smooth: Smoothing,
    /// Lowercase both sides before tokenizing.
    pub lowercase: bool,
}

impl Default for BleuConfig {
    fn default() -> Self {
        BleuConfig {
            max_ngram_order: 4,
            smooth: Smoothing::Exp,
            lowercase: false,
        }
    }
}

impl BleuConfig {
    pub fn with_max_ngram_order(mut self, order: usize) -> Self {
        self.max_ngram_order = order.max(1);
        self
    }

    pub fn with_smoothing(mut self, smooth: Smoothing) -> Self {
        self.smooth = smooth;
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Reject settings that cannot produce a score.
    pub fn validate(&self) -> Result<()> {
        if self.max_ngram_order == 0 {
            return Err(VersioError::validation("BLEU max_ngram_order must be at least 1"));
        }
        if let Smoothing::Floor(value) = self.smooth
            && !(value.is_finite() && value >= 0.0)
        {
            return Err(VersioError::validation(format!(
                "BLEU floor smoothing needs a non-negative value, got {value}"
            )));
        }
        Ok(())
    }
}

/// Sufficient statistics for corpus BLEU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BleuStats {
    /// Hypothesis length in tokens.
    pub sys_len: usize,
    /// Reference length in tokens.
    pub ref_len: usize,
    /// Clipped matches per order.
    pub correct: Vec<usize>,
    /// Hypothesis n-grams per order.
    pub total: Vec<usize>,
}

impl BleuStats {
    pub fn new(max_order: usize) -> Self {
        BleuStats {
            sys_len: 0,
            ref_len: 0,
            correct: vec![0; max_order],
            total: vec![0; max_order],
        }
    }

    /// Accumulate another segment's statistics.
    pub fn add(&mut self, other: &BleuStats) {
        self.sys_len += other.sys_len;
        self.ref_len += other.ref_len;
        for (acc, value) in self.correct.iter_mut().zip(&other.correct) {
            *acc += value;
        }
        for (acc, value) in self.total.iter_mut().zip(&other.total) {
            *acc += value;
        }
    }
}

/// A BLEU result with its components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BleuScore {
    /// Final score, 0-100.
    pub score: f64,
    /// Modified precision per order, 0-100.
    pub precisions: Vec<f64>,
    pub brevity_penalty: f64,
    pub sys_len: usize,
    pub ref_len: usize,
}

impl fmt::Display for BleuScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precisions: Vec<String> = self.precisions.iter().map(|p| format!("{p:.1}")).collect();
        write!(
            f,
            "BLEU = {:.2} {} (BP = {:.3} ratio = {:.3} hyp_len = {} ref_len = {})",
            self.score,
            precisions.join("/"),
            self.brevity_penalty,
            if self.ref_len > 0 {
                self.sys_len as f64 / self.ref_len as f64
            } else {
                0.0
            },
            self.sys_len,
            self.ref_len
        )
    }
}

/// Corpus BLEU with a fixed tokenizer.
pub struct Bleu {
    config: BleuConfig,
    tokenizer: Box<dyn Tokenizer>,
}

impl fmt::Debug for Bleu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bleu")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}

impl Bleu {
    pub fn new(config: BleuConfig, tokenizer: Box<dyn Tokenizer>) -> Self {
        Bleu { config, tokenizer }
    }

    pub fn config(&self) -> &BleuConfig {
        &self.config
    }

    /// Name of the tokenizer in use.
    pub fn tokenizer_name(&self) -> &'static str {
        self.tokenizer.name()
    }

    fn words(&self, text: &str) -> Result<Vec<String>> {
        if self.config.lowercase {
            self.tokenizer.words(&text.to_lowercase())
        } else {
            self.tokenizer.words(text)
        }
    }

    /// Statistics of a single segment pair.
    pub fn segment_stats(&self, hyp: &str, reference: &str) -> Result<BleuStats> {
        let order = self.config.max_ngram_order;
        let hyp_words = self.words(hyp)?;
        let ref_words = self.words(reference)?;

        let mut stats = BleuStats::new(order);
        stats.sys_len = hyp_words.len();
        stats.ref_len = ref_words.len();
        for n in 1..=order {
            let hyp_counts = word_ngrams(&hyp_words, n);
            let ref_counts = word_ngrams(&ref_words, n);
            stats.correct[n - 1] = clipped_matches(&hyp_counts, &ref_counts);
            stats.total[n - 1] = total(&hyp_counts);
        }
        Ok(stats)
    }

    /// Corpus statistics over parallel streams.
    pub fn corpus_stats(&self, hyps: &[String], refs: &[String]) -> Result<BleuStats> {
        check_parallel(hyps, refs)?;
        let mut stats = BleuStats::new(self.config.max_ngram_order);
        for (hyp, reference) in hyps.iter().zip(refs) {
            stats.add(&self.segment_stats(hyp, reference)?);
        }
        Ok(stats)
    }

    /// Turn accumulated statistics into a score.
    pub fn compute(&self, stats: &BleuStats) -> BleuScore {
        let order = self.config.max_ngram_order;
        let mut precisions = vec![0.0; order];
        let mut smooth_mteval = 1.0;

        for n in 0..order {
            let total = stats.total.get(n).copied().unwrap_or(0);
            let correct = stats.correct.get(n).copied().unwrap_or(0);
            if total == 0 {
                break;
            }
            precisions[n] = if correct == 0 {
                match self.config.smooth {
                    Smoothing::Exp => {
                        smooth_mteval *= 2.0;
                        100.0 / (smooth_mteval * total as f64)
                    }
                    Smoothing::Floor(value) => 100.0 * value / total as f64,
                    Smoothing::None => 0.0,
                }
            } else {
                100.0 * correct as f64 / total as f64
            };
        }

        let brevity_penalty = if stats.sys_len < stats.ref_len {
            if stats.sys_len > 0 {
                (1.0 - stats.ref_len as f64 / stats.sys_len as f64).exp()
            } else {
                0.0
            }
        } else {
            1.0
        };

        let log_mean = precisions.iter().map(|&p| safe_log(p)).sum::<f64>() / order as f64;
        let score = brevity_penalty * log_mean.exp();
        debug!(
            "BLEU {:.4} from {} hyp tokens, {} ref tokens",
            score, stats.sys_len, stats.ref_len
        );

        BleuScore {
            score,
            precisions,
            brevity_penalty,
            sys_len: stats.sys_len,
            ref_len: stats.ref_len,
        }
    }

    /// Full result for parallel streams.
    pub fn evaluate(&self, hyps: &[String], refs: &[String]) -> Result<BleuScore> {
        let stats = self.corpus_stats(hyps, refs)?;
        Ok(self.compute(&stats))
    }
}

impl Metric for Bleu {
    fn corpus_score(&self, hyps: &[String], refs: &[String]) -> Result<f64> {
        Ok(self.evaluate(hyps, refs)?.score)
    }

    fn name(&self) -> &'static str {
        "bleu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::language::TokenizerKind;

    fn bleu() -> Bleu {
        Bleu::new(BleuConfig::default(), TokenizerKind::Mteval13a.tokenizer())
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_corpus_scores_100() {
        let corpus = lines(&["the cat sat on the mat .", "a dog barked loudly at night"]);
        let score = bleu().corpus_score(&corpus, &corpus).unwrap();
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_exp_smoothing() {
        // 1-gram 3/4, 2-gram 1/3, 3-gram 0/2 -> 100/4, 4-gram 0/1 -> 100/4.
        let result = bleu()
            .evaluate(&lines(&["a b c d"]), &lines(&["a b x d"]))
            .unwrap();
        assert!((result.precisions[0] - 75.0).abs() < 1e-9);
        assert!((result.precisions[2] - 25.0).abs() < 1e-9);
        assert!((result.precisions[3] - 25.0).abs() < 1e-9);
        assert!((result.score - 35.355339).abs() < 1e-5);
        assert_eq!(result.brevity_penalty, 1.0);
    }

    #[test]
    fn test_no_smoothing_zeroes_score() {
        let metric = Bleu::new(
            BleuConfig::default().with_smoothing(Smoothing::None),
            TokenizerKind::Mteval13a.tokenizer(),
        );
        let score = metric
            .corpus_score(&lines(&["a b c d"]), &lines(&["a b x d"]))
            .unwrap();
        assert!(score < 1e-6);
    }

    #[test]
    fn test_short_hypothesis_is_zero() {
        let result = bleu()
            .evaluate(&lines(&["the cat"]), &lines(&["the cat sat on the mat"]))
            .unwrap();
        assert!(result.brevity_penalty < 1.0);
        assert!(result.score < 1e-6);
    }

    #[test]
    fn test_brevity_penalty() {
        let metric = bleu();
        let stats = BleuStats {
            sys_len: 5,
            ref_len: 10,
            correct: vec![5, 4, 3, 2],
            total: vec![5, 4, 3, 2],
        };
        let result = metric.compute(&stats);
        assert!((result.brevity_penalty - (-1.0f64).exp()).abs() < 1e-12);
        assert!((result.score - 100.0 * (-1.0f64).exp()).abs() < 1e-9);

        let empty = metric.compute(&BleuStats {
            sys_len: 0,
            ref_len: 3,
            correct: vec![0; 4],
            total: vec![0; 4],
        });
        assert_eq!(empty.brevity_penalty, 0.0);
        assert_eq!(empty.score, 0.0);
    }

    #[test]
    fn test_lowercase() {
        let hyps = lines(&["The Cat Sat On The Mat"]);
        let refs = lines(&["the cat sat on the mat"]);
        assert!(bleu().corpus_score(&hyps, &refs).unwrap() < 100.0);

        let metric = Bleu::new(
            BleuConfig::default().with_lowercase(true),
            TokenizerKind::Mteval13a.tokenizer(),
        );
        assert!((metric.corpus_score(&hyps, &refs).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_is_error() {
        assert!(bleu().corpus_score(&lines(&["a"]), &lines(&[])).is_err());
    }

    #[test]
    fn test_smoothing_serde() {
        let json = serde_json::to_string(&Smoothing::Floor(0.1)).unwrap();
        assert_eq!(json, r#"{"floor":0.1}"#);
        let smooth: Smoothing = serde_json::from_str("\"exp\"").unwrap();
        assert_eq!(smooth, Smoothing::Exp);
    }
}
