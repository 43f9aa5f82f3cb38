//! Corpus chrF.
//!
//! Character n-gram F-score. Per-order hypothesis, reference and match
//! counts are summed over the corpus; precision and recall are averaged
//! over the orders that occur on both sides and combined with F-beta.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VersioError};
use crate::metrics::ngram::{NgramCounts, char_ngrams, clipped_matches, total};
use crate::metrics::{Metric, check_parallel};

/// chrF parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChrfConfig {
    /// Highest character n-gram order.
    pub char_order: usize,
    /// Recall weight.
    pub beta: f64,
    /// Keep whitespace characters in n-grams.
    pub include_whitespace: bool,
}

impl Default for ChrfConfig {
    fn default() -> Self {
        ChrfConfig {
            char_order: 6,
            beta: 2.0,
            include_whitespace: false,
        }
    }
}

impl ChrfConfig {
    pub fn with_char_order(mut self, order: usize) -> Self {
        self.char_order = order.max(1);
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_include_whitespace(mut self, include: bool) -> Self {
        self.include_whitespace = include;
        self
    }

    /// Reject settings that cannot produce a score.
    pub fn validate(&self) -> Result<()> {
        if self.char_order == 0 {
            return Err(VersioError::validation("chrF char_order must be at least 1"));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(VersioError::validation(format!(
                "chrF beta must be a non-negative number, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Per-order `[hyp n-grams, ref n-grams, matches]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChrfStats {
    pub orders: Vec<[usize; 3]>,
}

impl ChrfStats {
    pub fn new(char_order: usize) -> Self {
        ChrfStats {
            orders: vec![[0; 3]; char_order],
        }
    }

    pub fn add(&mut self, other: &ChrfStats) {
        for (acc, value) in self.orders.iter_mut().zip(&other.orders) {
            for i in 0..3 {
                acc[i] += value[i];
            }
        }
    }
}

/// A chrF result with its components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChrfScore {
    /// Final score, 0-100.
    pub score: f64,
    /// Average precision over effective orders, 0-1.
    pub precision: f64,
    /// Average recall over effective orders, 0-1.
    pub recall: f64,
    /// Orders present in both hypothesis and reference.
    pub effective_order: usize,
}

/// Corpus chrF.
#[derive(Clone, Debug, Default)]
pub struct Chrf {
    config: ChrfConfig,
}

impl Chrf {
    pub fn new(config: ChrfConfig) -> Self {
        Chrf { config }
    }

    pub fn config(&self) -> &ChrfConfig {
        &self.config
    }

    fn chars(&self, text: &str) -> Vec<char> {
        if self.config.include_whitespace {
            text.chars().collect()
        } else {
            text.chars().filter(|c| !c.is_whitespace()).collect()
        }
    }

    /// Statistics of a single segment pair.
    pub fn segment_stats(&self, hyp: &str, reference: &str) -> ChrfStats {
        let hyp_chars = self.chars(hyp);
        let ref_chars = self.chars(reference);
        let mut stats = ChrfStats::new(self.config.char_order);
        for (i, entry) in stats.orders.iter_mut().enumerate() {
            let n = i + 1;
            let hyp_counts: NgramCounts = char_ngrams(&hyp_chars, n);
            let ref_counts: NgramCounts = char_ngrams(&ref_chars, n);
            *entry = [
                total(&hyp_counts),
                total(&ref_counts),
                clipped_matches(&hyp_counts, &ref_counts),
            ];
        }
        stats
    }

    /// Corpus statistics over parallel streams.
    pub fn corpus_stats(&self, hyps: &[String], refs: &[String]) -> Result<ChrfStats> {
        check_parallel(hyps, refs)?;
        let mut stats = ChrfStats::new(self.config.char_order);
        for (hyp, reference) in hyps.iter().zip(refs) {
            stats.add(&self.segment_stats(hyp, reference));
        }
        Ok(stats)
    }

    /// Turn accumulated statistics into a score.
    pub fn compute(&self, stats: &ChrfStats) -> ChrfScore {
        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut effective_order = 0;

        for &[hyp_count, ref_count, matches] in &stats.orders {
            if hyp_count > 0 && ref_count > 0 {
                precision += matches as f64 / hyp_count as f64;
                recall += matches as f64 / ref_count as f64;
                effective_order += 1;
            }
        }
        if effective_order > 0 {
            precision /= effective_order as f64;
            recall /= effective_order as f64;
        }

        let beta_square = self.config.beta * self.config.beta;
        let score = if precision + recall == 0.0 {
            0.0
        } else {
            100.0 * (1.0 + beta_square) * precision * recall / (beta_square * precision + recall)
        };
        debug!("chrF {score:.4} over {effective_order} effective orders");

        ChrfScore {
            score,
            precision,
            recall,
            effective_order,
        }
    }

    /// Full result for parallel streams.
    pub fn evaluate(&self, hyps: &[String], refs: &[String]) -> Result<ChrfScore> {
        let stats = self.corpus_stats(hyps, refs)?;
        Ok(self.compute(&stats))
    }
}

impl Metric for Chrf {
    fn corpus_score(&self, hyps: &[String], refs: &[String]) -> Result<f64> {
        Ok(self.evaluate(hyps, refs)?.score)
    }

    fn name(&self) -> &'static str {
        "chrf"
    }
}
