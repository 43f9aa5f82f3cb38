//! Leaderboard ordering for the submissions of one test set.
//!
//! With scores enabled, only scored submissions are listed, best chrF first.
//! With scores disabled, submissions are listed newest first and their
//! scores are hidden. Failed and removed submissions never appear.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{MetricScores, ScoreRecord, ScoreState};

/// Rows shown when no limit is configured.
pub const DEFAULT_DISPLAY_LIMIT: usize = 10;

/// A submission as stored by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub score: ScoreRecord,
    #[serde(default)]
    pub removed: bool,
}

impl SubmissionEntry {
    pub fn new<S: Into<String>>(id: u64, name: S, created_at: DateTime<Utc>, score: ScoreRecord) -> Self {
        SubmissionEntry {
            id,
            name: name.into(),
            created_at,
            score,
            removed: false,
        }
    }

    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }

    pub fn state(&self) -> ScoreState {
        self.score.into()
    }
}

/// How to rank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingOptions {
    /// Mirrors the test set's `compute_scores` flag.
    pub compute_scores: bool,
    /// Maximum number of rows; `None` lists everything.
    pub limit: Option<usize>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        RankingOptions {
            compute_scores: true,
            limit: Some(DEFAULT_DISPLAY_LIMIT),
        }
    }
}

impl RankingOptions {
    pub fn with_compute_scores(mut self, compute_scores: bool) -> Self {
        self.compute_scores = compute_scores;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// One displayed leaderboard row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// 1-based position.
    pub rank: usize,
    pub id: u64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub bleu: Option<f64>,
    pub chrf: Option<f64>,
}

fn by_scores(a: &MetricScores, b: &MetricScores) -> Ordering {
    b.chrf.total_cmp(&a.chrf).then_with(|| b.bleu.total_cmp(&a.bleu))
}

/// Order submissions for display.
pub fn rank(entries: &[SubmissionEntry], options: &RankingOptions) -> Vec<LeaderboardRow> {
    let mut visible: Vec<(&SubmissionEntry, ScoreState)> = entries
        .iter()
        .filter(|entry| !entry.removed)
        .map(|entry| (entry, entry.state()))
        .filter(|(_, state)| match state {
            ScoreState::Failed => false,
            ScoreState::Pending => !options.compute_scores,
            ScoreState::Scored(_) => true,
        })
        .collect();

    visible.sort_by(|(a, a_state), (b, b_state)| {
        let newest_first = b.created_at.cmp(&a.created_at);
        if !options.compute_scores {
            return newest_first;
        }
        match (a_state, b_state) {
            (ScoreState::Scored(a_scores), ScoreState::Scored(b_scores)) => {
                by_scores(a_scores, b_scores).then(newest_first)
            }
            _ => newest_first,
        }
    });

    let limit = options.limit.unwrap_or(usize::MAX);
    visible
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (entry, state))| {
            let (bleu, chrf) = match state {
                ScoreState::Scored(scores) if options.compute_scores => (Some(scores.bleu), Some(scores.chrf)),
                _ => (None, None),
            };
            LeaderboardRow {
                rank: i + 1,
                id: entry.id,
                name: entry.name.clone(),
                created_at: entry.created_at,
                bleu,
                chrf,
            }
        })
        .collect()
}
