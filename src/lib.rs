//! # Versio
//!
//! Building blocks for a machine translation leaderboard.
//!
//! ## Features
//!
//! - Segment extraction from plain text, SGML and WMT XML, cached to
//!   derived text files
//! - Reference-order alignment of SGML submissions
//! - Corpus BLEU and chrF with language-specific tokenization
//! - A score lifecycle with a persisted failure sentinel
//! - Word and character diffs between two outputs
//! - Leaderboard ordering
//! - Pairwise human judgements between submissions to one test set
//!
//! ## Example
//!
//! ```no_run
//! use versio::config::{SubmissionConfig, TestSetConfig};
//! use versio::pipeline::Evaluator;
//! use versio::segment::FileFormat;
//!
//! let test_set = TestSetConfig::new(
//!     "newstest2021",
//!     "en",
//!     "de",
//!     FileFormat::Xml,
//!     "newstest2021.en-de.xml",
//!     "newstest2021.en-de.xml",
//! );
//! let submission = SubmissionConfig::new("run-1", FileFormat::Xml, "run-1.en-de.xml");
//!
//! let evaluation = Evaluator::new(test_set).evaluate(&submission).unwrap();
//! println!("{:?}", evaluation.state());
//! ```

pub mod alignment;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod extraction;
pub mod leaderboard;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod segment;

pub mod prelude {
    pub use crate::diff::{DiffMode, annotate};
    pub use crate::error::{Result, VersioError};
    pub use crate::extraction::extract;
    pub use crate::pipeline::Evaluator;
    pub use crate::ranking::{PairwiseRank, PairwiseRanking};
    pub use crate::scoring::{ScoreComputer, ScoreOutcome, ScoreState};
    pub use crate::segment::{FileFormat, Selector};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
