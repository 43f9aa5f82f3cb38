//! Command line argument parsing for the Versio CLI using clap.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::analysis::language::TokenizerKind;
use crate::diff::DiffMode;
use crate::error::Result;
use crate::metrics::Smoothing;
use crate::segment::{FileFormat, Selector};

/// Versio - machine translation evaluation toolkit
#[derive(Parser, Debug, Clone)]
#[command(name = "versio")]
#[command(about = "Extract, align, score and compare machine translation outputs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VersioArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VersioArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract one side of a file as one segment per line
    Extract(ExtractArgs),

    /// List languages, translators and systems of an XML file
    Inspect(InspectArgs),

    /// Reorder an SGML submission to match the reference documents
    Align(AlignArgs),

    /// Score a hypothesis against a reference
    Score(ScoreArgs),

    /// Validate and score a submission described by JSON configs
    Evaluate(EvaluateArgs),

    /// Show word or character differences between two outputs
    Diff(DiffArgs),

    /// Order scored submissions for a leaderboard
    Rank(RankArgs),

    /// Line up two submissions to the same test set
    Compare(CompareArgs),

    /// Record which of two submissions is better on one line
    Judge(JudgeArgs),
}

/// File format as given on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatArg {
    Text,
    Sgml,
    Xml,
}

impl From<FormatArg> for FileFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Text => FileFormat::Text,
            FormatArg::Sgml => FileFormat::Sgml,
            FormatArg::Xml => FileFormat::Xml,
        }
    }
}

/// Arguments for extraction
#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("selector").required(true).args(["source", "translator", "system"])))]
pub struct ExtractArgs {
    /// Input file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Input format (guessed from the extension when omitted)
    #[arg(short = 't', long = "type")]
    pub file_type: Option<FormatArg>,

    /// Extract the source side
    #[arg(long)]
    pub source: bool,

    /// Extract the reference of this translator
    #[arg(long, value_name = "ID")]
    pub translator: Option<String>,

    /// Extract the hypothesis of this system
    #[arg(long, value_name = "ID")]
    pub system: Option<String>,

    /// Only consider documents of this collection
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Write the lines to this file instead of stdout
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

impl ExtractArgs {
    pub fn selector(&self) -> Result<Selector> {
        Selector::from_parts(self.source, self.translator.as_deref(), self.system.as_deref())
    }
}

/// Arguments for XML inspection
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// XML file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for SGML alignment
#[derive(Parser, Debug, Clone)]
pub struct AlignArgs {
    /// Reference SGML file
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// Hypothesis SGML file
    #[arg(value_name = "HYPOTHESIS")]
    pub hypothesis: PathBuf,
}

/// Smoothing method for BLEU
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothArg {
    Exp,
    None,
    Floor,
}

/// Arguments for scoring a hypothesis against a reference
#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Hypothesis file (text, SGML or XML)
    #[arg(value_name = "HYPOTHESIS")]
    pub hypothesis: PathBuf,

    /// Reference file (text, SGML or XML)
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// Hypothesis format, checked against the extension (guessed from it when omitted)
    #[arg(long)]
    pub hyp_type: Option<FormatArg>,

    /// Reference format, checked against the extension (guessed from it when omitted)
    #[arg(long)]
    pub ref_type: Option<FormatArg>,

    /// System to score when the hypothesis is XML
    #[arg(long, value_name = "ID")]
    pub system: Option<String>,

    /// Reference translator when the reference is XML
    #[arg(long, value_name = "ID")]
    pub translator: Option<String>,

    /// Only score documents of this collection
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Target language, used to pick the tokenizer
    #[arg(short = 'l', long, default_value = "en")]
    pub target_language: String,

    /// Tokenizer (overrides the language choice)
    #[arg(long)]
    pub tokenizer: Option<TokenizerKind>,

    /// BLEU smoothing
    #[arg(long, default_value = "exp")]
    pub smooth: SmoothArg,

    /// Floor value for --smooth floor
    #[arg(long, default_value = "0.1")]
    pub smooth_value: f64,

    /// Lowercase before computing BLEU
    #[arg(long)]
    pub lowercase: bool,
}

impl ScoreArgs {
    pub fn smoothing(&self) -> Smoothing {
        match self.smooth {
            SmoothArg::Exp => Smoothing::Exp,
            SmoothArg::None => Smoothing::None,
            SmoothArg::Floor => Smoothing::Floor(self.smooth_value),
        }
    }
}

/// Arguments for evaluating a submission
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Test-set JSON config
    #[arg(value_name = "TEST_SET")]
    pub test_set: PathBuf,

    /// Submission JSON config
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,
}

/// Diff granularity on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffModeArg {
    Word,
    Char,
}

impl From<DiffModeArg> for DiffMode {
    fn from(mode: DiffModeArg) -> Self {
        match mode {
            DiffModeArg::Word => DiffMode::Word,
            DiffModeArg::Char => DiffMode::Character,
        }
    }
}

/// Arguments for comparing two outputs
#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// First output (text, SGML or XML)
    #[arg(value_name = "A")]
    pub a: PathBuf,

    /// Second output (text, SGML or XML)
    #[arg(value_name = "B")]
    pub b: PathBuf,

    /// System to take from the first file when it is XML
    #[arg(long, value_name = "ID")]
    pub system_a: Option<String>,

    /// System to take from the second file when it is XML
    #[arg(long, value_name = "ID")]
    pub system_b: Option<String>,

    /// Diff granularity
    #[arg(short, long, default_value = "word")]
    pub mode: DiffModeArg,

    /// Only show segments that differ
    #[arg(long)]
    pub changed_only: bool,

    /// Maximum number of rows to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for leaderboard ranking
#[derive(Parser, Debug, Clone)]
pub struct RankArgs {
    /// JSON file with an array of submissions
    #[arg(value_name = "SUBMISSIONS")]
    pub submissions: PathBuf,

    /// Scores are disabled for the test set; order by time
    #[arg(long)]
    pub no_scores: bool,

    /// Maximum number of rows (0 for all)
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for comparing two submissions
#[derive(Parser, Debug, Clone)]
pub struct CompareArgs {
    /// Submission JSON config for A
    #[arg(value_name = "SUBMISSION_A")]
    pub a: PathBuf,

    /// Submission JSON config for B
    #[arg(value_name = "SUBMISSION_B")]
    pub b: PathBuf,

    /// Diff granularity
    #[arg(short, long, default_value = "word")]
    pub mode: DiffModeArg,

    /// Only show segments that differ
    #[arg(long)]
    pub changed_only: bool,

    /// Maximum number of rows to show
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for judging one line of a comparison
#[derive(Parser, Debug, Clone)]
pub struct JudgeArgs {
    /// Submission JSON config for A
    #[arg(value_name = "SUBMISSION_A")]
    pub a: PathBuf,

    /// Submission JSON config for B
    #[arg(value_name = "SUBMISSION_B")]
    pub b: PathBuf,

    /// 1-based segment number
    #[arg(long, value_name = "N")]
    pub line: usize,

    /// Verdict: A>B, A<B or A=B (or better, worse, equal)
    #[arg(long, value_name = "RANK")]
    pub rank: String,

    /// Who made the judgement
    #[arg(long, value_name = "JUDGE")]
    pub by: Option<String>,

    /// Test-set JSON config, to store the source and reference segments
    #[arg(long, value_name = "TEST_SET")]
    pub test_set: Option<PathBuf>,

    /// JSON-lines file to append the judgement to
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Human,
    Json,
}
