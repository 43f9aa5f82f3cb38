//! Output formatting for CLI commands.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, VersioArgs};
use crate::diff::DiffRow;
use crate::error::Result;
use crate::leaderboard::LeaderboardRow;
use crate::ranking::{PairwiseRanking, RankTally};

/// Result structure for extraction written to a file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub file: String,
    pub selector: String,
    pub segments: usize,
    pub output: String,
}

/// Result structure for SGML alignment.
#[derive(Debug, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub filtered_file: String,
    pub documents: usize,
    pub segments: usize,
}

/// Result structure for scoring.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResult {
    pub bleu: f64,
    pub chrf: f64,
    pub bleu_details: String,
    pub segments: usize,
    pub signature: String,
}

/// Result structure for diffs.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiffReport {
    pub mode: String,
    pub total_segments: usize,
    pub changed_segments: usize,
    pub rows: Vec<DiffRow>,
}

/// Result structure for comparing two submissions.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub test_set: String,
    pub submission_a: String,
    pub submission_b: String,
    pub mode: String,
    pub total_segments: usize,
    pub changed_segments: usize,
    pub rows: Vec<DiffRow>,
}

/// Result structure for a recorded judgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct JudgeResult {
    pub ranking: PairwiseRanking,
    /// Judgements between the two submissions so far, this one included.
    pub tally: RankTally,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_in: Option<String>,
}

/// Result structure for leaderboard ranking.
#[derive(Debug, Serialize, Deserialize)]
pub struct RankingResult {
    pub scores_shown: bool,
    pub rows: Vec<LeaderboardRow>,
}

pub(crate) fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &VersioArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &VersioArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("DiffReport")
            || std::any::type_name::<T>().contains("ComparisonReport") =>
        {
            output_diff_human(&value)
        }
        _ if std::any::type_name::<T>().contains("RankingResult") => output_ranking_human(&value),
        _ => output_generic_human(&value),
    }
}

/// Output a diff report in human format.
fn output_diff_human(value: &serde_json::Value) -> Result<()> {
    if let Some(rows) = value.get("rows").and_then(|r| r.as_array()) {
        for row in rows {
            let line = row.get("line").and_then(|l| l.as_u64()).unwrap_or(0);
            let field = |name: &str| row.get(name).and_then(|v| v.as_str()).unwrap_or("").to_string();
            let similarity = row.get("similarity").and_then(|s| s.as_f64()).unwrap_or(0.0);
            println!("#{line} ({similarity:.2})");
            println!("  A: {}", field("a_marked"));
            println!("  B: {}", field("b_marked"));
        }
        println!();
    }
    if let (Some(total), Some(changed)) = (
        value.get("total_segments").and_then(|t| t.as_u64()),
        value.get("changed_segments").and_then(|c| c.as_u64()),
    ) {
        println!("{changed} of {total} segments differ");
    }
    Ok(())
}

/// Output leaderboard rows in human format.
fn output_ranking_human(value: &serde_json::Value) -> Result<()> {
    let scores_shown = value.get("scores_shown").and_then(|s| s.as_bool()).unwrap_or(false);
    if let Some(rows) = value.get("rows").and_then(|r| r.as_array()) {
        if scores_shown {
            println!("{:>4}  {:>8}  {:>8}  {}", "Rank", "chrF", "BLEU", "Submission");
        } else {
            println!("{:>4}  {:<25}  {}", "Rank", "Submitted", "Submission");
        }
        for row in rows {
            let rank = row.get("rank").and_then(|r| r.as_u64()).unwrap_or(0);
            let name = row.get("name").and_then(|n| n.as_str()).unwrap_or("");
            if scores_shown {
                let score = |key: &str| {
                    row.get(key)
                        .and_then(|v| v.as_f64())
                        .map(|v| format!("{v:.2}"))
                        .unwrap_or_else(|| "-".to_string())
                };
                println!("{rank:>4}  {:>8}  {:>8}  {name}", score("chrf"), score("bleu"));
            } else {
                let created = row.get("created_at").and_then(|c| c.as_str()).unwrap_or("");
                println!("{rank:>4}  {created:<25}  {name}");
            }
        }
    }
    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &VersioArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(obj) => {
            let formatted_values = obj
                .iter()
                .map(|(k, v)| format!("{k}={}", format_value(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{formatted_values}}}")
        }
        serde_json::Value::Null => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("hello")), "hello");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(35.35533905)), "35.3553");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&json!(["en", "de"])), "[en, de]");
        assert_eq!(format_value(&json!({"bleu": null})), "{bleu=-}");
        assert_eq!(format_value(&json!(null)), "-");
    }
}
