//! Command implementations for the Versio CLI.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::alignment::{SgmlFile, align_files};
use crate::analysis::language::tokenizer_for;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{SubmissionConfig, TestSetConfig};
use crate::diff::{DiffMode, annotate_streams};
use crate::error::{Result, VersioError};
use crate::extraction::inventory::XmlInventory;
use crate::extraction::{extract, extract_hypothesis, hypothesis_selector, reference_selector};
use crate::leaderboard::{RankingOptions, SubmissionEntry, rank};
use crate::metrics::{Bleu, BleuConfig};
use crate::pipeline::{Evaluator, StreamSource, aligned_streams};
use crate::ranking::{
    PairwiseRank, PairwiseRanking, RankTally, append_ranking, compare, load_rankings,
};
use crate::scoring::ScoreComputer;
use crate::segment::{FileFormat, Selector};

/// Execute a CLI command.
pub fn execute_command(args: VersioArgs) -> Result<()> {
    match &args.command {
        Command::Extract(extract_args) => extract_file(extract_args, &args),
        Command::Inspect(inspect_args) => inspect_file(inspect_args, &args),
        Command::Align(align_args) => align_sgml(align_args, &args),
        Command::Score(score_args) => score_files(score_args, &args),
        Command::Evaluate(evaluate_args) => evaluate_submission(evaluate_args, &args),
        Command::Diff(diff_args) => diff_outputs(diff_args, &args),
        Command::Rank(rank_args) => rank_submissions(rank_args, &args),
        Command::Compare(compare_args) => compare_submissions(compare_args, &args),
        Command::Judge(judge_args) => judge_line(judge_args, &args),
    }
}

fn resolve_format(path: &Path, declared: Option<FormatArg>) -> Result<FileFormat> {
    match declared {
        Some(format) => Ok(format.into()),
        None => FileFormat::from_path(path).ok_or_else(|| {
            VersioError::validation(format!("cannot tell the format of {}", path.display()))
        }),
    }
}

/// Extract one side of a file.
fn extract_file(args: &ExtractArgs, cli_args: &VersioArgs) -> Result<()> {
    let format = resolve_format(&args.file, args.file_type)?;
    let selector = args.selector()?;
    let lines = extract(&args.file, format, &selector, args.collection.as_deref())?;

    match &args.output {
        Some(output) => {
            let mut contents = lines.join("\n");
            if !lines.is_empty() {
                contents.push('\n');
            }
            fs::write(output, contents)?;
            output_result(
                "Extraction complete",
                &ExtractionResult {
                    file: path_string(&args.file),
                    selector: selector.label(),
                    segments: lines.len(),
                    output: path_string(output),
                },
                cli_args,
            )
        }
        None if cli_args.output_format == OutputFormat::Json => output_result("", &lines, cli_args),
        None => {
            for line in &lines {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Show the inventory of an XML file.
fn inspect_file(args: &InspectArgs, cli_args: &VersioArgs) -> Result<()> {
    FileFormat::Xml.check_extension(&args.file)?;
    let inventory = XmlInventory::from_path(&args.file)?;
    output_result(
        &format!("Contents of {}", args.file.display()),
        &inventory,
        cli_args,
    )
}

/// Reorder an SGML hypothesis to the reference document order.
fn align_sgml(args: &AlignArgs, cli_args: &VersioArgs) -> Result<()> {
    FileFormat::Sgml.check_extension(&args.reference)?;
    FileFormat::Sgml.check_extension(&args.hypothesis)?;

    let filtered_path = align_files(&args.reference, &args.hypothesis)?;
    let filtered = SgmlFile::from_path(&filtered_path)?;
    output_result(
        "Alignment complete",
        &AlignmentResult {
            filtered_file: path_string(&filtered_path),
            documents: filtered.documents.len(),
            segments: filtered.documents.iter().map(|doc| doc.segments.len()).sum(),
        },
        cli_args,
    )
}

/// Score a hypothesis against a reference. Two SGML files are aligned by
/// document first.
fn score_files(args: &ScoreArgs, cli_args: &VersioArgs) -> Result<()> {
    let hyp_format = resolve_format(&args.hypothesis, args.hyp_type)?;
    let ref_format = resolve_format(&args.reference, args.ref_type)?;
    let hypothesis = StreamSource::new(
        &args.hypothesis,
        hyp_format,
        hypothesis_selector(&args.hypothesis, hyp_format, args.system.as_deref())?,
    );
    let reference = StreamSource::new(
        &args.reference,
        ref_format,
        reference_selector(&args.reference, ref_format, args.translator.as_deref())?,
    );
    let streams = aligned_streams(&reference, &hypothesis, args.collection.as_deref())?;

    let tokenizer = args.tokenizer.unwrap_or_else(|| tokenizer_for(&args.target_language));
    debug!("Scoring with the {tokenizer} tokenizer");
    let bleu_config = BleuConfig::default()
        .with_smoothing(args.smoothing())
        .with_lowercase(args.lowercase);
    bleu_config.validate()?;

    let computer = ScoreComputer::with_configs(tokenizer, bleu_config.clone(), Default::default());
    let scores = computer.try_score(&streams.hypothesis, &streams.reference)?;
    let details =
        Bleu::new(bleu_config, tokenizer.tokenizer()).evaluate(&streams.hypothesis, &streams.reference)?;

    output_result(
        "Scores",
        &ScoreResult {
            bleu: scores.bleu,
            chrf: scores.chrf,
            bleu_details: details.to_string(),
            segments: streams.len(),
            signature: computer.signature(),
        },
        cli_args,
    )
}

/// Run the evaluation pipeline for one submission.
fn evaluate_submission(args: &EvaluateArgs, cli_args: &VersioArgs) -> Result<()> {
    let test_set = TestSetConfig::from_file(&args.test_set)?;
    let submission = SubmissionConfig::from_file(&args.submission)?;
    info!("Evaluating {} on {}", submission.name, test_set.name);

    let evaluation = Evaluator::new(test_set).evaluate(&submission)?;
    output_result("Evaluation", &evaluation, cli_args)
}

/// Compare two outputs segment by segment.
fn diff_outputs(args: &DiffArgs, cli_args: &VersioArgs) -> Result<()> {
    let a = extract_hypothesis(&args.a, resolve_format(&args.a, None)?, args.system_a.as_deref())?;
    let b = extract_hypothesis(&args.b, resolve_format(&args.b, None)?, args.system_b.as_deref())?;
    if a.len() != b.len() {
        info!("Outputs differ in length ({} vs {}), comparing the common prefix", a.len(), b.len());
    }

    let mode = DiffMode::from(args.mode);
    let rows = annotate_streams(&a, &b, mode);
    let total_segments = rows.len();
    let changed_segments = rows.iter().filter(|row| !row.is_identical()).count();

    let rows: Vec<_> = rows
        .into_iter()
        .filter(|row| !args.changed_only || !row.is_identical())
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    output_result(
        &format!("Differences between {} and {}", args.a.display(), args.b.display()),
        &DiffReport {
            mode: mode.to_string(),
            total_segments,
            changed_segments,
            rows,
        },
        cli_args,
    )
}

/// Rank submissions read from a JSON array.
fn rank_submissions(args: &RankArgs, cli_args: &VersioArgs) -> Result<()> {
    let contents = fs::read_to_string(&args.submissions)?;
    let entries: Vec<SubmissionEntry> = serde_json::from_str(&contents)?;

    let options = RankingOptions::default()
        .with_compute_scores(!args.no_scores)
        .with_limit(if args.limit == 0 { None } else { Some(args.limit) });
    let rows = rank(&entries, &options);

    output_result(
        "Leaderboard",
        &RankingResult {
            scores_shown: options.compute_scores,
            rows,
        },
        cli_args,
    )
}

/// Line up two submissions to the same test set.
fn compare_submissions(args: &CompareArgs, cli_args: &VersioArgs) -> Result<()> {
    let a = SubmissionConfig::from_file(&args.a)?;
    let b = SubmissionConfig::from_file(&args.b)?;
    let mode = DiffMode::from(args.mode);
    let comparison = compare(&a, &b, mode)?;

    let total_segments = comparison.rows.len();
    let changed_segments = comparison.rows.iter().filter(|row| !row.is_identical()).count();
    let rows: Vec<_> = comparison
        .rows
        .into_iter()
        .filter(|row| !args.changed_only || !row.is_identical())
        .take(args.limit.unwrap_or(usize::MAX))
        .collect();

    output_result(
        &format!(
            "{} against {} on {}",
            comparison.submission_a, comparison.submission_b, comparison.test_set
        ),
        &ComparisonReport {
            test_set: comparison.test_set,
            submission_a: comparison.submission_a,
            submission_b: comparison.submission_b,
            mode: mode.to_string(),
            total_segments,
            changed_segments,
            rows,
        },
        cli_args,
    )
}

/// Add the source and reference segments of the judged line.
fn with_context(ranking: PairwiseRanking, test_set_path: &Path) -> Result<PairwiseRanking> {
    let test_set = TestSetConfig::from_file(test_set_path)?;
    if test_set.name != ranking.test_set {
        return Err(VersioError::validation(format!(
            "the submissions were made for {}, not {}",
            ranking.test_set, test_set.name
        )));
    }

    let collection = test_set.collection.as_deref();
    let index = ranking.line_number - 1;
    let sources = extract(&test_set.src_file, test_set.file_format, &Selector::Source, collection)?;
    let selector = reference_selector(&test_set.ref_file, test_set.file_format, test_set.translator.as_deref())?;
    let references = extract(&test_set.ref_file, test_set.file_format, &selector, collection)?;

    let mut ranking = ranking;
    if let Some(source) = sources.get(index) {
        ranking = ranking.with_source(source.as_str());
    }
    if let Some(reference) = references.get(index) {
        ranking = ranking.with_reference(reference.as_str());
    }
    Ok(ranking)
}

/// Record a judgement on one line of two submissions.
fn judge_line(args: &JudgeArgs, cli_args: &VersioArgs) -> Result<()> {
    let a = SubmissionConfig::from_file(&args.a)?;
    let b = SubmissionConfig::from_file(&args.b)?;
    let verdict: PairwiseRank = args.rank.parse()?;

    let comparison = compare(&a, &b, DiffMode::Word)?;
    let mut ranking = comparison.judge(args.line, verdict)?;
    if let Some(judge) = &args.by {
        ranking = ranking.with_judge(judge.as_str());
    }
    if let Some(test_set) = &args.test_set {
        ranking = with_context(ranking, test_set)?;
    }

    let mut rankings = match &args.output {
        Some(output) => load_rankings(output)?,
        None => Vec::new(),
    };
    if let Some(output) = &args.output {
        append_ranking(output, &ranking)?;
        info!("Recorded {ranking} in {}", output.display());
    }
    rankings.push(ranking.clone());
    let tally = RankTally::between(
        &rankings,
        &ranking.test_set,
        &ranking.submission_a,
        &ranking.submission_b,
    );

    output_result(
        &ranking.to_string(),
        &JudgeResult {
            ranking,
            tally,
            recorded_in: args.output.as_deref().map(path_string),
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run(args: &[&str]) -> Result<()> {
        let args = VersioArgs::try_parse_from(args).unwrap();
        execute_command(args)
    }

    #[test]
    fn test_extract_to_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("hyp.sgm");
        let output = dir.path().join("out.lines");
        fs::write(
            &input,
            "<tstset>\n<doc docid=\"d1\">\n<seg id=\"1\">Hallo   Welt</seg>\n</doc>\n</tstset>\n",
        )
        .unwrap();

        run(&[
            "versio",
            "-q",
            "extract",
            input.to_str().unwrap(),
            "--system",
            "s",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "Hallo Welt\n");
    }

    #[test]
    fn test_score_rejects_mismatched_files() {
        let dir = TempDir::new().unwrap();
        let hyp = dir.path().join("hyp.txt");
        let reference = dir.path().join("ref.txt");
        fs::write(&hyp, "a\nb\n").unwrap();
        fs::write(&reference, "a\n").unwrap();

        let err = run(&[
            "versio",
            "-q",
            "score",
            hyp.to_str().unwrap(),
            reference.to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, VersioError::Scoring(_)));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = resolve_format(Path::new("output.docx"), None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            resolve_format(Path::new("output.docx"), Some(FormatArg::Text)).unwrap(),
            FileFormat::Text
        );
    }

    fn sgml(set: &str, docs: &[(&str, &str)]) -> String {
        let mut out = format!("<{set} setid=\"t\">\n");
        for (id, seg) in docs {
            out.push_str(&format!("<doc docid=\"{id}\">\n<seg id=\"1\">{seg}</seg>\n</doc>\n"));
        }
        out.push_str(&format!("</{set}>\n"));
        out
    }

    #[test]
    fn test_score_detects_sgml_and_aligns() {
        let dir = TempDir::new().unwrap();
        let hyp = dir.path().join("hyp.sgm");
        let reference = dir.path().join("ref.sgm");
        fs::write(&hyp, sgml("tstset", &[("d2", "zwei drei"), ("d1", "eins zwei")])).unwrap();
        fs::write(&reference, sgml("refset", &[("d1", "eins zwei"), ("d2", "zwei drei")])).unwrap();

        run(&[
            "versio",
            "-q",
            "score",
            hyp.to_str().unwrap(),
            reference.to_str().unwrap(),
            "-l",
            "de",
        ])
        .unwrap();
        assert!(dir.path().join("hyp.filtered.sgm").exists());
    }

    #[test]
    fn test_score_checks_declared_type() {
        let dir = TempDir::new().unwrap();
        let hyp = dir.path().join("hyp.txt");
        let reference = dir.path().join("ref.txt");
        fs::write(&hyp, "a b c\n").unwrap();
        fs::write(&reference, "a b c\n").unwrap();

        let args = [
            "versio",
            "-q",
            "score",
            hyp.to_str().unwrap(),
            reference.to_str().unwrap(),
        ];
        run(&args).unwrap();

        let mut typed = args.to_vec();
        typed.extend(["--hyp-type", "sgml"]);
        assert!(run(&typed).unwrap_err().is_validation());
    }

    fn submission_config(dir: &Path, name: &str, test_set: &str, lines: &str) -> std::path::PathBuf {
        let output = dir.join(format!("{name}.txt"));
        fs::write(&output, lines).unwrap();
        let config = SubmissionConfig::new(name, FileFormat::Text, output).with_test_set(test_set);
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, config.to_json().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_judge_appends_and_tallies() {
        let dir = TempDir::new().unwrap();
        let a = submission_config(dir.path(), "a", "wmt21", "eins\nzwei\n");
        let b = submission_config(dir.path(), "b", "wmt21", "eins\ndrei\n");
        let store = dir.path().join("rankings.jsonl");
        let judge = |line: &str, rank: &str| {
            run(&[
                "versio",
                "-q",
                "judge",
                a.to_str().unwrap(),
                b.to_str().unwrap(),
                "--line",
                line,
                "--rank",
                rank,
                "-o",
                store.to_str().unwrap(),
            ])
        };

        judge("2", "A>B").unwrap();
        judge("1", "equal").unwrap();
        assert!(judge("3", "A>B").unwrap_err().is_validation());
        assert!(judge("1", "A>>B").unwrap_err().is_validation());

        let stored = load_rankings(&store).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].segment_a, "zwei");
        assert_eq!(stored[0].segment_b, "drei");
        assert_eq!(stored[1].rank, PairwiseRank::Equal);
    }

    #[test]
    fn test_compare_refuses_other_test_sets() {
        let dir = TempDir::new().unwrap();
        let a = submission_config(dir.path(), "a", "wmt21", "eins\n");
        let b = submission_config(dir.path(), "b", "wmt20", "eins\n");

        let err = run(&["versio", "-q", "compare", a.to_str().unwrap(), b.to_str().unwrap()]).unwrap_err();
        assert!(err.is_validation());
    }
}
