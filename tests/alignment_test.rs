use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use versio::alignment::{SgmlFile, align_files, pair_with_reference};
use versio::error::VersioError;
use versio::segment::MISSING_TRANSLATION;

fn write_sgml(dir: &Path, name: &str, set: &str, docs: &[(&str, &str)]) -> PathBuf {
    let mut out = format!("<{set} setid=\"newstest2019\" srclang=\"en\" trglang=\"de\">\n");
    for (id, text) in docs {
        out.push_str(&format!("<doc sysid=\"s\" docid=\"{id}\" genre=\"news\">\n"));
        out.push_str(&format!("<seg id=\"1\">{text}</seg>\n"));
        out.push_str("</doc>\n");
    }
    out.push_str(&format!("</{set}>\n"));
    let path = dir.join(name);
    fs::write(&path, out).unwrap();
    path
}

#[test]
fn test_hypothesis_is_reordered_to_reference() {
    let dir = tempdir().unwrap();
    let reference = write_sgml(
        dir.path(),
        "ref.sgm",
        "refset",
        &[("d1", "r1"), ("testsuite-x", "rt"), ("d3", "r3"), ("d2", "r2")],
    );
    let hypothesis = write_sgml(
        dir.path(),
        "hyp.sgm",
        "tstset",
        &[("d2", "h2"), ("d1", "h1"), ("d4", "h4")],
    );

    let filtered_path = align_files(&reference, &hypothesis).unwrap();
    assert_eq!(filtered_path, dir.path().join("hyp.filtered.sgm"));

    let filtered = SgmlFile::from_path(&filtered_path).unwrap();
    let ids: Vec<&str> = filtered.documents.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d2"]);
    assert!(filtered.header.as_deref().unwrap().starts_with("<tstset"));

    let reference = SgmlFile::from_path(&reference).unwrap();
    let (hyp, refs) = pair_with_reference(&reference, &filtered);
    assert_eq!(refs, vec!["r1", "r3", "r2"]);
    assert_eq!(hyp, vec!["h1", MISSING_TRANSLATION, "h2"]);
}

#[test]
fn test_filtered_file_is_reused() {
    let dir = tempdir().unwrap();
    let reference = write_sgml(dir.path(), "ref.sgm", "refset", &[("d1", "r1")]);
    let hypothesis = write_sgml(dir.path(), "hyp.sgm", "tstset", &[("d1", "h1")]);

    let first = align_files(&reference, &hypothesis).unwrap();
    fs::write(&hypothesis, "not sgml at all").unwrap();
    let second = align_files(&reference, &hypothesis).unwrap();
    assert_eq!(first, second);
    assert!(fs::read_to_string(&second).unwrap().contains("h1"));
}

#[test]
fn test_disjoint_documents_fail() {
    let dir = tempdir().unwrap();
    let reference = write_sgml(dir.path(), "ref.sgm", "refset", &[("d1", "r1")]);
    let hypothesis = write_sgml(dir.path(), "hyp.sgm", "tstset", &[("other", "h")]);

    let err = align_files(&reference, &hypothesis).unwrap_err();
    assert!(matches!(err, VersioError::Alignment(_)));
    assert!(!dir.path().join("hyp.filtered.sgm").exists());
}
