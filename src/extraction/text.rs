//! Plain-text extractor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::extraction::SegmentExtractor;
use crate::segment::{CanonicalStream, Selector};

/// Reads one segment per physical line, trimming trailing whitespace.
///
/// A text file holds a single side, so the selector and collection are not
/// consulted. The file is its own derived text; nothing is cached.
#[derive(Clone, Debug, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new plain-text extractor.
    pub fn new() -> Self {
        TextExtractor
    }
}

impl SegmentExtractor for TextExtractor {
    fn extract(
        &self,
        path: &Path,
        _selector: &Selector,
        _collection: Option<&str>,
    ) -> Result<CanonicalStream> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?.trim_end().to_string());
        }
        Ok(lines)
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_text_extractor_trims_trailing_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hyp.txt");
        fs::write(&path, "  Hallo Welt \t\r\n\nzweite Zeile\n").unwrap();

        let lines = TextExtractor::new()
            .extract(&path, &Selector::Source, None)
            .unwrap();
        assert_eq!(lines, vec!["  Hallo Welt", "", "zweite Zeile"]);
        assert!(!dir.path().join("hyp.txt.txt").exists());
    }

    #[test]
    fn test_extractor_name() {
        assert_eq!(TextExtractor::new().name(), "text");
    }
}
