//! N-gram counting shared by the metrics.

use ahash::AHashMap;

/// Counts of n-grams of a single order.
pub type NgramCounts = AHashMap<String, usize>;

/// Count the word n-grams of order `n`. Words are joined with a single
/// space, which is safe because tokens never contain whitespace.
pub fn word_ngrams(words: &[String], n: usize) -> NgramCounts {
    let mut counts = NgramCounts::new();
    if n == 0 || words.len() < n {
        return counts;
    }
    for window in words.windows(n) {
        *counts.entry(window.join(" ")).or_insert(0) += 1;
    }
    counts
}

/// Count the character n-grams of order `n`.
pub fn char_ngrams(chars: &[char], n: usize) -> NgramCounts {
    let mut counts = NgramCounts::new();
    if n == 0 || chars.len() < n {
        return counts;
    }
    for window in chars.windows(n) {
        *counts.entry(window.iter().collect()).or_insert(0) += 1;
    }
    counts
}

/// Total number of n-grams.
pub fn total(counts: &NgramCounts) -> usize {
    counts.values().sum()
}

/// Hypothesis n-gram count clipped by the reference count, summed.
pub fn clipped_matches(hyp: &NgramCounts, reference: &NgramCounts) -> usize {
    hyp.iter()
        .map(|(gram, &count)| count.min(reference.get(gram).copied().unwrap_or(0)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_word_ngrams() {
        let counts = word_ngrams(&words("the cat the cat"), 2);
        assert_eq!(counts.get("the cat"), Some(&2));
        assert_eq!(counts.get("cat the"), Some(&1));
        assert_eq!(total(&counts), 3);
        assert!(word_ngrams(&words("one"), 2).is_empty());
    }

    #[test]
    fn test_char_ngrams() {
        let chars: Vec<char> = "abab".chars().collect();
        let counts = char_ngrams(&chars, 2);
        assert_eq!(counts.get("ab"), Some(&2));
        assert_eq!(counts.get("ba"), Some(&1));
    }

    #[test]
    fn test_clipped_matches() {
        let hyp = word_ngrams(&words("the the the"), 1);
        let reference = word_ngrams(&words("the cat"), 1);
        assert_eq!(clipped_matches(&hyp, &reference), 1);
    }
}
