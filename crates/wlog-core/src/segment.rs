//! Word, sentence and paragraph segmentation heuristics.
//!
//! A word is a run of letters with inner digits, apostrophes and hyphens.
//! Sentences end at `.`, `!`, `?` or a line break. Paragraphs are separated
//! by blank lines.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}[\p{L}\p{N}'’-]*").expect("valid word pattern"));
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+|\n+").expect("valid sentence pattern"));
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("valid paragraph pattern"));

pub fn words(text: &str) -> Vec<&str> {
    WORD.find_iter(text).map(|m| m.as_str()).collect()
}

/// Non-empty, trimmed sentences.
pub fn sentences(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    SENTENCE_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-empty, trimmed paragraphs.
///
/// Text without blank lines falls back to one paragraph per line.
pub fn paragraphs(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    let blocks: Vec<String> = BLANK_LINE
        .split(&normalized)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if blocks.len() > 1 {
        return blocks;
    }
    normalized
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for fewer than two values.
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Middle value, averaging the two central values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mean and deviation of one length distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Spread {
    pub mean: f64,
    pub sd: f64,
}

impl Spread {
    #[allow(clippy::cast_precision_loss)]
    fn of(lengths: impl IntoIterator<Item = usize>) -> Self {
        let values: Vec<f64> = lengths.into_iter().map(|n| n as f64).collect();
        Self {
            mean: mean(&values),
            sd: std_dev(&values),
        }
    }
}

/// Segmentation statistics for one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextProfile {
    pub chars: usize,
    pub words: usize,
    pub word_length: Spread,
    pub sentences: usize,
    pub sentence_chars: Spread,
    pub sentence_words: Spread,
    pub paragraphs: usize,
    pub paragraph_chars: Spread,
    pub paragraph_words: Spread,
}

impl TextProfile {
    pub fn of(text: &str) -> Self {
        let word_list = words(text);
        let sentence_list = sentences(text);
        let paragraph_list = paragraphs(text);
        Self {
            chars: text.chars().count(),
            words: word_list.len(),
            word_length: Spread::of(word_list.iter().map(|w| w.chars().count())),
            sentences: sentence_list.len(),
            sentence_chars: Spread::of(sentence_list.iter().map(|s| s.chars().count())),
            sentence_words: Spread::of(sentence_list.iter().map(|s| words(s).len())),
            paragraphs: paragraph_list.len(),
            paragraph_chars: Spread::of(paragraph_list.iter().map(|p| p.chars().count())),
            paragraph_words: Spread::of(paragraph_list.iter().map(|p| words(p).len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_words() {
        assert_eq!(
            words("It's a well-known fact, 42 times."),
            vec!["It's", "a", "well-known", "fact", "times"]
        );
        assert_eq!(words("naïve café"), vec!["naïve", "café"]);
        assert!(words("  123 ...").is_empty());
    }

    #[test]
    fn test_splits_sentences() {
        assert_eq!(
            sentences("One. Two!? Three\nFour"),
            vec!["One", "Two", "Three", "Four"]
        );
        assert!(sentences("...").is_empty());
    }

    #[test]
    fn test_splits_paragraphs_on_blank_lines() {
        assert_eq!(
            paragraphs("First para.\nStill first.\n\nSecond."),
            vec!["First para.\nStill first.", "Second."]
        );
    }

    #[test]
    fn test_paragraphs_fall_back_to_lines() {
        assert_eq!(paragraphs("a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(paragraphs("single"), vec!["single"]);
        assert!(paragraphs("").is_empty());
    }

    #[test]
    fn test_statistics() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert_eq!(std_dev(&[2.0, 4.0]), 1.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_profiles_text() {
        let profile = TextProfile::of("I am here. You go");
        assert_eq!(profile.chars, 17);
        assert_eq!(profile.words, 5);
        assert_eq!(profile.sentences, 2);
        assert_eq!(profile.paragraphs, 1);
        assert!((profile.word_length.mean - 2.4).abs() < 1e-9);
        assert_eq!(profile.sentence_words.mean, 2.5);
        assert_eq!(profile.sentence_words.sd, 0.5);
    }
}
