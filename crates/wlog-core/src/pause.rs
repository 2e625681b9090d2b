//! Pause detection and location classification.

use std::fmt;

use serde::Serialize;

/// A silent gap between two consecutive record timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pause {
    pub start: i64,
    pub end: i64,
    pub seconds: f64,
}

/// Gaps of at least `criteria_seconds` between consecutive timestamps.
///
/// `times` must be sorted.
pub fn find_pauses(times: &[i64], criteria_seconds: f64) -> Vec<Pause> {
    times
        .windows(2)
        .filter_map(|pair| {
            let (start, end) = (pair[0], pair[1]);
            #[allow(clippy::cast_precision_loss)]
            let seconds = end.saturating_sub(start) as f64 / 1000.0;
            (end > start && seconds >= criteria_seconds).then_some(Pause {
                start,
                end,
                seconds,
            })
        })
        .collect()
}

/// Where in the text a pause happened, judged from the cursor's neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseLocation {
    BeforeWord,
    WithinWord,
    AfterWord,
    BetweenWords,
    BetweenSentences,
    Unknown,
}

impl PauseLocation {
    pub const ALL: [Self; 6] = [
        Self::BeforeWord,
        Self::WithinWord,
        Self::AfterWord,
        Self::BetweenWords,
        Self::BetweenSentences,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeWord => "before_word",
            Self::WithinWord => "within_word",
            Self::AfterWord => "after_word",
            Self::BetweenWords => "between_words",
            Self::BetweenSentences => "between_sentences",
            Self::Unknown => "unknown",
        }
    }

    /// Classifies a cursor position within `text`.
    ///
    /// Sentence-terminal adjacency wins, looking back past whitespace; then
    /// the alphanumeric class of the two neighbors decides.
    pub fn classify(text: &str, cursor: Option<usize>) -> Self {
        let Some(cursor) = cursor else {
            return Self::Unknown;
        };
        if text.is_empty() {
            return Self::Unknown;
        }
        let chars: Vec<char> = text.chars().collect();
        let cursor = cursor.min(chars.len());
        let prev = cursor.checked_sub(1).and_then(|i| chars.get(i)).copied();
        let next = chars.get(cursor).copied();
        let prev_visible = chars[..cursor].iter().rev().find(|c| !c.is_whitespace());

        let after_terminal = prev.is_some_and(is_terminal)
            || (prev.is_some_and(char::is_whitespace) && prev_visible.copied().is_some_and(is_terminal));
        if after_terminal || next.is_some_and(is_terminal) {
            return Self::BetweenSentences;
        }

        let prev_word = prev.is_some_and(char::is_alphanumeric);
        let next_word = next.is_some_and(char::is_alphanumeric);
        match (prev_word, next_word) {
            (false, true) => Self::BeforeWord,
            (true, true) => Self::WithinWord,
            (true, false) => Self::AfterWord,
            (false, false)
                if prev.is_some_and(char::is_whitespace)
                    && next.is_some_and(char::is_whitespace) =>
            {
                Self::BetweenWords
            }
            (false, false) => Self::Unknown,
        }
    }
}

impl fmt::Display for PauseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}
