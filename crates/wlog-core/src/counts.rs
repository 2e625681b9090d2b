//! Process and product counts: how much was typed versus how much survived.

use std::fmt;

use serde::Serialize;

use crate::key::{KeyAction, KeyRecord};
use crate::metrics::TokenStats;
use crate::record::EventLog;
use crate::segment::{TextProfile, words};
use crate::token::{Token, TokenKind};

/// Counts over the produced text (every insertion) and the final text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessCounts {
    /// Header end minus header start, in seconds.
    pub recording_seconds: Option<f64>,
    pub writing_minutes: f64,

    pub produced_chars: usize,
    /// Characters inserted in multi-character chunks (paste, autocomplete).
    pub copied_chars: usize,
    pub typed_chars_incl_spaces: usize,
    pub typed_chars_excl_spaces: usize,
    pub produced: TextProfile,

    pub final_chars_incl_spaces: usize,
    pub final_chars_excl_spaces: usize,
    pub final_words: usize,
    pub final_paragraphs: usize,

    /// Keydowns that are not a single letter, digit or space.
    pub non_character_keys: usize,
}

impl ProcessCounts {
    pub fn compute(log: &EventLog, tokens: &[Token]) -> Self {
        let mut counts = Self {
            recording_seconds: match (log.header.starttime, log.header.endtime) {
                (Some(start), Some(end)) => Some(seconds(end.saturating_sub(start))),
                _ => None,
            },
            ..Self::default()
        };

        let writing_ms = match (log.text.keys().next(), log.text.keys().next_back()) {
            (Some(first), Some(last)) => last.saturating_sub(*first),
            _ => 0,
        };
        counts.writing_minutes = seconds(writing_ms) / 60.0;

        for token in tokens {
            let TokenKind::Text { value, .. } = &token.kind else {
                continue;
            };
            let len = value.chars().count();
            counts.produced_chars += len;
            if len > 1 {
                counts.copied_chars += len;
            } else {
                counts.typed_chars_incl_spaces += len;
                if value != " " {
                    counts.typed_chars_excl_spaces += len;
                }
            }
        }
        counts.produced = TextProfile::of(&TokenStats::from_tokens(tokens).produced_text);

        let final_text = log.final_text();
        let final_profile = TextProfile::of(final_text);
        counts.final_chars_incl_spaces = final_text.chars().count();
        counts.final_chars_excl_spaces = final_text.chars().filter(|c| !c.is_whitespace()).count();
        counts.final_words = words(final_text).len();
        counts.final_paragraphs = final_profile.paragraphs;

        counts.non_character_keys = log
            .key
            .values()
            .filter_map(|payload| KeyRecord::parse(payload))
            .filter(|r| r.action == KeyAction::KeyDown)
            .filter(|r| !is_character_key(&r.label))
            .count();
        counts
    }

    fn per_minute(&self, value: usize) -> f64 {
        if self.writing_minutes > 0.0 {
            as_f64(value) / self.writing_minutes
        } else {
            0.0
        }
    }

    /// `(final chars + non-character keys) / produced chars`.
    pub fn produced_ratio(&self) -> f64 {
        ratio(
            self.final_chars_incl_spaces + self.non_character_keys,
            self.produced_chars,
        )
    }
}

fn is_character_key(label: &str) -> bool {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_alphanumeric() || c == ' ',
        _ => false,
    }
}

#[allow(clippy::cast_precision_loss)]
const fn as_f64(value: usize) -> f64 {
    value as f64
}

#[allow(clippy::cast_precision_loss)]
fn seconds(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        as_f64(numerator) / as_f64(denominator)
    }
}

impl fmt::Display for ProcessCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recording_seconds {
            Some(s) => writeln!(f, "Recording time: {s:.2}")?,
            None => writeln!(f, "Recording time: n/a")?,
        }

        let p = &self.produced;
        writeln!(f, "Counts (process):")?;
        writeln!(f, "Characters | Total: {}", self.produced_chars)?;
        writeln!(f, "Characters | Total copied: {}", self.copied_chars)?;
        writeln!(f, "Characters | Total typed (incl. spaces): {}", self.typed_chars_incl_spaces)?;
        writeln!(f, "Characters | Per minute (incl. spaces): {:.2}", self.per_minute(self.typed_chars_incl_spaces))?;
        writeln!(f, "Characters | Total typed (excl. spaces): {}", self.typed_chars_excl_spaces)?;
        writeln!(f, "Characters | Per minute (excl. spaces): {:.2}", self.per_minute(self.typed_chars_excl_spaces))?;
        writeln!(f, "Words | Total: {}", p.words)?;
        writeln!(f, "Words | Per minute: {:.2}", self.per_minute(p.words))?;
        writeln!(f, "Words | Mean word length: {:.2}", p.word_length.mean)?;
        writeln!(f, "Words | St. dev. word length: {:.2}", p.word_length.sd)?;
        writeln!(f, "Sentences | Total: {}", p.sentences)?;
        writeln!(f, "Sentences | Mean characters/sentence: {:.2}", p.sentence_chars.mean)?;
        writeln!(f, "Sentences | St. dev. characters/sentence: {:.2}", p.sentence_chars.sd)?;
        writeln!(f, "Sentences | Mean words/sentence: {:.2}", p.sentence_words.mean)?;
        writeln!(f, "Sentences | St. dev. words/sentence: {:.2}", p.sentence_words.sd)?;
        writeln!(f, "Paragraphs | Total: {}", p.paragraphs)?;
        writeln!(f, "Paragraphs | Mean characters/paragraph: {:.2}", p.paragraph_chars.mean)?;
        writeln!(f, "Paragraphs | St. dev. characters/paragraph: {:.2}", p.paragraph_chars.sd)?;
        writeln!(f, "Paragraphs | Mean words/paragraph: {:.2}", p.paragraph_words.mean)?;
        writeln!(f, "Paragraphs | St. dev. words/paragraph: {:.2}", p.paragraph_words.sd)?;

        writeln!(f, "Counts (final text):")?;
        writeln!(f, "Characters | Total (incl. spaces): {}", self.final_chars_incl_spaces)?;
        writeln!(f, "Characters | Per minute (incl. spaces): {:.2}", self.per_minute(self.final_chars_incl_spaces))?;
        writeln!(f, "Characters | Total (excl. spaces): {}", self.final_chars_excl_spaces)?;
        writeln!(f, "Characters | Per minute (excl. spaces): {:.2}", self.per_minute(self.final_chars_excl_spaces))?;
        writeln!(f, "Words | Total: {}", self.final_words)?;
        writeln!(f, "Words | Per minute: {:.2}", self.per_minute(self.final_words))?;
        writeln!(f, "Paragraphs | Total: {}", self.final_paragraphs)?;

        writeln!(f, "Counts (ratios/proportions):")?;
        writeln!(f, "Ratio | Produced ratio (incl. spaces): {:.3}", self.produced_ratio())?;
        writeln!(f, "Proportion | Characters (incl. spaces): {:.3}", ratio(self.final_chars_incl_spaces, self.typed_chars_incl_spaces))?;
        writeln!(f, "Proportion | Characters (excl. spaces): {:.3}", ratio(self.final_chars_excl_spaces, self.typed_chars_excl_spaces))?;
        write!(f, "Proportion | Words: {:.3}", ratio(self.final_words, p.words))
    }
}
