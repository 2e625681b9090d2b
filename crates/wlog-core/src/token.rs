//! Canonical tokens, in-line compaction and reconstruction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::NavCode;

/// Character inserted for a key whose effect could not be resolved.
pub const PLACEHOLDER: char = '?';

/// Session boundary markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Marker {
    Start,
    End,
}

/// What a token does to the reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    Marker { marker: Marker },
    Pause { seconds: f64 },
    Text { value: String, position: usize },
    Delete { count: usize, position: usize },
    Nav { position: usize },
    #[serde(rename = "navkey")]
    NavKey { code: NavCode, repeat: u32 },
    Selection { start: usize, end: usize },
    Unknown,
}

/// One element of the canonical stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(flatten)]
    pub kind: TokenKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// Snapshot text the token was reconciled against.
    pub actual_text: String,
}

impl Token {
    pub fn new(kind: TokenKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reasons: vec![reason.into()],
            actual_text: String::new(),
        }
    }

    /// A token carrying no reason.
    pub const fn bare(kind: TokenKind) -> Self {
        Self {
            kind,
            reasons: Vec::new(),
            actual_text: String::new(),
        }
    }

    #[must_use]
    pub fn with_actual(mut self, text: impl Into<String>) -> Self {
        self.actual_text = text.into();
        self
    }

    pub const fn is_marker(&self) -> bool {
        matches!(self.kind, TokenKind::Marker { .. })
    }

    /// `"<rendered> :: <reasons>"` for the debug listing.
    pub fn debug_line(&self) -> String {
        let reasons = if self.reasons.is_empty() {
            "no reason".to_string()
        } else {
            self.reasons.join("; ")
        };
        format!("{self} :: {reasons}")
    }

    /// Folds `next` into `self` when the compaction rules allow it.
    ///
    /// Returns `true` if `next` was absorbed. The merged token keeps the
    /// first token's reasons and takes the later token's actual text.
    fn absorb(&mut self, next: &Self) -> bool {
        let merged = match (&mut self.kind, &next.kind) {
            (
                TokenKind::Delete { count, position },
                TokenKind::Delete {
                    count: next_count,
                    position: next_position,
                },
            ) => {
                if *next_position == *position {
                    // Forward delete at the same spot
                    *count += next_count;
                    true
                } else if next_position + next_count == *position {
                    // Backspace ending where the previous delete began
                    *count += next_count;
                    *position = *next_position;
                    true
                } else {
                    false
                }
            }
            (
                TokenKind::NavKey { code, repeat },
                TokenKind::NavKey {
                    code: next_code,
                    repeat: next_repeat,
                },
            ) if *code == *next_code => {
                *repeat += next_repeat;
                true
            }
            (TokenKind::Selection { start, end }, TokenKind::Selection { start: s, end: e }) => {
                *start == *s && *end == *e
            }
            (
                TokenKind::Marker { .. }
                | TokenKind::Pause { .. }
                | TokenKind::Text { .. }
                | TokenKind::Delete { .. }
                | TokenKind::Nav { .. }
                | TokenKind::NavKey { .. }
                | TokenKind::Selection { .. }
                | TokenKind::Unknown,
                _,
            ) => false,
        };
        if merged {
            self.actual_text.clone_from(&next.actual_text);
        }
        merged
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Marker {
                marker: Marker::Start,
            } => write!(f, "<START>"),
            TokenKind::Marker {
                marker: Marker::End,
            } => write!(f, "<END>"),
            TokenKind::Pause { seconds } => write!(f, "<{seconds:.2}>"),
            TokenKind::Text { value, .. } => write!(f, "{}", value.replace(' ', "<SPACE>")),
            TokenKind::Delete { count: 1, .. } => write!(f, "<DELETE>"),
            TokenKind::Delete { count, .. } => write!(f, "<DELETE{count}>"),
            TokenKind::Nav { position } => write!(f, "<NAV,{position}>"),
            TokenKind::NavKey { code, repeat: 1 } => write!(f, "<{code}>"),
            TokenKind::NavKey { code, repeat } => write!(f, "<{code}{repeat}>"),
            TokenKind::Selection { start, end } => write!(f, "<SEL,{start},{end}>"),
            TokenKind::Unknown => write!(f, "x"),
        }
    }
}

/// Token sequence with compaction applied on every push.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn push(&mut self, token: Token) {
        if let Some(prev) = self.tokens.last_mut() {
            if prev.absorb(&token) {
                return;
            }
        }
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

/// Runs a token sequence through the compactor.
pub fn compact(tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
    let mut stream = TokenStream::default();
    for token in tokens {
        stream.push(token);
    }
    stream.into_tokens()
}

/// Renders tokens as one concatenated string.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Text and cursor produced by applying tokens in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconstruction {
    pub text: String,
    pub cursor: usize,
}

impl Reconstruction {
    /// Applies one token.
    pub fn apply(&mut self, token: &Token) {
        match &token.kind {
            TokenKind::Marker { .. } | TokenKind::Pause { .. } => {}
            TokenKind::Text { value, position } => {
                self.cursor = *position;
                self.insert(value);
            }
            TokenKind::Delete { count, position } => {
                self.cursor = *position;
                self.delete_forward(*count);
            }
            TokenKind::Nav { position } => self.cursor = *position,
            TokenKind::NavKey { code, repeat } => {
                for _ in 0..*repeat {
                    self.step(*code);
                }
            }
            TokenKind::Selection { end, .. } => self.cursor = *end,
            TokenKind::Unknown => {
                let mut buf = [0; 4];
                self.insert(PLACEHOLDER.encode_utf8(&mut buf));
            }
        }
    }

    /// Character length of the text.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn step(&mut self, code: NavCode) {
        match code {
            NavCode::Left => self.cursor = self.cursor.saturating_sub(1),
            NavCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            NavCode::Up | NavCode::Down => {}
            NavCode::Cr => self.insert("\n"),
        }
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(offset, _)| offset)
    }

    /// Inserts at the cursor, clamped to the text end, and moves past it.
    fn insert(&mut self, value: &str) {
        self.cursor = self.cursor.min(self.len());
        let offset = self.byte_offset(self.cursor);
        self.text.insert_str(offset, value);
        self.cursor += value.chars().count();
    }

    /// Removes up to `count` characters after the cursor.
    fn delete_forward(&mut self, count: usize) {
        self.cursor = self.cursor.min(self.len());
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + count);
        self.text.replace_range(start..end, "");
    }
}

/// Text after applying `tokens[0..=index]` to an empty state.
///
/// An index past the end reconstructs the whole stream.
pub fn reconstruct_prefix(tokens: &[Token], index: usize) -> String {
    let mut state = Reconstruction::default();
    for token in tokens.iter().take(index.saturating_add(1)) {
        state.apply(token);
    }
    state.text
}
