//! Payload grammars for key, cursor and scroll records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keys that never change text on their own.
const MODIFIER_KEYS: &[&str] = &[
    "shift", "control", "ctrl", "alt", "altgraph", "meta", "os", "super", "hyper", "capslock",
];

/// Kind prefix of a key record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    KeyDown,
    KeyUp,
    Repeat,
    MouseDown,
    MouseUp,
    MouseMove,
}

impl KeyAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::Repeat => "repeat",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
        }
    }

    /// Whether this action can change the document (`keydown` or `repeat`).
    #[must_use]
    pub const fn is_press(&self) -> bool {
        matches!(self, Self::KeyDown | Self::Repeat)
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for KeyAction {
    type Err = UnknownKeyAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keydown" => Ok(Self::KeyDown),
            "keyup" => Ok(Self::KeyUp),
            "repeat" => Ok(Self::Repeat),
            "mousedown" => Ok(Self::MouseDown),
            "mouseup" => Ok(Self::MouseUp),
            "mousemove" => Ok(Self::MouseMove),
            _ => Err(UnknownKeyAction(s.to_string())),
        }
    }
}

/// Error type for unrecognized key record kinds.
#[derive(Debug, Clone)]
pub struct UnknownKeyAction(String);

impl fmt::Display for UnknownKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key action: {}", self.0)
    }
}

impl std::error::Error for UnknownKeyAction {}

/// Canonical navigation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NavCode {
    Left,
    Right,
    Up,
    Down,
    Cr,
}

impl NavCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Cr => "CR",
        }
    }

    /// Maps a key label to a navigation code, case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "arrowleft" | "left" => Some(Self::Left),
            "arrowright" | "right" => Some(Self::Right),
            "arrowup" | "up" => Some(Self::Up),
            "arrowdown" | "down" => Some(Self::Down),
            "enter" | "return" => Some(Self::Cr),
            _ => None,
        }
    }
}

impl fmt::Display for NavCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text-removing control keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKey {
    /// Removes the character before the cursor.
    Backspace,
    /// Removes the character after the cursor.
    Delete,
}

/// What a key label means to the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Modifier,
    Navigation(NavCode),
    Printable(char),
    EditControl(EditKey),
    Other,
}

impl KeyClass {
    /// Classifies a key label.
    #[must_use]
    pub fn classify(label: &str) -> Self {
        let mut chars = label.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Self::Printable(c);
        }
        let lower = label.trim().to_ascii_lowercase();
        if MODIFIER_KEYS.contains(&lower.as_str()) {
            return Self::Modifier;
        }
        if let Some(code) = NavCode::from_label(&lower) {
            return Self::Navigation(code);
        }
        match lower.as_str() {
            "backspace" => Self::EditControl(EditKey::Backspace),
            "delete" | "del" => Self::EditControl(EditKey::Delete),
            _ => Self::Other,
        }
    }

    /// Single alphanumeric character keys.
    #[must_use]
    pub fn is_alphanumeric(&self) -> bool {
        matches!(self, Self::Printable(c) if c.is_alphanumeric())
    }
}

/// A parsed key record payload: `"<kind>: <label>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    pub action: KeyAction,
    pub label: String,
}

impl KeyRecord {
    /// Parses a key payload.
    ///
    /// Splits at the first `:` and strips exactly one separating space, so
    /// the space bar keeps its label `" "`.
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        let (kind, rest) = payload.split_once(':')?;
        let action = kind.parse().ok()?;
        let label = rest.strip_prefix(' ').unwrap_or(rest);
        if label.is_empty() {
            return None;
        }
        Some(Self {
            action,
            label: label.to_string(),
        })
    }

    #[must_use]
    pub fn class(&self) -> KeyClass {
        KeyClass::classify(&self.label)
    }
}

/// A cursor record payload: `"<start>:<end>"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorRange {
    pub start: usize,
    pub end: usize,
}

impl CursorRange {
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        let (start, end) = payload.split_once(':')?;
        Some(Self {
            start: start.trim().parse().ok()?,
            end: end.trim().parse().ok()?,
        })
    }

    /// A range with distinct endpoints.
    #[must_use]
    pub const fn is_selection(&self) -> bool {
        self.start != self.end
    }
}

/// A scroll record payload: `"<top>:<left>"` or a bare `<top>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub top: i64,
    pub left: i64,
}

impl ScrollOffset {
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.split_once(':') {
            Some((top, left)) => Some(Self {
                top: parse_offset(top)?,
                left: parse_offset(left)?,
            }),
            None => Some(Self {
                top: parse_offset(payload)?,
                left: 0,
            }),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_offset(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.round() as i64)
    })
}
