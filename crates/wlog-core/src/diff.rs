//! Single-region text differences.
//!
//! Two snapshots are compared by stripping their common prefix and common
//! suffix; whatever remains in the middle is the one changed region. All
//! positions are character (Unicode scalar) indices.

use std::fmt;

/// The changed middle of two texts, with the untouched prefix and suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRegion {
    pub prefix: String,
    pub deleted: String,
    pub inserted: String,
    pub suffix: String,
    /// Character length of `prefix`: the position where the change starts.
    pub position: usize,
}

/// A change that the reconciler can express as one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert { position: usize, text: String },
    Delete { position: usize, count: usize },
}

impl Edit {
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Insert { position, .. } | Self::Delete { position, .. } => *position,
        }
    }
}

/// Shape of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditClass {
    Unchanged,
    Insert,
    Delete,
    Replace,
}

impl EditRegion {
    /// Computes the region that turns `old` into `new`.
    #[must_use]
    pub fn between(old: &str, new: &str) -> Self {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();

        let prefix = old_chars
            .iter()
            .zip(&new_chars)
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = old_chars[prefix..]
            .iter()
            .rev()
            .zip(new_chars[prefix..].iter().rev())
            .take_while(|(a, b)| a == b)
            .count();

        Self {
            prefix: old_chars[..prefix].iter().collect(),
            deleted: old_chars[prefix..old_chars.len() - suffix].iter().collect(),
            inserted: new_chars[prefix..new_chars.len() - suffix].iter().collect(),
            suffix: old_chars[old_chars.len() - suffix..].iter().collect(),
            position: prefix,
        }
    }

    #[must_use]
    pub fn class(&self) -> EditClass {
        match (self.deleted.is_empty(), self.inserted.is_empty()) {
            (true, true) => EditClass::Unchanged,
            (true, false) => EditClass::Insert,
            (false, true) => EditClass::Delete,
            (false, false) => EditClass::Replace,
        }
    }

    /// The region as a pure insert or pure delete, if it is one.
    #[must_use]
    pub fn single_edit(&self) -> Option<Edit> {
        match self.class() {
            EditClass::Insert => Some(Edit::Insert {
                position: self.position,
                text: self.inserted.clone(),
            }),
            EditClass::Delete => Some(Edit::Delete {
                position: self.position,
                count: self.deleted.chars().count(),
            }),
            EditClass::Unchanged | EditClass::Replace => None,
        }
    }

    /// Character length of the inserted text.
    #[must_use]
    pub fn inserted_len(&self) -> usize {
        self.inserted.chars().count()
    }

    /// Character length of the deleted text.
    #[must_use]
    pub fn deleted_len(&self) -> usize {
        self.deleted.chars().count()
    }

    /// The region as an ordered list of operations, empty parts omitted.
    #[must_use]
    pub fn ops(&self) -> Vec<DiffOp<'_>> {
        [
            DiffOp::Equal(&self.prefix),
            DiffOp::Delete(&self.deleted),
            DiffOp::Insert(&self.inserted),
            DiffOp::Equal(&self.suffix),
        ]
        .into_iter()
        .filter(|op| !op.text().is_empty())
        .collect()
    }
}

/// One diff operation, rendered as `(op,"text")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

impl<'a> DiffOp<'a> {
    /// `-1` delete, `0` equal, `1` insert.
    #[must_use]
    pub const fn code(&self) -> i8 {
        match self {
            Self::Equal(_) => 0,
            Self::Delete(_) => -1,
            Self::Insert(_) => 1,
        }
    }

    #[must_use]
    pub const fn text(&self) -> &'a str {
        match self {
            Self::Equal(t) | Self::Delete(t) | Self::Insert(t) => t,
        }
    }
}

impl fmt::Display for DiffOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted = serde_json::to_string(self.text()).map_err(|_| fmt::Error)?;
        write!(f, "({},{quoted})", self.code())
    }
}
