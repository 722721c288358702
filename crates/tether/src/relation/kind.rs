//! Container kinds and relation configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::CollectionError;

/// How one side of a relation stores the keys related to each of its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SideKind {
    /// Ordered, duplicates allowed.
    List,
    /// Ordered; a repeated key is reported after every mutation.
    CheckedList,
    /// Unordered, no duplicates.
    #[default]
    Set,
    /// Unordered, duplicates counted.
    Counter,
}

impl SideKind {
    pub const ALL: [Self; 4] = [Self::List, Self::CheckedList, Self::Set, Self::Counter];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::CheckedList => "checked_list",
            Self::Set => "set",
            Self::Counter => "counter",
        }
    }

    /// Whether positions are meaningful (`List` and `CheckedList`).
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::List | Self::CheckedList)
    }
}

impl fmt::Display for SideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SideKind {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CollectionError::UnknownKind(s.to_string()))
    }
}

/// Container kinds for the two sides of a `ManyToMany`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManyToManyConfig {
    /// Kind of the left side. Default: `set`.
    pub left: SideKind,
    /// Kind of the right side. Default: `set`.
    pub right: SideKind,
}

impl ManyToManyConfig {
    #[must_use]
    pub const fn new(left: SideKind, right: SideKind) -> Self {
        Self { left, right }
    }

    /// Parse both kinds by name.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownKind`] for an unrecognized name.
    pub fn from_names(left: &str, right: &str) -> Result<Self, CollectionError> {
        Ok(Self::new(left.parse()?, right.parse()?))
    }

    #[must_use]
    pub const fn with_left(mut self, kind: SideKind) -> Self {
        self.left = kind;
        self
    }

    #[must_use]
    pub const fn with_right(mut self, kind: SideKind) -> Self {
        self.right = kind;
        self
    }
}
