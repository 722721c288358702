//! Error taxonomy shared by sequences and relations.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Variant |
//! |---------|-------|---------|
//! | Absent value | `remove` of an item the collection does not hold | [`CollectionError::NotFound`] |
//! | Bad position | index past the end | [`CollectionError::IndexOutOfRange`] |
//! | Resize of an extended slice | step ≠ 1 with unequal lengths | [`CollectionError::Unsupported`] |
//! | Zero slice step | `Slice::step(0)` | [`CollectionError::InvalidSlice`] |
//! | Duplicate in a checked list | any mutation leaving a repeated key | [`CollectionError::DuplicateKeys`] |
//! | Unknown kind name | `"vector".parse::<SideKind>()` | [`CollectionError::UnknownKind`] |
//! | Stale listener token | explicit removal of an unregistered listener | [`CollectionError::ListenerNotFound`] |
//! | Dropped relation | mutating a side after its `ManyToMany` is gone | [`CollectionError::Detached`] |

use std::fmt;

use crate::reactive::ListenerToken;

/// Errors from collection and relation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The value is not held by the collection.
    NotFound { value: String, collection: String },
    /// A positional index is past the end of an ordered container.
    IndexOutOfRange { index: usize, len: usize },
    /// The operation is not defined for this container.
    Unsupported(String),
    /// A slice could not be resolved (zero step).
    InvalidSlice(String),
    /// A checked list holds repeated keys after `operation`.
    DuplicateKeys {
        operation: String,
        values: Vec<String>,
    },
    /// A container kind name did not match any known kind.
    UnknownKind(String),
    /// The token does not name a live registration.
    ListenerNotFound(ListenerToken),
    /// The opposite side index has been dropped.
    Detached { collection: String },
}

impl CollectionError {
    pub(crate) fn not_found(value: &impl fmt::Debug, collection: impl Into<String>) -> Self {
        Self::NotFound {
            value: format!("{value:?}"),
            collection: collection.into(),
        }
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { value, collection } => {
                write!(f, "{value} not in {collection}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::Unsupported(msg) => write!(f, "unsupported operation: {msg}"),
            Self::InvalidSlice(msg) => write!(f, "invalid slice: {msg}"),
            Self::DuplicateKeys { operation, values } => write!(
                f,
                "duplicates detected in list check after {operation}: [{}]",
                values.join(", ")
            ),
            Self::UnknownKind(kind) => write!(f, "unknown container kind '{kind}'"),
            Self::ListenerNotFound(token) => write!(f, "listener {token:?} not registered"),
            Self::Detached { collection } => {
                write!(f, "{collection} is detached from its relation")
            }
        }
    }
}

impl std::error::Error for CollectionError {}

/// Result type for collection operations.
pub type CollectionResult<T = ()> = Result<T, CollectionError>;
