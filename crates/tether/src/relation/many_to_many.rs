//! Owner of a relation's two halves.

use std::fmt;

use super::RelationKey;
use super::index::SideIndex;
use super::kind::{ManyToManyConfig, SideKind};
use crate::error::CollectionResult;

/// A bidirectional many-to-many relation between `L` keys and `R` keys.
///
/// # Example
///
/// ```
/// use tether::relation::{ManyToMany, SideKind};
///
/// let rel: ManyToMany<u32, char> = ManyToMany::new(SideKind::Set, SideKind::List);
/// rel.left().get_or_create(1).append('a').unwrap();
/// assert!(rel.right().get(&'a').unwrap().contains(&1));
/// ```
pub struct ManyToMany<L: RelationKey, R: RelationKey> {
    left: SideIndex<L, R>,
    right: SideIndex<R, L>,
    config: ManyToManyConfig,
}

impl<L: RelationKey, R: RelationKey> ManyToMany<L, R> {
    #[must_use]
    pub fn new(left: SideKind, right: SideKind) -> Self {
        Self::with_config(ManyToManyConfig::new(left, right))
    }

    #[must_use]
    pub fn with_config(config: ManyToManyConfig) -> Self {
        let left = SideIndex::new(config.left);
        let right = SideIndex::new(config.right);
        left.link_to(&right);
        tracing::debug!(left = %config.left, right = %config.right, "created relation");
        Self {
            left,
            right,
            config,
        }
    }

    /// Build from kind names (`list`, `checked_list`, `set`, `counter`).
    ///
    /// # Errors
    ///
    /// [`CollectionError::UnknownKind`](crate::error::CollectionError::UnknownKind)
    /// for an unrecognized name.
    pub fn from_kinds(left: &str, right: &str) -> CollectionResult<Self> {
        Ok(Self::with_config(ManyToManyConfig::from_names(left, right)?))
    }

    #[must_use]
    pub fn config(&self) -> ManyToManyConfig {
        self.config
    }

    #[must_use]
    pub fn left(&self) -> &SideIndex<L, R> {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &SideIndex<R, L> {
        &self.right
    }

    /// Both halves, left first.
    #[must_use]
    pub fn sides(&self) -> (&SideIndex<L, R>, &SideIndex<R, L>) {
        (&self.left, &self.right)
    }

    /// Every related pair as seen from the left, one entry per occurrence.
    #[must_use]
    pub fn pairs(&self) -> Vec<(L, R)> {
        self.left
            .entries()
            .into_iter()
            .flat_map(|(l, side)| side.items().into_iter().map(move |r| (l.clone(), r)))
            .collect()
    }

    /// Whether every membership on one half is mirrored on the other.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        mirrored(&self.left, &self.right) && mirrored(&self.right, &self.left)
    }
}

fn mirrored<A: RelationKey, B: RelationKey>(from: &SideIndex<A, B>, to: &SideIndex<B, A>) -> bool {
    from.entries().into_iter().all(|(a, side)| {
        side.items()
            .iter()
            .all(|b| to.get(b).is_ok_and(|back| back.contains(&a)))
    })
}

impl<L: RelationKey, R: RelationKey> Default for ManyToMany<L, R> {
    fn default() -> Self {
        Self::with_config(ManyToManyConfig::default())
    }
}

impl<L: RelationKey, R: RelationKey> fmt::Debug for ManyToMany<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManyToMany")
            .field("config", &self.config)
            .field("left", &self.left)
            .field("right", &self.right)
            .finish()
    }
}
