//! `start:stop:step` ranges over ordered containers.
//!
//! [`Slice`] follows the usual extended-slice rules: missing bounds default to
//! the ends, negative bounds count from the end, out-of-range bounds clamp,
//! and a negative step walks backwards. [`Slice::indices`] resolves a slice
//! against a length into concrete [`Bounds`].
//!
//! # Invariants
//!
//! 1. Resolved bounds never address a position outside `0..len`.
//! 2. A step of zero is rejected at resolution time.
//! 3. Only step-1 slices may change a container's length on assignment.

use std::fmt;

use crate::error::{CollectionError, CollectionResult};

/// An unresolved slice; each bound may be absent or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    /// `start:stop`.
    #[must_use]
    pub const fn new(start: isize, stop: isize) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
            step: None,
        }
    }

    /// `:` (the whole container).
    #[must_use]
    pub const fn full() -> Self {
        Self {
            start: None,
            stop: None,
            step: None,
        }
    }

    /// `start:`.
    #[must_use]
    pub const fn starting(start: isize) -> Self {
        Self {
            start: Some(start),
            stop: None,
            step: None,
        }
    }

    /// `:stop`.
    #[must_use]
    pub const fn ending(stop: isize) -> Self {
        Self {
            start: None,
            stop: Some(stop),
            step: None,
        }
    }

    /// `start:stop` from already resolved positions.
    pub(crate) const fn span(start: usize, stop: usize) -> Self {
        Self::new(start as isize, stop as isize)
    }

    /// Same bounds with an explicit step.
    #[must_use]
    pub const fn step(self, step: isize) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    /// Resolve against a container of length `len`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::InvalidSlice`] if the step is zero.
    pub fn indices(&self, len: usize) -> CollectionResult<Bounds> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(CollectionError::InvalidSlice(
                "slice step cannot be zero".into(),
            ));
        }
        let len = len as isize;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });
        Ok(Bounds { start, stop, step })
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str(":")?;
        if let Some(stop) = self.stop {
            write!(f, "{stop}")?;
        }
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

/// A slice resolved against a concrete length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub start: isize,
    pub stop: isize,
    pub step: isize,
}

impl Bounds {
    /// Number of positions addressed.
    #[must_use]
    pub fn len(&self) -> usize {
        let n = if self.step > 0 && self.start < self.stop {
            (self.stop - self.start - 1) / self.step + 1
        } else if self.step < 0 && self.stop < self.start {
            (self.start - self.stop - 1) / (-self.step) + 1
        } else {
            0
        };
        n as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Addressed positions, in slice order.
    #[must_use]
    pub fn positions(&self) -> Vec<usize> {
        (0..self.len() as isize)
            .map(|i| (self.start + i * self.step) as usize)
            .collect()
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> CollectionResult {
    if index < len {
        Ok(())
    } else {
        Err(CollectionError::IndexOutOfRange { index, len })
    }
}

/// Elements addressed by `bounds`, in slice order.
pub(crate) fn read<T: Clone>(items: &[T], bounds: Bounds) -> Vec<T> {
    bounds
        .positions()
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}

/// Assign `values` to the addressed positions and return what was replaced.
///
/// A step-1 range is spliced and may change the length; any other step must
/// address exactly `values.len()` positions.
pub(crate) fn assign<T>(
    items: &mut Vec<T>,
    bounds: Bounds,
    values: Vec<T>,
) -> CollectionResult<Vec<T>> {
    if bounds.step == 1 {
        let start = bounds.start as usize;
        let stop = (bounds.stop as usize).max(start);
        return Ok(items.splice(start..stop, values).collect());
    }
    let positions = bounds.positions();
    if positions.len() != values.len() {
        return Err(CollectionError::unsupported(format!(
            "attempt to assign sequence of size {} to extended slice of size {}",
            values.len(),
            positions.len()
        )));
    }
    Ok(positions
        .into_iter()
        .zip(values)
        .map(|(i, value)| std::mem::replace(&mut items[i], value))
        .collect())
}

/// Remove the addressed positions and return them in slice order.
pub(crate) fn delete<T>(items: &mut Vec<T>, bounds: Bounds) -> Vec<T> {
    if bounds.step == 1 {
        let start = bounds.start as usize;
        let stop = (bounds.stop as usize).max(start);
        return items.drain(start..stop).collect();
    }
    let mut doomed = vec![false; items.len()];
    for i in bounds.positions() {
        doomed[i] = true;
    }
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(items.len());
    for (i, item) in items.drain(..).enumerate() {
        if doomed[i] {
            removed.push(item);
        } else {
            kept.push(item);
        }
    }
    *items = kept;
    if bounds.step < 0 {
        removed.reverse();
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_defaults_and_negatives() {
        assert_eq!(
            Slice::full().indices(4).unwrap(),
            Bounds {
                start: 0,
                stop: 4,
                step: 1
            }
        );
        let b = Slice::new(-3, -1).indices(4).unwrap();
        assert_eq!(b.positions(), vec![1, 2]);
        let b = Slice::new(1, 100).indices(4).unwrap();
        assert_eq!(b.positions(), vec![1, 2, 3]);
    }

    #[test]
    fn negative_step_walks_backwards() {
        let b = Slice::full().step(-1).indices(4).unwrap();
        assert_eq!(b.positions(), vec![3, 2, 1, 0]);
        let b = Slice::full().step(-2).indices(5).unwrap();
        assert_eq!(b.positions(), vec![4, 2, 0]);
    }

    #[test]
    fn zero_step_rejected() {
        assert!(matches!(
            Slice::full().step(0).indices(3),
            Err(CollectionError::InvalidSlice(_))
        ));
    }

    #[test]
    fn empty_when_start_past_stop() {
        let b = Slice::new(3, 1).indices(5).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn assign_contiguous_resizes() {
        let mut v = vec![1, 2, 3, 4];
        let removed = assign(&mut v, Slice::new(1, 3).indices(4).unwrap(), vec![10]).unwrap();
        assert_eq!(v, vec![1, 10, 4]);
        assert_eq!(removed, vec![2, 3]);
    }

    #[test]
    fn assign_extended_requires_equal_length() {
        let mut v = vec![1, 2, 3, 4];
        let bounds = Slice::full().step(2).indices(4).unwrap();
        assert!(assign(&mut v, bounds, vec![9]).is_err());
        let removed = assign(&mut v, bounds, vec![9, 8]).unwrap();
        assert_eq!(v, vec![9, 2, 8, 4]);
        assert_eq!(removed, vec![1, 3]);
    }

    #[test]
    fn delete_extended() {
        let mut v = vec![0, 1, 2, 3, 4];
        let removed = delete(&mut v, Slice::full().step(-2).indices(5).unwrap());
        assert_eq!(v, vec![1, 3]);
        assert_eq!(removed, vec![4, 2, 0]);
    }

    #[test]
    fn display_round_trips_notation() {
        assert_eq!(Slice::new(1, 3).to_string(), "1:3");
        assert_eq!(Slice::full().step(2).to_string(), "::2");
        assert_eq!(Slice::starting(2).to_string(), "2:");
    }
}
