//! Hierarchy paths: ordered identifier sequences that address an entity,
//! possibly through nested composite calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::Identifier;

/// An ordered identifier path, always ending in [`Identifier::TERMINATOR`].
///
/// Every element but the last names an entity. Each non-final entity must be
/// a function call into another composite for the path to continue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hierarchy(SmallVec<[Identifier; 4]>);

impl Hierarchy {
    /// Builds a path from `elements`, appending the terminator if the input
    /// does not already end with one.
    pub fn new(elements: impl IntoIterator<Item = Identifier>) -> Self {
        let mut path: SmallVec<[Identifier; 4]> = elements.into_iter().collect();
        if path.last().map_or(true, |last| !last.is_terminator()) {
            path.push(Identifier::TERMINATOR);
        }
        Hierarchy(path)
    }

    /// Every stored element, terminator included.
    pub fn elements(&self) -> &[Identifier] {
        &self.0
    }

    /// The entity identifiers of the path, terminator excluded.
    pub fn steps(&self) -> &[Identifier] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    /// Number of stored elements, terminator included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the path addresses nothing (terminator only).
    pub fn is_empty(&self) -> bool {
        self.0.len() <= 1
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Hierarchy::new([])
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in self.0.iter() {
            if !first {
                f.write_str(" / ")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_is_appended() {
        let a = Identifier([1, 0, 0, 0]);
        let path = Hierarchy::new([a]);
        assert_eq!(path.elements(), &[a, Identifier::TERMINATOR]);
        assert_eq!(path.steps(), &[a]);
    }

    #[test]
    fn existing_terminator_is_kept_once() {
        let a = Identifier([1, 0, 0, 0]);
        let path = Hierarchy::new([a, Identifier::TERMINATOR]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn empty_path_is_terminator_only() {
        let path = Hierarchy::default();
        assert!(path.is_empty());
        assert!(path.steps().is_empty());
        assert_eq!(path.elements(), &[Identifier::TERMINATOR]);
    }

    #[test]
    fn display_joins_elements() {
        let path = Hierarchy::new([Identifier([1, 2, 3, 4])]);
        assert_eq!(path.to_string(), "01-02-03-04 / 00-00-00-00");
    }
}
