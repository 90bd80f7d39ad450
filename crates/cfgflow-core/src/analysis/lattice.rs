use super::dataflow::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of instruction indices, joined by union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstSet(BTreeSet<usize>);

impl InstSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    pub fn remove(&mut self, index: usize) -> bool {
        self.0.remove(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for InstSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Lattice for InstSet {
    fn bottom() -> Self {
        Self::default()
    }

    fn join(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl fmt::Display for InstSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in &self.0 {
            write!(f, "{}|", index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_union() {
        let a: InstSet = [1, 3].into_iter().collect();
        let b: InstSet = [2, 3].into_iter().collect();
        let joined = a.join(&b);

        assert_eq!(joined, InstSet::from_iter([1, 2, 3]));
        assert_eq!(joined, b.join(&a));
        assert!(a.leq(&joined));
        assert!(!joined.leq(&a));
        assert_eq!(a.join(&InstSet::bottom()), a);
    }

    #[test]
    fn test_render() {
        let set: InstSet = [4, 1].into_iter().collect();
        assert_eq!(set.to_string(), "1|4|");
        assert_eq!(InstSet::bottom().to_string(), "");
    }
}
