use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Sets whose iteration order matters, e.g. everything that ends up in the public view of
/// an automaton. State and symbol names are always reported in sorted order.
pub type OrderedSet<S> = BTreeSet<S>;
/// Ordered counterpart to [`Map`].
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// A partition groups elements of type `I` into disjoint classes. Classes are kept sorted,
/// so two partitions with the same classes compare equal regardless of how they were built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<I: Ord>(Vec<BTreeSet<I>>);

impl<I: Ord> std::ops::Deref for Partition<I> {
    type Target = Vec<BTreeSet<I>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, I: Ord> IntoIterator for &'a Partition<I> {
    type Item = &'a BTreeSet<I>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<I: Ord> IntoIterator for Partition<I> {
    type Item = BTreeSet<I>;
    type IntoIter = std::vec::IntoIter<BTreeSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<I: Ord> Partition<I> {
    /// Returns the size of the partition, i.e. the number of classes.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Builds a new partition from an iterator that yields iterators
    /// which yield elements of type `I`. Empty classes are dropped.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(iter: Y) -> Self {
        let mut classes: Vec<BTreeSet<I>> = iter
            .into_iter()
            .map(|it| it.into_iter().collect::<BTreeSet<_>>())
            .filter(|class| !class.is_empty())
            .collect();
        classes.sort();
        Self(classes)
    }

    /// Returns the class that contains `element`, if any.
    pub fn class_of(&self, element: &I) -> Option<&BTreeSet<I>> {
        self.0.iter().find(|class| class.contains(element))
    }

    /// Returns true if every class is a singleton.
    pub fn is_discrete(&self) -> bool {
        self.0.iter().all(|class| class.len() == 1)
    }
}

impl<I: Ord> From<Vec<BTreeSet<I>>> for Partition<I> {
    fn from(value: Vec<BTreeSet<I>>) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_is_order_agnostic() {
        let left = Partition::new([vec![3, 1], vec![2]]);
        let right = Partition::new([vec![2], vec![1, 3], vec![]]);
        assert_eq!(left, right);
        assert_eq!(left.size(), 2);
        assert_eq!(left.class_of(&3), Some(&BTreeSet::from([1, 3])));
        assert!(!left.is_discrete());
        assert!(Partition::new([[1], [2]]).is_discrete());
    }
}
