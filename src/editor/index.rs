use std::cell::OnceCell;

use crate::math::{OrderedMap, OrderedSet};

/// Destinations grouped by letter, keyed by the state on the other end.
pub type Adjacency = OrderedMap<usize, OrderedMap<usize, OrderedSet<usize>>>;

/// Id-based transition storage of a [`super::RegAuto`]. The only authoritative data is
/// `delta`, which maps pairs of state id and letter id to destination ids. The outgoing,
/// incoming and flattened views are derived from it lazily, and every mutation throws all
/// of them away.
#[derive(Debug, Clone, Default)]
pub struct TransitionIndex {
    delta: OrderedMap<(usize, usize), OrderedSet<usize>>,
    out: OnceCell<Adjacency>,
    inn: OnceCell<Adjacency>,
    edges: OnceCell<OrderedMap<usize, Vec<(usize, usize)>>>,
}

impl TransitionIndex {
    /// Raw access to the transition relation.
    pub fn delta(&self) -> &OrderedMap<(usize, usize), OrderedSet<usize>> {
        &self.delta
    }

    /// The destinations of `(source, letter)`, dead ones included.
    pub fn get(&self, source: usize, letter: usize) -> Option<&OrderedSet<usize>> {
        self.delta.get(&(source, letter))
    }

    /// Adds all given destinations, creating entries where necessary.
    pub fn extend(&mut self, bucket: OrderedMap<(usize, usize), OrderedSet<usize>>) {
        for (key, destinations) in bucket {
            self.delta.entry(key).or_default().extend(destinations);
        }
        self.invalidate();
    }

    /// Removes the given destinations. Entries that end up empty disappear.
    pub fn remove(&mut self, bucket: OrderedMap<(usize, usize), OrderedSet<usize>>) {
        for (key, destinations) in bucket {
            if let Some(row) = self.delta.get_mut(&key) {
                row.retain(|dst| !destinations.contains(dst));
                if row.is_empty() {
                    self.delta.remove(&key);
                }
            }
        }
        self.invalidate();
    }

    /// Drops the derived views, they are rebuilt on next access.
    pub fn invalidate(&mut self) {
        self.out.take();
        self.inn.take();
        self.edges.take();
    }

    /// `out[source][letter]` gives the destinations.
    pub fn out(&self) -> &Adjacency {
        self.out.get_or_init(|| {
            let mut out = Adjacency::new();
            for (&(src, letter), destinations) in &self.delta {
                out.entry(src)
                    .or_default()
                    .entry(letter)
                    .or_default()
                    .extend(destinations.iter().copied());
            }
            out
        })
    }

    /// `inn[destination][letter]` gives the sources.
    pub fn inn(&self) -> &Adjacency {
        self.inn.get_or_init(|| {
            let mut inn = Adjacency::new();
            for (&(src, letter), destinations) in &self.delta {
                for &dst in destinations {
                    inn.entry(dst)
                        .or_default()
                        .entry(letter)
                        .or_default()
                        .insert(src);
                }
            }
            inn
        })
    }

    /// The flattened `(letter, destination)` list of every source.
    pub fn edges(&self) -> &OrderedMap<usize, Vec<(usize, usize)>> {
        self.edges.get_or_init(|| {
            let mut edges: OrderedMap<usize, Vec<(usize, usize)>> = OrderedMap::new();
            for (&(src, letter), destinations) in &self.delta {
                edges
                    .entry(src)
                    .or_default()
                    .extend(destinations.iter().map(|&dst| (letter, dst)));
            }
            edges
        })
    }
}
