use std::collections::VecDeque;

use crate::math::{OrderedMap, OrderedSet, Set};

use super::{Automaton, Kind};

/// Iterates over the states that are reachable from a given origin, in breadth-first order.
/// All edges count, including epsilon edges.
#[derive(Debug, Clone)]
pub struct ReachableStates<'a, K: Kind> {
    automaton: &'a Automaton<K>,
    seen: Set<&'a str>,
    queue: VecDeque<&'a str>,
}

impl<'a, K: Kind> ReachableStates<'a, K> {
    /// Starts the search in every state of `origins`.
    pub fn new<I: IntoIterator<Item = &'a str>>(automaton: &'a Automaton<K>, origins: I) -> Self {
        let mut seen = Set::default();
        let queue = origins
            .into_iter()
            .filter(|origin| seen.insert(*origin))
            .collect();
        Self {
            automaton,
            seen,
            queue,
        }
    }
}

impl<'a, K: Kind> Iterator for ReachableStates<'a, K> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let q = self.queue.pop_front()?;
        if let Some(targets) = self.automaton.edges().get(q) {
            for p in targets.keys() {
                if self.seen.insert(p.as_str()) {
                    self.queue.push_back(p.as_str());
                }
            }
        }
        Some(q)
    }
}

impl<K: Kind> Automaton<K> {
    /// Iterates over all states that are reachable from the start state.
    pub fn reachable_states(&self) -> ReachableStates<'_, K> {
        ReachableStates::new(self, [self.initial()])
    }

    /// Iterates over all states that are reachable from `origin`. Yields nothing if `origin`
    /// is not a state.
    pub fn reachable_states_from<'a>(&'a self, origin: &'a str) -> ReachableStates<'a, K> {
        ReachableStates::new(self, self.states().get(origin).map(String::as_str))
    }

    /// Computes the states from which some state of `targets` can be reached, which includes
    /// `targets` itself. This is a breadth-first search over the reversed edges.
    pub fn states_reaching<S: AsRef<str>>(
        &self,
        targets: impl IntoIterator<Item = S>,
    ) -> OrderedSet<String> {
        let mut predecessors: OrderedMap<&str, Vec<&str>> = OrderedMap::new();
        for (source, by_target) in self.edges() {
            for target in by_target.keys() {
                predecessors
                    .entry(target.as_str())
                    .or_default()
                    .push(source.as_str());
            }
        }

        let mut seen: OrderedSet<String> = OrderedSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for target in targets {
            if seen.insert(target.as_ref().to_string()) {
                queue.push_back(target.as_ref().to_string());
            }
        }
        while let Some(q) = queue.pop_front() {
            for p in predecessors.get(q.as_str()).into_iter().flatten() {
                if seen.insert(p.to_string()) {
                    queue.push_back(p.to_string());
                }
            }
        }
        seen
    }

    /// The states that can reach an accepting state.
    pub fn productive_states(&self) -> OrderedSet<String> {
        self.states_reaching(self.accepting())
    }

    /// Returns true if some state of `targets` is reachable from `origin`.
    pub fn path_exists<S: AsRef<str>>(
        &self,
        origin: &str,
        targets: impl IntoIterator<Item = S>,
    ) -> bool {
        let targets: OrderedSet<String> = targets
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect();
        self.reachable_states_from(origin)
            .any(|q| targets.contains(q))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::prelude::*;

    fn with_island() -> NFA {
        AutomatonBuilder::default()
            .with_edges([("q0", "a", "q1"), ("q1", "b", "q2"), ("u", "a", "q0")])
            .with_epsilon_edges([("q2", "q0")])
            .with_states(["island"])
            .with_accepting(["q1"])
            .into_nfa("q0")
            .unwrap()
    }

    #[test]
    fn reachable_states() {
        let nfa = with_island();
        assert_eq!(
            nfa.reachable_states().collect_vec(),
            vec!["q0", "q1", "q2"]
        );
        assert_eq!(
            nfa.reachable_states_from("u").sorted().collect_vec(),
            vec!["q0", "q1", "q2", "u"]
        );
        assert_eq!(nfa.reachable_states_from("nope").count(), 0);
    }

    #[test]
    fn productive_states() {
        let nfa = with_island();
        assert_eq!(
            nfa.productive_states().into_iter().collect_vec(),
            vec!["q0", "q1", "q2", "u"]
        );
        assert!(nfa.path_exists("u", ["q2"]));
        assert!(!nfa.path_exists("q0", ["island"]));
        assert!(nfa.path_exists("island", ["island"]));
    }
}
