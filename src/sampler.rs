use std::collections::VecDeque;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, AutomatonError, Kind},
    math::{OrderedMap, OrderedSet},
};

/// Bounds for [`Sampler::sample_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleConfig {
    /// The maximal number of words that are returned.
    pub max_samples: usize,
    /// The maximal length of a returned word, counted in symbols.
    pub max_depth: usize,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            max_samples: 10,
            max_depth: 10,
        }
    }
}

/// A node of the search tree. Nodes live in an arena and refer to their parent by index.
#[derive(Debug, Clone)]
struct Node<'a> {
    state: &'a str,
    parent: Option<usize>,
    depth: usize,
}

/// Enumerates short words that are accepted by an automaton.
///
/// The search is breadth-first over states, starting in the start state of a
/// [`crate::automaton::DFA`] or in every state of the epsilon-closure of the start state of an
/// [`crate::automaton::NFA`]. Whenever an accepting state is dequeued, all words that label the
/// path from the root to it are collected, see [`Automaton::words_for_path`]. States from
/// which no accepting state is reachable are never expanded.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let dfa = AutomatonBuilder::default()
///     .with_edges([("q0", 'a', "q1"), ("q0", 'b', "q1"), ("q1", 'a', "q1"), ("q1", 'b', "q1")])
///     .with_accepting(["q1"])
///     .into_dfa("q0")
///     .unwrap();
/// let words = Sampler::new(&dfa).sample(6, 4).unwrap();
/// assert_eq!(words, vec!["a", "b", "aa", "ab", "ba", "bb"]);
/// ```
#[derive(Debug, Clone)]
pub struct Sampler<'a, K: Kind> {
    automaton: &'a Automaton<K>,
    dead_ends: OrderedSet<String>,
}

impl<'a, K: Kind> Sampler<'a, K> {
    /// Prepares sampling from `automaton`, this computes the states from which no
    /// accepting state can be reached.
    pub fn new(automaton: &'a Automaton<K>) -> Self {
        let productive = automaton.productive_states();
        let dead_ends = automaton
            .states()
            .iter()
            .filter(|q| !productive.contains(*q))
            .cloned()
            .collect();
        Self {
            automaton,
            dead_ends,
        }
    }

    /// The states from which no accepting state can be reached.
    pub fn dead_ends(&self) -> &OrderedSet<String> {
        &self.dead_ends
    }

    /// Returns true if one of `targets` can be reached from `origin`.
    pub fn path_between_exists<S: AsRef<str>>(
        &self,
        origin: &str,
        targets: impl IntoIterator<Item = S>,
    ) -> bool {
        self.automaton.path_exists(origin, targets)
    }

    /// Collects at most `max_samples` accepted words of length at most `max_depth`. The
    /// result is sorted by length first and lexicographically second. A word is the
    /// concatenation of its symbols and its length is the number of symbols, so with
    /// symbols longer than one character the words are not valid input for
    /// [`Automaton::accepts`].
    pub fn sample(&self, max_samples: usize, max_depth: usize) -> Result<Vec<String>, AutomatonError> {
        self.sample_with(SampleConfig {
            max_samples,
            max_depth,
        })
    }

    /// Same as [`Sampler::sample`] with the bounds given as a [`SampleConfig`].
    pub fn sample_with(&self, config: SampleConfig) -> Result<Vec<String>, AutomatonError> {
        let SampleConfig {
            max_samples,
            max_depth,
        } = config;

        let mut arena: Vec<Node<'a>> = Vec::new();
        let mut queue = VecDeque::new();
        for root in self.automaton.start_states() {
            let state = self.name(&root);
            arena.push(Node {
                state,
                parent: None,
                depth: 1,
            });
            queue.push_back(arena.len() - 1);
        }

        // each sample with the number of symbols it consists of
        let mut samples: OrderedMap<String, usize> = OrderedMap::new();
        while let Some(idx) = queue.pop_front() {
            let Node { state, depth, .. } = arena[idx].clone();

            if self.automaton.is_accepting(state) {
                let path = Self::path_to(&arena, idx);
                if path.len() == 1 {
                    samples.insert(String::new(), 0);
                } else {
                    for word in self.automaton.words_for_path(&path)? {
                        samples.entry(word).or_insert(path.len() - 1);
                    }
                }
                trace!("accepting path {:?}, {} samples", path, samples.len());
            }
            if samples.len() >= max_samples {
                break;
            }
            if self.dead_ends.contains(state) {
                trace!("pruning dead end {state}");
                continue;
            }

            // the word leading to a node of depth `d` has length `d - 1`
            if depth - 1 < max_depth {
                for sym in self.automaton.alphabet() {
                    for next in self.automaton.successors(state, sym)? {
                        let next = self.name(&next);
                        arena.push(Node {
                            state: next,
                            parent: Some(idx),
                            depth: depth + 1,
                        });
                        queue.push_back(arena.len() - 1);
                    }
                }
            }
        }

        debug!(
            "sampled {} words after visiting {} nodes",
            samples.len(),
            arena.len()
        );

        Ok(samples
            .into_iter()
            .map(|(word, len)| (len, word))
            .sorted()
            .take(max_samples)
            .map(|(_, word)| word)
            .collect())
    }

    /// Maps an owned name to the copy held by the automaton, so nodes can borrow it.
    fn name(&self, state: &str) -> &'a str {
        self.automaton
            .states()
            .get(state)
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn path_to(arena: &[Node<'a>], mut idx: usize) -> Vec<&'a str> {
        let mut path = vec![arena[idx].state];
        while let Some(parent) = arena[idx].parent {
            path.push(arena[parent].state);
            idx = parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn a_plus() -> DFA {
        AutomatonBuilder::default()
            .with_edges([("q0", 'a', "q1"), ("q1", 'a', "q1")])
            .with_accepting(["q1"])
            .into_dfa("q0")
            .unwrap()
    }

    fn with_dead_sink() -> DFA {
        AutomatonBuilder::default()
            .with_edges([
                ("q0", 'a', "acc"),
                ("q0", 'b', "dead"),
                ("acc", 'a', "acc"),
                ("acc", 'b', "dead"),
                ("dead", 'a', "dead"),
                ("dead", 'b', "dead"),
            ])
            .with_accepting(["acc"])
            .into_dfa("q0")
            .unwrap()
    }

    #[test_log::test]
    fn order_and_values() {
        let dfa = a_plus();
        let sampler = Sampler::new(&dfa);
        assert_eq!(
            sampler.sample(6, 6).unwrap(),
            vec!["a", "aa", "aaa", "aaaa", "aaaaa", "aaaaaa"]
        );
        assert_eq!(sampler.sample(2, 10).unwrap(), vec!["a", "aa"]);
        assert_eq!(sampler.sample(10, 2).unwrap(), vec!["a", "aa"]);
        // sampling does not consume anything
        assert_eq!(sampler.sample(2, 10).unwrap(), vec!["a", "aa"]);
    }

    #[test]
    fn default_config() {
        let dfa = a_plus();
        let words = Sampler::new(&dfa).sample_with(SampleConfig::default()).unwrap();
        assert_eq!(words.len(), 10);
        assert_eq!(words.last().map(String::len), Some(10));
    }

    #[test]
    fn length_counts_symbols() {
        let dfa = AutomatonBuilder::default()
            .with_edges([
                ("q0", "xy", "q1"),
                ("q0", "z", "q0"),
                ("q1", "xy", "q1"),
                ("q1", "z", "q1"),
            ])
            .with_accepting(["q1"])
            .into_dfa("q0")
            .unwrap();
        let words = Sampler::new(&dfa).sample(4, 2).unwrap();
        assert_eq!(words, vec!["xy", "xyxy", "xyz", "zxy"]);
        assert_eq!(dfa.accepts_symbols(["z", "xy"]), Ok(true));
    }

    #[test]
    fn only_empty_word() {
        let nfa = AutomatonBuilder::default()
            .with_states(["s"])
            .with_accepting(["s"])
            .into_nfa("s")
            .unwrap();
        assert_eq!(Sampler::new(&nfa).sample(3, 3).unwrap(), vec![""]);
    }

    #[test_log::test]
    fn prunes_dead_ends() {
        let dfa = with_dead_sink();
        let sampler = Sampler::new(&dfa);
        assert_eq!(sampler.dead_ends(), &OrderedSet::from(["dead".to_string()]));
        let words = sampler.sample(5, 5).unwrap();
        assert!(words.iter().all(|w| !w.starts_with('b')));
        assert_eq!(words[..2], ["a", "aa"]);
        for word in &words {
            assert_eq!(dfa.accepts(word), Ok(true));
        }
    }

    #[test]
    fn path_between_exists() {
        let dfa = with_dead_sink();
        let sampler = Sampler::new(&dfa);
        assert!(sampler.path_between_exists("q0", ["acc"]));
        assert!(!sampler.path_between_exists("dead", ["acc"]));
    }

    #[test_log::test]
    fn nfa_with_epsilon() {
        let nfa = AutomatonBuilder::default()
            .with_epsilon_edges([("p0", "p1")])
            .with_edges([("p1", 'a', "p2"), ("p2", 'a', "p2")])
            .with_accepting(["p2"])
            .into_nfa("p0")
            .unwrap();
        assert_eq!(
            Sampler::new(&nfa).sample(3, 5).unwrap(),
            vec!["a", "aa", "aaa"]
        );
    }

    #[test_log::test]
    fn samples_are_bounded_and_accepted() {
        let nfa = union(
            &concatenate(
                &AutomatonBuilder::default()
                    .with_edges([("s", 'a', "f")])
                    .with_accepting(["f"])
                    .into_nfa("s")
                    .unwrap(),
                &AutomatonBuilder::default()
                    .with_edges([("s", 'b', "s"), ("s", 'c', "f")])
                    .with_accepting(["f"])
                    .into_nfa("s")
                    .unwrap(),
                true,
            ),
            &AutomatonBuilder::default()
                .with_edges([("s", 'c', "s")])
                .with_accepting(["s"])
                .into_nfa("s")
                .unwrap(),
            true,
        );
        let words = Sampler::new(&nfa).sample(8, 4).unwrap();
        assert!(words.len() <= 8);
        assert!(words.contains(&String::new()));
        assert!(words.contains(&"ac".to_string()));
        for pair in words.windows(2) {
            assert!((pair[0].len(), &pair[0]) < (pair[1].len(), &pair[1]));
        }
        for word in &words {
            assert!(word.len() <= 4);
            assert_eq!(nfa.accepts(word), Ok(true), "{word}");
        }
    }
}
