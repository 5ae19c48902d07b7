use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    automaton::{Components, DFA, NFA},
    math::{Bijection, OrderedMap, OrderedSet},
    symbol::Symbol,
};

/// Name of the state that corresponds to the epsilon-closure of the start state.
const START: &str = "q_start";

/// Converts an [`NFA`] into an equivalent [`DFA`] with the powerset construction.
///
/// The input is minimized first. Only subsets that are reachable from the epsilon-closure of
/// the start state are materialized: that closure becomes `q_start`, all other subsets are
/// called `q_0`, `q_1`, ... in the order in which a breadth-first search discovers them. The
/// empty subset, if reachable, serves as sink. A subset is accepting if it contains an
/// accepting state.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let nfa = AutomatonBuilder::default()
///     .with_edges([("p", 'a', "p"), ("p", 'b', "p"), ("p", 'a', "q")])
///     .with_accepting(["q"])
///     .into_nfa("p")
///     .unwrap();
/// let dfa = subset_construction(&nfa);
/// assert_eq!(dfa.initial(), "q_start");
/// assert_eq!(dfa.states().len(), 2);
/// assert_eq!(dfa.accepts("bba"), Ok(true));
/// assert_eq!(dfa.accepts("ab"), Ok(false));
/// ```
pub fn subset_construction(nfa: &NFA) -> DFA {
    let nfa = nfa.minimize();

    let start = nfa.start_states();
    let mut names: Bijection<OrderedSet<String>, String> = Bijection::new();
    names.insert(start.clone(), START.to_string());
    let mut queue = VecDeque::from([start]);
    let mut transitions = OrderedMap::new();

    while let Some(subset) = queue.pop_front() {
        let source = names.get_by_left(&subset).cloned().unwrap_or_default();
        for sym in nfa.alphabet() {
            let mut reached = OrderedSet::new();
            for state in &subset {
                // symbol and state are known, so the step cannot fail
                reached.extend(nfa.transition(state, sym).unwrap_or_default());
            }

            let target = match names.get_by_left(&reached) {
                Some(name) => name.clone(),
                None => {
                    let name = format!("q_{}", names.len() - 1);
                    trace!("discovered subset {reached:?} as {name}");
                    names.insert(reached.clone(), name.clone());
                    queue.push_back(reached);
                    name
                }
            };
            transitions.insert((source.clone(), Symbol::from(sym)), target);
        }
    }

    let accepting = names
        .iter()
        .filter(|(subset, _)| subset.iter().any(|q| nfa.is_accepting(q)))
        .map(|(_, name)| name.clone())
        .collect();
    debug!(
        "subset construction produced {} states from {}",
        names.len(),
        nfa.states().len()
    );

    DFA::new_unchecked(Components {
        states: names.right_values().cloned().collect(),
        alphabet: nfa.alphabet().clone(),
        transitions,
        initial: START.to_string(),
        accepting,
    })
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// All words over `alphabet` of length at most `max_len`, shortest first.
    fn words(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut all = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max_len {
            frontier = frontier
                .iter()
                .flat_map(|word| alphabet.iter().map(move |c| format!("{word}{c}")))
                .collect();
            all.extend(frontier.iter().cloned());
        }
        all
    }

    #[test]
    fn enumerates_words() {
        assert_eq!(words(&['a', 'b'], 2), vec!["", "a", "b", "aa", "ab", "ba", "bb"]);
    }

    #[test_log::test]
    fn subset_construction_is_equivalent() {
        // third symbol from the end is an `a`
        let nfa = AutomatonBuilder::default()
            .with_edges([
                ("p", 'a', "p"),
                ("p", 'b', "p"),
                ("p", 'a', "q1"),
                ("q1", 'a', "q2"),
                ("q1", 'b', "q2"),
                ("q2", 'a', "q3"),
                ("q2", 'b', "q3"),
            ])
            .with_accepting(["q3"])
            .into_nfa("p")
            .unwrap();
        let dfa = convert_nfa_to_dfa(&nfa);
        assert_eq!(dfa.states().len(), 8);
        for word in words(&['a', 'b'], 6) {
            assert_eq!(nfa.accepts(&word), dfa.accepts(&word), "{word}");
        }
    }

    #[test_log::test]
    fn epsilon_closure_is_respected() {
        let nfa = AutomatonBuilder::default()
            .with_epsilon_edges([("s", "x"), ("s", "y")])
            .with_edges([("x", 'a', "x"), ("y", 'b', "y")])
            .with_accepting(["x", "y"])
            .into_nfa("s")
            .unwrap();
        let dfa = nfa.to_dfa();
        assert_eq!(dfa.initial(), "q_start");
        assert!(dfa.is_accepting("q_start"));
        for word in words(&['a', 'b'], 4) {
            assert_eq!(nfa.accepts(&word), dfa.accepts(&word), "{word}");
        }
        // `{x}`, `{y}` and the empty sink
        assert_eq!(dfa.states().len(), 4);
    }
}
