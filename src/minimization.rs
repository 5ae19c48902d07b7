//! Removal of useless states and merging of states with identical transition rows.
//!
//! Note that the merging is purely structural: two states are merged if, after removing
//! dead states, they agree on acceptance and reach exactly the same sets of states on every
//! symbol. Merging is repeated until nothing changes, but no Myhill-Nerode refinement takes
//! place, so the result is in general not the minimal automaton for its language.

use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, Components, Deterministic, Kind, Nondeterministic},
    math::{Map, OrderedMap, OrderedSet, Partition},
    symbol::Symbol,
};

/// Transition relation on which minimization operates, the same shape for both kinds.
pub type Rows = OrderedMap<(String, Symbol), OrderedSet<String>>;

/// Computes the states that are useless: those that are not reachable from the start state
/// and those from which no accepting state can be reached.
pub fn find_dead_states<K: Kind>(automaton: &Automaton<K>) -> OrderedSet<String> {
    let productive = automaton.productive_states();
    let useful: OrderedSet<&str> = automaton
        .reachable_states()
        .filter(|q| productive.contains(*q))
        .collect();
    automaton
        .states()
        .iter()
        .filter(|q| !useful.contains(q.as_str()))
        .cloned()
        .collect()
}

/// The symbols that make up a row, epsilon included if the automaton can have it.
fn row_symbols<K: Kind>(automaton: &Automaton<K>) -> Vec<Symbol> {
    automaton
        .alphabet()
        .iter()
        .map(Symbol::from)
        .chain(K::HAS_EPSILON.then_some(Symbol::Epsilon))
        .collect()
}

fn rows_of<K: Kind>(automaton: &Automaton<K>) -> Rows {
    automaton
        .transitions()
        .iter()
        .map(|(key, target)| (key.clone(), K::targets(target).cloned().collect()))
        .collect()
}

/// Groups states by acceptance and by their row, which is the sequence of target sets over
/// `symbols`. A missing transition counts as the empty set.
fn partition_by_rows(
    states: &OrderedSet<String>,
    accepting: &OrderedSet<String>,
    symbols: &[Symbol],
    rows: &Rows,
) -> Partition<String> {
    let mut classes: OrderedMap<(bool, Vec<OrderedSet<String>>), Vec<String>> = OrderedMap::new();
    for state in states {
        let row = symbols
            .iter()
            .map(|sym| {
                rows.get(&(state.clone(), sym.clone()))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        classes
            .entry((accepting.contains(state), row))
            .or_default()
            .push(state.clone());
    }
    Partition::new(classes.into_values())
}

/// Partitions all states of `automaton` into classes of states that agree on acceptance and
/// whose rows are identical, epsilon included.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let dfa = AutomatonBuilder::default()
///     .with_edges([("A", 'a', "B"), ("B", 'a', "D"), ("C", 'a', "D"), ("D", 'a', "D")])
///     .into_dfa("A")
///     .unwrap();
/// let groups = group_indistinguishable_states(&dfa);
/// assert_eq!(groups.size(), 2);
/// assert_eq!(groups.class_of(&"C".to_string()).map(|class| class.len()), Some(3));
/// ```
pub fn group_indistinguishable_states<K: Kind>(automaton: &Automaton<K>) -> Partition<String> {
    partition_by_rows(
        automaton.states(),
        automaton.accepting(),
        &row_symbols(automaton),
        &rows_of(automaton),
    )
}

/// Turns the minimized rows back into a valid transition relation.
pub trait Complete: Kind {
    /// Produces the final states and transitions from the surviving `states` and `rows`.
    fn complete(
        states: OrderedSet<String>,
        alphabet: &OrderedSet<String>,
        rows: Rows,
    ) -> (OrderedSet<String>, OrderedMap<(String, Symbol), Self::Target>);
}

impl Complete for Deterministic {
    fn complete(
        mut states: OrderedSet<String>,
        alphabet: &OrderedSet<String>,
        rows: Rows,
    ) -> (OrderedSet<String>, OrderedMap<(String, Symbol), String>) {
        let mut transitions = OrderedMap::new();
        let mut missing = Vec::new();
        for state in &states {
            for sym in alphabet {
                let key = (state.clone(), Symbol::from(sym));
                match rows.get(&key).and_then(|targets| targets.iter().next()) {
                    Some(target) => {
                        transitions.insert(key, target.clone());
                    }
                    None => missing.push(key),
                }
            }
        }

        if !missing.is_empty() {
            // among |Q| + 1 candidates one is always free
            let sink = (0..=states.len())
                .map(|n| format!("q_sink_{n}"))
                .find(|name| !states.contains(name))
                .unwrap_or_else(|| "q_sink".to_string());
            debug!("routing {} missing transitions to {sink}", missing.len());

            for key in missing {
                transitions.insert(key, sink.clone());
            }
            for sym in alphabet {
                transitions.insert((sink.clone(), Symbol::from(sym)), sink.clone());
            }
            states.insert(sink);
        }
        (states, transitions)
    }
}

impl Complete for Nondeterministic {
    fn complete(
        states: OrderedSet<String>,
        _alphabet: &OrderedSet<String>,
        rows: Rows,
    ) -> (OrderedSet<String>, Rows) {
        let transitions = rows
            .into_iter()
            .filter(|(_, targets)| !targets.is_empty())
            .collect();
        (states, transitions)
    }
}

/// Removes dead states (keeping the start state in any case), then merges states with
/// identical rows until no further merge is possible. Each class is represented by the
/// start state if it is a member, and by its lexicographically smallest state otherwise.
/// A [`crate::automaton::DFA`] that lost transitions is completed with a fresh sink state
/// named `q_sink_N`.
///
/// The result accepts the same language, and minimizing it again changes nothing.
pub fn minimize<K: Complete>(automaton: &Automaton<K>) -> Automaton<K> {
    let initial = automaton.initial().to_string();
    let dead = find_dead_states(automaton);
    trace!("found {} dead states: {:?}", dead.len(), dead);

    let mut states: OrderedSet<String> = automaton
        .states()
        .iter()
        .filter(|q| !dead.contains(*q) || **q == initial)
        .cloned()
        .collect();
    let mut accepting: OrderedSet<String> = automaton
        .accepting()
        .intersection(&states)
        .cloned()
        .collect();
    let mut rows: Rows = rows_of(automaton)
        .into_iter()
        .filter(|((source, _), _)| states.contains(source))
        .map(|(key, targets)| {
            let alive: OrderedSet<String> = targets.intersection(&states).cloned().collect();
            (key, alive)
        })
        .filter(|(_, targets)| !targets.is_empty())
        .collect();

    let symbols = row_symbols(automaton);
    loop {
        let partition = partition_by_rows(&states, &accepting, &symbols, &rows);
        if partition.is_discrete() {
            break;
        }
        trace!(
            "merging {} states into {} classes",
            states.len(),
            partition.size()
        );

        let mut representative: Map<String, String> = Map::default();
        for class in &partition {
            let chosen = if class.contains(&initial) {
                &initial
            } else {
                class.iter().next().unwrap_or(&initial)
            };
            for member in class {
                representative.insert(member.clone(), chosen.clone());
            }
        }

        rows = rows
            .into_iter()
            .filter(|((source, _), _)| representative[source] == *source)
            .map(|(key, targets)| {
                let merged = targets.iter().map(|t| representative[t].clone()).collect();
                (key, merged)
            })
            .collect();
        states.retain(|q| representative[q] == *q);
        accepting = accepting.iter().map(|q| representative[q].clone()).collect();
    }

    let (states, transitions) = K::complete(states, automaton.alphabet(), rows);
    debug!(
        "minimized {} from {} to {} states",
        K::NAME,
        automaton.states().len(),
        states.len()
    );

    Automaton::new_unchecked(Components {
        states,
        alphabet: automaton.alphabet().clone(),
        transitions,
        initial,
        accepting,
    })
}

impl<K: Complete> Automaton<K> {
    /// See [`minimize`].
    pub fn minimize(&self) -> Self {
        minimize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn set<const N: usize>(states: [&str; N]) -> OrderedSet<String> {
        states.into_iter().map(String::from).collect()
    }

    fn dfa<const N: usize>(edges: [(&str, &str, &str); N], accepting: &[&str], initial: &str) -> DFA {
        AutomatonBuilder::default()
            .with_edges(edges)
            .with_accepting(accepting.iter().copied())
            .into_dfa(initial)
            .unwrap()
    }

    fn nfa<const N: usize>(edges: [(&str, &str, &str); N], accepting: &[&str], initial: &str) -> NFA {
        AutomatonBuilder::default()
            .with_edges(edges)
            .with_accepting(accepting.iter().copied())
            .into_nfa(initial)
            .unwrap()
    }

    fn key(state: &str, symbol: &str) -> (String, Symbol) {
        (state.to_string(), Symbol::from(symbol))
    }

    #[test_log::test]
    fn dead_states() {
        let basic = dfa(
            [
                ("q0", "a", "q1"),
                ("q0", "b", "q_dead"),
                ("q1", "a", "q1"),
                ("q1", "b", "q_dead"),
                ("q_dead", "a", "q_dead"),
                ("q_dead", "b", "q_dead"),
            ],
            &["q1"],
            "q0",
        );
        assert_eq!(find_dead_states(&basic), set(["q_dead"]));

        let no_accepting = dfa([("x", "a", "y"), ("y", "a", "x")], &[], "x");
        assert_eq!(find_dead_states(&no_accepting), set(["x", "y"]));

        let unreachable_accepting = dfa(
            [("q0", "a", "q1"), ("q1", "a", "q1"), ("q2", "a", "q2")],
            &["q2"],
            "q0",
        );
        assert_eq!(
            find_dead_states(&unreachable_accepting),
            set(["q0", "q1", "q2"])
        );

        let cyclic = dfa(
            [("q0", "a", "q1"), ("q1", "a", "q2"), ("q2", "a", "q0")],
            &["q2"],
            "q0",
        );
        assert!(find_dead_states(&cyclic).is_empty());

        let branch = nfa([("q0", "a", "q1"), ("q0", "a", "q2"), ("q1", "a", "q1")], &["q1"], "q0");
        assert_eq!(find_dead_states(&branch), set(["q2"]));
    }

    #[test]
    fn dead_states_follow_epsilon() {
        let automaton = AutomatonBuilder::default()
            .with_epsilon_edges([("p0", "p1")])
            .with_edges([("p1", "a", "p2"), ("p2", "a", "p2")])
            .with_accepting(["p2"])
            .into_nfa("p0")
            .unwrap();
        assert!(find_dead_states(&automaton).is_empty());
    }

    #[test]
    fn groups() {
        let collapse = dfa(
            [
                ("q0", "a", "q1"),
                ("q0", "b", "q2"),
                ("q1", "a", "q0"),
                ("q1", "b", "q0"),
                ("q2", "a", "q0"),
                ("q2", "b", "q0"),
            ],
            &["q0"],
            "q0",
        );
        assert_eq!(
            group_indistinguishable_states(&collapse),
            Partition::new([vec!["q0".to_string()], vec!["q1".into(), "q2".into()]])
        );

        let distinct = dfa([("s0", "a", "s1"), ("s1", "a", "s2"), ("s2", "a", "s2")], &["s2"], "s0");
        assert!(group_indistinguishable_states(&distinct).is_discrete());

        let empty_alphabet = AutomatonBuilder::default()
            .with_states(["x", "y", "z"])
            .into_dfa("x")
            .unwrap();
        assert_eq!(group_indistinguishable_states(&empty_alphabet).size(), 1);
    }

    #[test]
    fn groups_respect_epsilon() {
        let same = AutomatonBuilder::default()
            .with_epsilon_edges([("p0", "p1"), ("p1", "p0"), ("p2", "p0")])
            .with_edges([
                ("p0", "a", "p1"),
                ("p1", "a", "p0"),
                ("p1", "a", "p1"),
                ("p2", "a", "p0"),
                ("p2", "a", "p1"),
            ])
            .with_accepting(["p0"])
            .into_nfa("p0")
            .unwrap();
        assert_eq!(
            group_indistinguishable_states(&same),
            Partition::new([vec!["p0".to_string()], vec!["p1".into(), "p2".into()]])
        );

        let differs = AutomatonBuilder::default()
            .with_epsilon_edges([("u0", "u1")])
            .with_edges([("u0", "a", "u0"), ("u1", "a", "u0")])
            .into_nfa("u0")
            .unwrap();
        assert!(group_indistinguishable_states(&differs).is_discrete());
    }

    #[test_log::test]
    fn removes_unreachable_and_dead() {
        let m = dfa([("q0", "a", "q1"), ("q1", "a", "q1"), ("q2", "a", "q2")], &["q1"], "q0").minimize();
        assert_eq!(m.states(), &set(["q0", "q1"]));
        assert_eq!(m.accepting(), &set(["q1"]));

        let m = nfa([("q0", "a", "q1"), ("q0", "a", "q2"), ("q1", "a", "q1")], &["q1"], "q0").minimize();
        assert_eq!(m.states(), &set(["q0", "q1"]));
        assert_eq!(m.transitions()[&key("q0", "a")], set(["q1"]));

        let m = dfa([("A", "a", "B"), ("B", "a", "A"), ("C", "a", "D"), ("D", "a", "C")], &["B"], "A").minimize();
        assert_eq!(m.states(), &set(["A", "B"]));
    }

    #[test_log::test]
    fn keeps_dead_start() {
        let empty_alphabet = AutomatonBuilder::default()
            .with_states(["x", "y"])
            .into_dfa("x")
            .unwrap()
            .minimize();
        assert_eq!(empty_alphabet.states(), &set(["x"]));
        assert!(empty_alphabet.transitions().is_empty());

        let m = dfa([("x", "a", "y"), ("y", "a", "x")], &[], "x").minimize();
        assert_eq!(m.states(), &set(["q_sink_0", "x"]));
        assert!(m.accepting().is_empty());
        assert_eq!(m.transitions()[&key("x", "a")], "q_sink_0");
        assert_eq!(m.transitions()[&key("q_sink_0", "a")], "q_sink_0");
    }

    #[test_log::test]
    fn sink_name_avoids_collisions() {
        let m = dfa(
            [
                ("q_sink_0", "a", "acc"),
                ("q_sink_0", "b", "dead"),
                ("acc", "a", "acc"),
                ("acc", "b", "acc"),
                ("dead", "a", "dead"),
                ("dead", "b", "dead"),
            ],
            &["acc"],
            "q_sink_0",
        )
        .minimize();
        assert_eq!(m.states(), &set(["acc", "q_sink_0", "q_sink_1"]));
        assert_eq!(m.transitions()[&key("q_sink_0", "b")], "q_sink_1");
    }

    #[test_log::test]
    fn merges_dead_sinks() {
        let m = dfa(
            [
                ("q0", "a", "qd1"),
                ("q0", "b", "qd2"),
                ("qd1", "a", "qd1"),
                ("qd1", "b", "qd1"),
                ("qd2", "a", "qd2"),
                ("qd2", "b", "qd2"),
            ],
            &[],
            "q0",
        )
        .minimize();
        assert_eq!(m.states().len(), 2);
        let sink = m.states().iter().find(|q| *q != "q0").unwrap().clone();
        for sym in ["a", "b"] {
            assert_eq!(m.transitions()[&key("q0", sym)], sink);
            assert_eq!(m.transitions()[&key(&sink, sym)], sink);
        }
    }

    #[test_log::test]
    fn merges_equivalent_states() {
        let m = dfa(
            [
                ("q0", "a", "m1"),
                ("q0", "b", "m2"),
                ("m1", "a", "acc"),
                ("m1", "b", "acc"),
                ("m2", "a", "acc"),
                ("m2", "b", "acc"),
                ("acc", "a", "acc"),
                ("acc", "b", "acc"),
            ],
            &["acc"],
            "q0",
        )
        .minimize();
        assert!(m.states().contains("m1") && !m.states().contains("m2"));
        assert_eq!(m.transitions()[&key("q0", "a")], "m1");
        assert_eq!(m.transitions()[&key("q0", "b")], "m1");
        assert_eq!(m.transitions()[&key("m1", "a")], "acc");

        let m = dfa([("q0", "x", "qf1"), ("qf1", "x", "qf1"), ("qf2", "x", "qf2")], &["qf1", "qf2"], "q0")
            .minimize();
        assert_eq!(m.states(), &set(["q0", "qf1"]));
        assert_eq!(m.accepting(), &set(["qf1"]));
    }

    #[test]
    fn already_minimal_is_unchanged() {
        let original = dfa([("s0", "a", "s1"), ("s1", "a", "s0")], &["s0", "s1"], "s0");
        let m = original.minimize();
        assert_eq!(m.states(), &set(["s0", "s1"]));
        assert_eq!(m.accepting(), &set(["s0", "s1"]));

        let with_epsilon = AutomatonBuilder::default()
            .with_epsilon_edges([("p0", "p1")])
            .with_edges([("p1", "a", "p2"), ("p2", "a", "p2")])
            .with_accepting(["p2"])
            .into_nfa("p0")
            .unwrap();
        assert_eq!(with_epsilon.minimize(), with_epsilon);
    }

    #[test_log::test]
    fn minimize_is_idempotent() {
        let automaton = dfa(
            [
                ("q0", "a", "q1"),
                ("q0", "b", "q3"),
                ("q1", "a", "q2"),
                ("q1", "b", "q3"),
                ("q2", "a", "q2"),
                ("q2", "b", "q2"),
                ("q3", "a", "q3"),
                ("q3", "b", "q3"),
                ("q4", "a", "q2"),
                ("q4", "b", "q0"),
            ],
            &["q2"],
            "q0",
        );
        let once = automaton.minimize();
        let twice = once.minimize();
        assert_eq!(once, twice);
        for word in ["", "a", "aa", "ab", "aab", "ba", "aba"] {
            assert_eq!(automaton.accepts(word), once.accepts(word), "{word}");
        }

        let automaton = nfa(
            [("q0", "a", "q1"), ("q0", "a", "q2"), ("q1", "b", "q3"), ("q2", "b", "q3"), ("q3", "a", "q4")],
            &["q3"],
            "q0",
        );
        let once = automaton.minimize();
        assert_eq!(once.states(), &set(["q0", "q1", "q3"]));
        assert_eq!(once, once.minimize());
    }
}
