use itertools::Itertools;

use crate::{math::OrderedSet, symbol::Symbol};

use super::{Automaton, AutomatonError, Components, Edges, Kind};

/// Marker for automata that may have several successors per symbol and epsilon transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nondeterministic;

/// A nondeterministic finite automaton with epsilon transitions. The transition relation
/// maps pairs of state and symbol (or [`Symbol::Epsilon`]) to sets of states, it need not
/// be total and target sets may be empty.
pub type NFA = Automaton<Nondeterministic>;

impl Kind for Nondeterministic {
    type Target = OrderedSet<String>;
    type Step = OrderedSet<String>;
    const NAME: &'static str = "NFA";
    const HAS_EPSILON: bool = true;

    fn targets(target: &OrderedSet<String>) -> impl Iterator<Item = &String> + '_ {
        target.iter()
    }

    fn validate(_components: &Components<OrderedSet<String>>) -> Result<(), AutomatonError> {
        Ok(())
    }

    fn step(automaton: &Automaton<Self>, state: &str, symbol: &Symbol) -> OrderedSet<String> {
        let moved: OrderedSet<String> = automaton
            .epsilon_closure(state)
            .iter()
            .flat_map(|source| automaton.raw_targets(source, symbol))
            .cloned()
            .collect();
        moved
            .iter()
            .flat_map(|target| automaton.epsilon_closure(target))
            .collect()
    }

    fn start_states(automaton: &Automaton<Self>) -> OrderedSet<String> {
        automaton.epsilon_closure(automaton.initial())
    }

    fn step_states(step: OrderedSet<String>) -> OrderedSet<String> {
        step
    }

    fn hop_symbols(automaton: &Automaton<Self>, from: &str, to: &str) -> Vec<String> {
        automaton
            .alphabet()
            .iter()
            .filter(|symbol| {
                automaton
                    .transition(from, symbol.as_str())
                    .map(|reached| reached.contains(to))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn restrict(
        target: &OrderedSet<String>,
        removed: &OrderedSet<String>,
    ) -> Option<OrderedSet<String>> {
        Some(target.difference(removed).cloned().collect())
    }

    fn format_target(target: Option<&OrderedSet<String>>) -> String {
        match target {
            Some(states) if !states.is_empty() => states.iter().join(","),
            _ => "-".to_string(),
        }
    }
}

impl NFA {
    /// The epsilon-closed counterpart of [`Automaton::edges`]: there is an edge labeled `a`
    /// from `p` to `q` whenever `q` is in [`Automaton::transition`] of `p` and `a`. Epsilon
    /// never appears as a label.
    pub fn closed_edges(&self) -> Edges {
        let mut edges = Edges::new();
        for (state, symbol) in self.states().iter().cartesian_product(self.alphabet().iter()) {
            let reached = Self::hop_targets(self, state, symbol);
            for target in reached {
                edges
                    .entry(state.clone())
                    .or_default()
                    .entry(target)
                    .or_default()
                    .push(Symbol::from(symbol));
            }
        }
        edges
    }

    fn hop_targets(&self, state: &str, symbol: &str) -> OrderedSet<String> {
        self.transition(state, symbol).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn set<const N: usize>(states: [&str; N]) -> OrderedSet<String> {
        states.into_iter().map(String::from).collect()
    }

    /// `q0 -ε-> q1 -ε-> q2`, `q2 -ε-> q0` and `q1 -a-> q3`.
    fn chained() -> NFA {
        AutomatonBuilder::default()
            .with_epsilon_edges([("q0", "q1"), ("q1", "q2"), ("q2", "q0")])
            .with_edges([("q1", "a", "q3")])
            .with_accepting(["q3"])
            .into_nfa("q0")
            .unwrap()
    }

    #[test_log::test]
    fn epsilon_closure_follows_cycles() {
        let nfa = chained();
        assert_eq!(nfa.epsilon_closure("q0"), set(["q0", "q1", "q2"]));
        assert_eq!(nfa.epsilon_closure("q2"), set(["q0", "q1", "q2"]));
        assert_eq!(nfa.epsilon_closure("q3"), set(["q3"]));
        // memoized results stay the same
        assert_eq!(nfa.epsilon_closure("q0"), set(["q0", "q1", "q2"]));
    }

    #[test_log::test]
    fn transition_is_closed() {
        let nfa = chained();
        assert_eq!(nfa.transition("q0", "a").unwrap(), set(["q3"]));
        assert_eq!(nfa.transition("q2", "a").unwrap(), set(["q3"]));
        assert_eq!(nfa.transition("q3", "a").unwrap(), set([]));
        assert!(nfa.transition("q0", Symbol::Epsilon).is_err());
    }

    #[test]
    fn accepts_through_epsilon() {
        let nfa = chained();
        assert_eq!(nfa.accepts("a"), Ok(true));
        assert_eq!(nfa.accepts(""), Ok(false));
        assert_eq!(nfa.accepts("aa"), Ok(false));
        assert!(nfa.accepts("b").is_err());
    }

    #[test]
    fn closed_edges_and_words() {
        let nfa = chained();
        let closed = nfa.closed_edges();
        assert_eq!(closed["q2"]["q3"], vec![Symbol::from("a")]);
        assert!(!closed.contains_key("q3"));
        assert_eq!(
            nfa.words_for_path(&["q0", "q3"]).unwrap(),
            set(["a"])
        );
        assert!(nfa.words_for_path(&["q0", "q1"]).is_err());
    }

    #[test]
    fn empty_targets_are_kept() {
        let mut components = chained().into_components();
        components
            .transitions
            .insert(("q3".to_string(), Symbol::from("a")), OrderedSet::new());
        let nfa = NFA::new(components).unwrap();
        assert_eq!(nfa.get_transition_table()[4], vec!["q3", "-", "-"]);
        assert!(!nfa.edges().contains_key("q3"));
    }
}
