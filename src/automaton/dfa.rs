use itertools::Itertools;

use crate::{math::OrderedSet, symbol::Symbol};

use super::{Automaton, AutomatonError, Components, Kind};

/// Marker for automata whose transition function is total and deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Deterministic;

/// A deterministic finite automaton. Every pair of state and symbol has exactly one
/// successor, and there are no epsilon transitions.
///
/// ```
/// use regular_automata::prelude::*;
///
/// // accepts all words with an even number of `a`s
/// let dfa = AutomatonBuilder::default()
///     .with_edges([("even", 'a', "odd"), ("odd", 'a', "even")])
///     .with_accepting(["even"])
///     .into_dfa("even")
///     .unwrap();
/// assert_eq!(dfa.transition("even", 'a').unwrap(), "odd");
/// assert_eq!(dfa.accepts("aaaa"), Ok(true));
/// ```
pub type DFA = Automaton<Deterministic>;

impl Kind for Deterministic {
    type Target = String;
    type Step = String;
    const NAME: &'static str = "DFA";
    const HAS_EPSILON: bool = false;

    fn targets(target: &String) -> impl Iterator<Item = &String> + '_ {
        std::iter::once(target)
    }

    fn validate(components: &Components<String>) -> Result<(), AutomatonError> {
        if let Some((state, _)) = components.transitions.keys().find(|(_, sym)| sym.is_epsilon()) {
            return Err(AutomatonError::EpsilonInDeterministic {
                state: state.clone(),
            });
        }
        for (state, symbol) in components
            .states
            .iter()
            .cartesian_product(components.alphabet.iter())
        {
            if !components
                .transitions
                .contains_key(&(state.clone(), Symbol::from(symbol)))
            {
                return Err(AutomatonError::MissingTransition {
                    state: state.clone(),
                    symbol: symbol.clone(),
                });
            }
        }
        Ok(())
    }

    fn step(automaton: &Automaton<Self>, state: &str, symbol: &Symbol) -> String {
        // totality is checked on construction
        automaton
            .raw_targets(state, symbol)
            .next()
            .cloned()
            .unwrap_or_else(|| state.to_string())
    }

    fn start_states(automaton: &Automaton<Self>) -> OrderedSet<String> {
        OrderedSet::from([automaton.initial().to_string()])
    }

    fn step_states(step: String) -> OrderedSet<String> {
        OrderedSet::from([step])
    }

    fn hop_symbols(automaton: &Automaton<Self>, from: &str, to: &str) -> Vec<String> {
        automaton
            .edges()
            .get(from)
            .and_then(|by_target| by_target.get(to))
            .map(|symbols| {
                symbols
                    .iter()
                    .filter_map(|sym| sym.as_ordinary().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn restrict(target: &String, removed: &OrderedSet<String>) -> Option<String> {
        (!removed.contains(target)).then(|| target.clone())
    }

    fn format_target(target: Option<&String>) -> String {
        target.cloned().unwrap_or_else(|| "-".to_string())
    }
}

impl DFA {
    /// Runs `word` by threading a single current state and returns the state in which the
    /// run ends.
    pub fn reached_state<I, S>(&self, word: I) -> Result<String, AutomatonError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        word.into_iter()
            .try_fold(self.initial().to_string(), |state, symbol| {
                self.transition(&state, symbol)
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn components() -> Components<String> {
        let transitions = [
            (("q0", "a"), "q1"),
            (("q0", "b"), "q0"),
            (("q1", "a"), "q0"),
            (("q1", "b"), "q1"),
        ]
        .into_iter()
        .map(|((q, a), p)| ((q.to_string(), Symbol::from(a)), p.to_string()))
        .collect();
        Components::new(["q0", "q1"], ["a", "b"], transitions, "q0", ["q0"])
    }

    #[test]
    fn totality_is_required() {
        assert!(DFA::new(components()).is_ok());

        let mut partial = components();
        partial
            .transitions
            .remove(&("q1".to_string(), Symbol::from("b")));
        assert_eq!(
            DFA::new(partial),
            Err(AutomatonError::MissingTransition {
                state: "q1".into(),
                symbol: "b".into()
            })
        );
    }

    #[test]
    fn epsilon_is_rejected() {
        let mut with_epsilon = components();
        with_epsilon
            .transitions
            .insert(("q0".to_string(), Symbol::Epsilon), "q1".to_string());
        assert_eq!(
            DFA::new(with_epsilon),
            Err(AutomatonError::EpsilonInDeterministic { state: "q0".into() })
        );
    }

    #[test]
    fn undeclared_symbol_is_rejected() {
        let mut extra = components();
        extra
            .transitions
            .insert(("q0".to_string(), Symbol::from("c")), "q1".to_string());
        assert!(matches!(
            DFA::new(extra),
            Err(AutomatonError::UndeclaredSymbol { .. })
        ));
    }

    #[test]
    fn builder_detects_nondeterminism() {
        let res = AutomatonBuilder::default()
            .with_edges([("q0", "a", "q0"), ("q0", "a", "q1"), ("q1", "a", "q1")])
            .into_dfa("q0");
        assert!(matches!(res, Err(AutomatonError::Nondeterministic { .. })));
    }

    #[test]
    fn reached_state_threads_single_state() {
        let dfa = DFA::new(components()).unwrap();
        assert_eq!(dfa.reached_state("abba".chars()).unwrap(), "q0");
        assert_eq!(dfa.reached_state("ab".chars()).unwrap(), "q1");
        assert_eq!(dfa.reached_state("".chars()).unwrap(), "q0");
        assert_eq!(dfa.accepts("aa"), Ok(true));
        assert_eq!(dfa.accepts("a"), Ok(false));
    }

    #[test]
    fn empty_alphabet_accepts_only_empty_word() {
        let dfa = AutomatonBuilder::default()
            .with_states(["q0"])
            .with_accepting(["q0"])
            .into_dfa("q0")
            .unwrap();
        assert_eq!(dfa.accepts(""), Ok(true));
        assert!(dfa.accepts("a").is_err());
    }
}
