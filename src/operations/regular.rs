use tracing::trace;

use crate::{
    automaton::{Components, NFA},
    math::{OrderedMap, OrderedSet},
    symbol::Symbol,
};

/// Name of the start state that [`union`] and [`kleene_star`] add.
pub const FRESH_START: &str = "q_start";

/// Collects the disjoint copies of the operands of a regular operation.
#[derive(Debug, Default)]
struct Assembly {
    states: OrderedSet<String>,
    alphabet: OrderedSet<String>,
    transitions: OrderedMap<(String, Symbol), OrderedSet<String>>,
    accepting: OrderedSet<String>,
}

impl Assembly {
    /// Copies `nfa` with every state renamed to `prefix` followed by the old name. Returns
    /// the renamed start state and accepting states.
    fn embed(&mut self, nfa: &NFA, prefix: &str) -> (String, Vec<String>) {
        let rename = |q: &String| format!("{prefix}{q}");

        self.states.extend(nfa.states().iter().map(rename));
        self.alphabet.extend(nfa.alphabet().iter().cloned());
        for ((source, symbol), targets) in nfa.transitions() {
            self.transitions
                .entry((rename(source), symbol.clone()))
                .or_default()
                .extend(targets.iter().map(rename));
        }
        (
            rename(&nfa.initial().to_string()),
            nfa.accepting().iter().map(rename).collect(),
        )
    }

    fn add_state(&mut self, state: &str) {
        self.states.insert(state.to_string());
    }

    fn epsilon(&mut self, source: &str, target: &str) {
        self.transitions
            .entry((source.to_string(), Symbol::Epsilon))
            .or_default()
            .insert(target.to_string());
    }

    fn finish(self, initial: String, should_minimize: bool) -> NFA {
        trace!(
            "assembled NFA with {} states, minimizing: {should_minimize}",
            self.states.len()
        );
        let nfa = NFA::new_unchecked(Components {
            states: self.states,
            alphabet: self.alphabet,
            transitions: self.transitions,
            initial,
            accepting: self.accepting,
        });
        if should_minimize {
            nfa.minimize()
        } else {
            nfa
        }
    }
}

/// Builds an [`NFA`] for the union of the two languages. A fresh start state
/// [`FRESH_START`] has epsilon transitions into the copies of both operands, whose states
/// are prefixed with `nfa1_` and `nfa2_` respectively.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let a = AutomatonBuilder::default().with_edges([("s", 'a', "f")]).with_accepting(["f"]).into_nfa("s").unwrap();
/// let b = AutomatonBuilder::default().with_edges([("s", 'b', "f")]).with_accepting(["f"]).into_nfa("s").unwrap();
/// let either = union(&a, &b, false);
/// assert!(either.states().contains("nfa1_s") && either.states().contains("nfa2_f"));
/// assert_eq!(either.accepts("a"), Ok(true));
/// assert_eq!(either.accepts("ab"), Ok(false));
/// ```
pub fn union(first: &NFA, second: &NFA, should_minimize: bool) -> NFA {
    let mut assembly = Assembly::default();
    let (first_start, first_accepting) = assembly.embed(first, "nfa1_");
    let (second_start, second_accepting) = assembly.embed(second, "nfa2_");

    assembly.add_state(FRESH_START);
    assembly.epsilon(FRESH_START, &first_start);
    assembly.epsilon(FRESH_START, &second_start);
    assembly.accepting.extend(first_accepting);
    assembly.accepting.extend(second_accepting);

    assembly.finish(FRESH_START.to_string(), should_minimize)
}

/// Builds an [`NFA`] for the concatenation of the two languages. Every accepting state of
/// the copy of `first` gets an epsilon transition to the start of the copy of `second`, and
/// only the accepting states of the latter remain accepting.
pub fn concatenate(first: &NFA, second: &NFA, should_minimize: bool) -> NFA {
    let mut assembly = Assembly::default();
    let (first_start, first_accepting) = assembly.embed(first, "nfa1_");
    let (second_start, second_accepting) = assembly.embed(second, "nfa2_");

    for state in &first_accepting {
        assembly.epsilon(state, &second_start);
    }
    assembly.accepting.extend(second_accepting);

    assembly.finish(first_start, should_minimize)
}

/// Builds an [`NFA`] for the Kleene star of the language. A fresh accepting start state
/// [`FRESH_START`] leads into the copy of `nfa`, whose states are prefixed with `nfa_`, and
/// every accepting state of the copy returns to its start.
pub fn kleene_star(nfa: &NFA, should_minimize: bool) -> NFA {
    let mut assembly = Assembly::default();
    let (start, accepting) = assembly.embed(nfa, "nfa_");

    assembly.add_state(FRESH_START);
    assembly.epsilon(FRESH_START, &start);
    for state in &accepting {
        assembly.epsilon(state, &start);
    }
    assembly.accepting.insert(FRESH_START.to_string());
    assembly.accepting.extend(accepting);

    assembly.finish(FRESH_START.to_string(), should_minimize)
}
