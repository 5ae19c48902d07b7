use crate::{
    math::{OrderedMap, OrderedSet},
    symbol::Symbol,
};

use super::{AutomatonError, Components, DFA, NFA};

/// Helper struct for the construction of automata from a list of edges. States and symbols
/// that are mentioned anywhere are declared implicitly, so in most cases it suffices to give
/// the edges, the accepting states and finally the start state.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let nfa = AutomatonBuilder::default()
///     .with_edges([("q0", "a", "q0"), ("q0", "a", "q1")])
///     .with_epsilon_edges([("q1", "q2")])
///     .with_accepting(["q2"])
///     .into_nfa("q0")
///     .unwrap();
/// assert_eq!(nfa.states().len(), 3);
/// assert_eq!(nfa.accepts("aa"), Ok(true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    states: OrderedSet<String>,
    symbols: OrderedSet<String>,
    edges: Vec<(String, Symbol, String)>,
    accepting: OrderedSet<String>,
}

impl AutomatonBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares states, which is only necessary for states that appear on no edge.
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Declares symbols, which is only necessary for symbols that label no edge.
    pub fn with_alphabet_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Adds edges given as triples of source, symbol and target.
    pub fn with_edges<I, Q, L, P>(mut self, edges: I) -> Self
    where
        I: IntoIterator<Item = (Q, L, P)>,
        Q: Into<String>,
        L: Into<Symbol>,
        P: Into<String>,
    {
        for (source, symbol, target) in edges {
            let symbol = symbol.into();
            if let Symbol::Ordinary(sym) = &symbol {
                self.symbols.insert(sym.clone());
            }
            self.edges.push((source.into(), symbol, target.into()));
        }
        self
    }

    /// Adds epsilon edges given as pairs of source and target.
    pub fn with_epsilon_edges<I, Q, P>(self, edges: I) -> Self
    where
        I: IntoIterator<Item = (Q, P)>,
        Q: Into<String>,
        P: Into<String>,
    {
        self.with_edges(
            edges
                .into_iter()
                .map(|(source, target)| (source, Symbol::Epsilon, target)),
        )
    }

    /// Marks the given states as accepting.
    pub fn with_accepting<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepting.extend(states.into_iter().map(Into::into));
        self
    }

    fn into_components(self, initial: String) -> Components<OrderedSet<String>> {
        let mut states = self.states;
        states.insert(initial.clone());
        states.extend(self.accepting.iter().cloned());

        let mut transitions: OrderedMap<(String, Symbol), OrderedSet<String>> = OrderedMap::new();
        for (source, symbol, target) in self.edges {
            states.insert(source.clone());
            states.insert(target.clone());
            transitions
                .entry((source, symbol))
                .or_default()
                .insert(target);
        }

        Components {
            states,
            alphabet: self.symbols,
            transitions,
            initial,
            accepting: self.accepting,
        }
    }

    /// Builds an [`NFA`] with the given start state.
    pub fn into_nfa(self, initial: impl Into<String>) -> Result<NFA, AutomatonError> {
        NFA::new(self.into_components(initial.into()))
    }

    /// Builds a [`DFA`] with the given start state. Fails if some state has several edges
    /// with the same symbol, or if the resulting transition function is not total.
    pub fn into_dfa(self, initial: impl Into<String>) -> Result<DFA, AutomatonError> {
        let Components {
            states,
            alphabet,
            transitions,
            initial,
            accepting,
        } = self.into_components(initial.into());

        let transitions = transitions
            .into_iter()
            .map(|((state, symbol), targets)| {
                if targets.len() != 1 {
                    return Err(AutomatonError::Nondeterministic {
                        state,
                        symbol: symbol.label().to_string(),
                        targets,
                    });
                }
                let target = targets.into_iter().next().unwrap_or_default();
                Ok(((state, symbol), target))
            })
            .collect::<Result<_, _>>()?;

        DFA::new(Components {
            states,
            alphabet,
            transitions,
            initial,
            accepting,
        })
    }
}
