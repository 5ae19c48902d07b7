use std::{cell::RefCell, fmt::Debug, marker::PhantomData};

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::{
    math::{Map, OrderedMap, OrderedSet},
    symbol::{Symbol, EPSILON_LABEL},
};

mod builder;
pub use builder::AutomatonBuilder;

mod dfa;
pub use dfa::{Deterministic, DFA};

mod nfa;
pub use nfa::{Nondeterministic, NFA};

/// Breadth-first reachability over the [`Edges`] view.
pub mod reachability;
pub use reachability::ReachableStates;

/// Errors that arise when constructing or running a [`DFA`] or an [`NFA`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomatonError {
    /// A word or query uses a symbol outside of `Σ`.
    #[error("symbol {symbol:?} not in alphabet Σ = {alphabet:?}")]
    UnknownSymbol {
        /// The offending symbol.
        symbol: String,
        /// The alphabet it was looked up in.
        alphabet: OrderedSet<String>,
    },
    /// A deterministic transition relation has no entry for a pair.
    #[error("transition function is not total: missing ({state}, {symbol})")]
    MissingTransition {
        /// Source of the missing transition.
        state: String,
        /// Symbol of the missing transition.
        symbol: String,
    },
    /// A deterministic transition leads to more than one state.
    #[error("transition function is not deterministic: ({state}, {symbol}) leads to {targets:?}")]
    Nondeterministic {
        /// Source of the transition.
        state: String,
        /// Symbol of the transition.
        symbol: String,
        /// All of its targets.
        targets: OrderedSet<String>,
    },
    /// A name is used as a state without being declared in `Q`.
    #[error("state {state:?} is not a member of Q")]
    UnknownState {
        /// The undeclared name.
        state: String,
    },
    /// A transition is labelled with a symbol missing from `Σ`.
    #[error("transition ({state}, {symbol}) uses a symbol that is not declared in Σ")]
    UndeclaredSymbol {
        /// Source of the transition.
        state: String,
        /// The undeclared symbol.
        symbol: String,
    },
    /// `Σ` contains the label that prints epsilon.
    #[error("the alphabet may not contain the reserved epsilon label \"{EPSILON_LABEL}\"")]
    ReservedSymbol,
    /// A [`DFA`] was given an epsilon transition.
    #[error("deterministic automata have no epsilon transitions, found one leaving {state}")]
    EpsilonInDeterministic {
        /// Source of the epsilon transition.
        state: String,
    },
    /// The start state was asked to be removed.
    #[error("the start state {state} cannot be removed")]
    RemovesInitial {
        /// The start state.
        state: String,
    },
    /// A path with fewer than two states has no hops to label.
    #[error("a path needs at least two states, got {len}")]
    PathTooShort {
        /// Number of states on the path.
        len: usize,
    },
    /// Two consecutive states of a path are not connected.
    #[error("no edge from {from} to {to}")]
    MissingEdge {
        /// Where the hop starts.
        from: String,
        /// Where the hop should end.
        to: String,
    },
}

/// The 5-tuple `(Q, Σ, δ, q0, F)`, which is the shape in which automata enter and leave
/// this crate. For a [`DFA`] the transition targets are single state names, for an
/// [`NFA`] they are sets of state names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components<T> {
    /// The states `Q`.
    pub states: OrderedSet<String>,
    /// The alphabet `Σ`, which never contains epsilon.
    pub alphabet: OrderedSet<String>,
    /// The transition relation `δ`.
    pub transitions: OrderedMap<(String, Symbol), T>,
    /// The start state `q0`.
    pub initial: String,
    /// The accepting states `F`.
    pub accepting: OrderedSet<String>,
}

impl<T> Components<T> {
    /// Assembles the 5-tuple from anything that can be turned into names.
    pub fn new<Q, S, F, X, Y, Z>(
        states: Q,
        alphabet: S,
        transitions: OrderedMap<(String, Symbol), T>,
        initial: impl Into<String>,
        accepting: F,
    ) -> Self
    where
        Q: IntoIterator<Item = X>,
        S: IntoIterator<Item = Y>,
        F: IntoIterator<Item = Z>,
        X: Into<String>,
        Y: Into<String>,
        Z: Into<String>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            alphabet: alphabet.into_iter().map(Into::into).collect(),
            transitions,
            initial: initial.into(),
            accepting: accepting.into_iter().map(Into::into).collect(),
        }
    }
}

/// The grouped adjacency view of a transition relation: source, then destination, then
/// the sorted symbols labeling that edge.
pub type Edges = OrderedMap<String, OrderedMap<String, Vec<Symbol>>>;

/// Distinguishes the deterministic from the nondeterministic flavour of an [`Automaton`].
/// Everything that depends on the shape of a transition target goes through this trait.
pub trait Kind: Sized + Copy + Debug + Default + 'static {
    /// What a transition leads to in `δ`.
    type Target: Clone + Eq + Debug;
    /// What [`Automaton::transition`] returns.
    type Step: Clone + Debug;
    /// Short name of the automaton type.
    const NAME: &'static str;
    /// Whether epsilon transitions may appear in `δ`.
    const HAS_EPSILON: bool;

    /// Iterates over the states a transition target refers to.
    fn targets(target: &Self::Target) -> impl Iterator<Item = &String> + '_;

    /// Checks the invariant that is specific to this kind of automaton.
    fn validate(components: &Components<Self::Target>) -> Result<(), AutomatonError>;

    /// Computes a single step, the arguments are known to be valid.
    fn step(automaton: &Automaton<Self>, state: &str, symbol: &Symbol) -> Self::Step;

    /// The states in which a run starts.
    fn start_states(automaton: &Automaton<Self>) -> OrderedSet<String>;

    /// The states a step leads to.
    fn step_states(step: Self::Step) -> OrderedSet<String>;

    /// The ordinary symbols that label a single hop from `from` to `to`.
    fn hop_symbols(automaton: &Automaton<Self>, from: &str, to: &str) -> Vec<String>;

    /// Removes the given states from a transition target. `None` means the
    /// transition disappears entirely.
    fn restrict(target: &Self::Target, removed: &OrderedSet<String>) -> Option<Self::Target>;

    /// Produces a cell of the transition table.
    fn format_target(target: Option<&Self::Target>) -> String;
}

/// A finite automaton over finite words, given by its frozen 5-tuple. Instances are
/// immutable once constructed; all operators build new automata.
///
/// The type parameter `K` determines whether the automaton is deterministic,
/// see the aliases [`DFA`] and [`NFA`].
pub struct Automaton<K: Kind> {
    states: OrderedSet<String>,
    alphabet: OrderedSet<String>,
    transitions: OrderedMap<(String, Symbol), K::Target>,
    initial: String,
    accepting: OrderedSet<String>,
    edges: Edges,
    transition_cache: RefCell<Map<(String, Symbol), K::Step>>,
    closure_cache: RefCell<Map<String, OrderedSet<String>>>,
    _kind: PhantomData<K>,
}

impl<K: Kind> Automaton<K> {
    /// Validates the given 5-tuple and freezes it into an automaton. Fails if a name is
    /// used that is not declared, or if the invariant of `K` does not hold.
    pub fn new(components: Components<K::Target>) -> Result<Self, AutomatonError> {
        Self::check_components(&components)?;
        K::validate(&components)?;
        Ok(Self::freeze(components))
    }

    /// Convenience wrapper around [`Automaton::new`] that accepts anything which can be
    /// turned into names.
    pub fn from_parts<Q, S, F, X, Y, Z>(
        states: Q,
        alphabet: S,
        transitions: OrderedMap<(String, Symbol), K::Target>,
        initial: impl Into<String>,
        accepting: F,
    ) -> Result<Self, AutomatonError>
    where
        Q: IntoIterator<Item = X>,
        S: IntoIterator<Item = Y>,
        F: IntoIterator<Item = Z>,
        X: Into<String>,
        Y: Into<String>,
        Z: Into<String>,
    {
        Self::new(Components::new(
            states,
            alphabet,
            transitions,
            initial,
            accepting,
        ))
    }

    /// Used by the algorithms in this crate, whose output is valid by construction.
    pub(crate) fn new_unchecked(components: Components<K::Target>) -> Self {
        debug_assert_eq!(Self::check_components(&components), Ok(()));
        debug_assert_eq!(K::validate(&components), Ok(()));
        Self::freeze(components)
    }

    fn check_components(components: &Components<K::Target>) -> Result<(), AutomatonError> {
        let known = |state: &String| {
            if components.states.contains(state) {
                Ok(())
            } else {
                Err(AutomatonError::UnknownState {
                    state: state.clone(),
                })
            }
        };

        if components.alphabet.contains(EPSILON_LABEL) {
            return Err(AutomatonError::ReservedSymbol);
        }
        known(&components.initial)?;
        components.accepting.iter().try_for_each(known)?;

        for ((source, symbol), target) in &components.transitions {
            known(source)?;
            if let Symbol::Ordinary(sym) = symbol {
                if !components.alphabet.contains(sym) {
                    return Err(AutomatonError::UndeclaredSymbol {
                        state: source.clone(),
                        symbol: sym.clone(),
                    });
                }
            }
            K::targets(target).try_for_each(known)?;
        }
        Ok(())
    }

    fn freeze(components: Components<K::Target>) -> Self {
        let Components {
            states,
            alphabet,
            transitions,
            initial,
            accepting,
        } = components;

        let mut edges = Edges::new();
        for ((source, symbol), target) in &transitions {
            for destination in K::targets(target) {
                edges
                    .entry(source.clone())
                    .or_default()
                    .entry(destination.clone())
                    .or_default()
                    .push(symbol.clone());
            }
        }
        for symbols in edges.values_mut().flat_map(|by_target| by_target.values_mut()) {
            symbols.sort();
            symbols.dedup();
        }

        trace!(
            "froze {} with {} states and {} transitions",
            K::NAME,
            states.len(),
            transitions.len()
        );

        Self {
            states,
            alphabet,
            transitions,
            initial,
            accepting,
            edges,
            transition_cache: RefCell::new(Map::default()),
            closure_cache: RefCell::new(Map::default()),
            _kind: PhantomData,
        }
    }

    /// Returns the short name of the automaton type, `"DFA"` or `"NFA"`.
    pub fn automaton_type(&self) -> &'static str {
        K::NAME
    }

    /// The set of states `Q`.
    pub fn states(&self) -> &OrderedSet<String> {
        &self.states
    }

    /// The alphabet `Σ`.
    pub fn alphabet(&self) -> &OrderedSet<String> {
        &self.alphabet
    }

    /// The transition relation `δ`.
    pub fn transitions(&self) -> &OrderedMap<(String, Symbol), K::Target> {
        &self.transitions
    }

    /// The start state `q0`.
    pub fn initial(&self) -> &str {
        &self.initial
    }

    /// The accepting states `F`.
    pub fn accepting(&self) -> &OrderedSet<String> {
        &self.accepting
    }

    /// Returns true if `state` is accepting.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// The grouped adjacency view: source, then destination, then the sorted symbols that
    /// label the edge (ordinary symbols first, epsilon last).
    pub fn edges(&self) -> &Edges {
        &self.edges
    }

    /// Returns a copy of the 5-tuple.
    pub fn components(&self) -> Components<K::Target> {
        Components {
            states: self.states.clone(),
            alphabet: self.alphabet.clone(),
            transitions: self.transitions.clone(),
            initial: self.initial.clone(),
            accepting: self.accepting.clone(),
        }
    }

    /// Decomposes the automaton into its 5-tuple.
    pub fn into_components(self) -> Components<K::Target> {
        Components {
            states: self.states,
            alphabet: self.alphabet,
            transitions: self.transitions,
            initial: self.initial,
            accepting: self.accepting,
        }
    }

    /// Performs a single step from `state` on `symbol`. For a [`DFA`] this is the unique
    /// successor, for an [`NFA`] it is the epsilon-closure of all states that are reached
    /// by reading `symbol` from the epsilon-closure of `state`. Results are memoized.
    pub fn transition<S: Into<Symbol>>(
        &self,
        state: &str,
        symbol: S,
    ) -> Result<K::Step, AutomatonError> {
        let symbol = symbol.into();
        if !self.states.contains(state) {
            return Err(AutomatonError::UnknownState {
                state: state.to_string(),
            });
        }
        self.check_symbol(&symbol)?;

        let key = (state.to_string(), symbol);
        if let Some(step) = self.transition_cache.borrow().get(&key) {
            return Ok(step.clone());
        }
        let step = K::step(self, &key.0, &key.1);
        self.transition_cache
            .borrow_mut()
            .insert(key, step.clone());
        Ok(step)
    }

    pub(crate) fn check_symbol(&self, symbol: &Symbol) -> Result<(), AutomatonError> {
        match symbol {
            Symbol::Ordinary(sym) if self.alphabet.contains(sym) => Ok(()),
            other => Err(AutomatonError::UnknownSymbol {
                symbol: other.label().to_string(),
                alphabet: self.alphabet.clone(),
            }),
        }
    }

    /// The raw targets of `δ(state, symbol)`, without any closure.
    pub(crate) fn raw_targets<'a>(
        &'a self,
        state: &str,
        symbol: &Symbol,
    ) -> impl Iterator<Item = &'a String> + 'a {
        self.transitions
            .get(&(state.to_string(), symbol.clone()))
            .into_iter()
            .flat_map(|target| K::targets(target))
    }

    /// Computes the set of states reachable from `state` using only epsilon transitions,
    /// including `state` itself. A [`DFA`] has no epsilon transitions, so there the closure
    /// is always the singleton. Results are memoized per state.
    pub fn epsilon_closure(&self, state: &str) -> OrderedSet<String> {
        if let Some(closure) = self.closure_cache.borrow().get(state) {
            return closure.clone();
        }

        let mut closure = OrderedSet::new();
        let mut stack = vec![state.to_string()];
        while let Some(current) = stack.pop() {
            if closure.contains(&current) {
                continue;
            }
            stack.extend(
                self.raw_targets(&current, &Symbol::Epsilon)
                    .filter(|next| !closure.contains(*next))
                    .cloned(),
            );
            closure.insert(current);
        }

        self.closure_cache
            .borrow_mut()
            .insert(state.to_string(), closure.clone());
        closure
    }

    /// The states in which a run of the automaton starts, i.e. the epsilon-closure of the
    /// start state.
    pub fn start_states(&self) -> OrderedSet<String> {
        K::start_states(self)
    }

    /// The set of states reached in one step, see [`Automaton::transition`].
    pub fn successors(&self, state: &str, symbol: &str) -> Result<OrderedSet<String>, AutomatonError> {
        self.transition(state, symbol).map(K::step_states)
    }

    /// Decides membership of `word`, reading one symbol per character. Symbols whose
    /// label is longer than a single character can only be read through
    /// [`Automaton::accepts_symbols`].
    ///
    /// ```
    /// use regular_automata::prelude::*;
    ///
    /// let dfa = AutomatonBuilder::default()
    ///     .with_edges([("q0", "a", "q1"), ("q0", "b", "q0"), ("q1", "a", "q1"), ("q1", "b", "q0")])
    ///     .with_accepting(["q1"])
    ///     .into_dfa("q0")
    ///     .unwrap();
    /// assert_eq!(dfa.accepts("aba"), Ok(true));
    /// assert_eq!(dfa.accepts("ab"), Ok(false));
    /// assert!(dfa.accepts("abc").is_err());
    /// ```
    pub fn accepts(&self, word: &str) -> Result<bool, AutomatonError> {
        self.accepts_symbols(word.chars())
    }

    /// Runs the given sequence of symbols from the start and returns whether an accepting
    /// state is reached. Fails on the first symbol that is not part of the alphabet.
    pub fn accepts_symbols<I, S>(&self, word: I) -> Result<bool, AutomatonError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let mut current = self.start_states();
        for symbol in word {
            let symbol = symbol.into();
            self.check_symbol(&symbol)?;
            let mut next = OrderedSet::new();
            for state in &current {
                next.extend(K::step_states(self.transition(state, symbol.clone())?));
            }
            current = next;
        }
        Ok(current.iter().any(|state| self.is_accepting(state)))
    }

    /// Given a sequence of at least two states, computes all words that label a walk through
    /// exactly these states, picking one symbol per hop.
    pub fn words_for_path<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Result<OrderedSet<String>, AutomatonError> {
        if path.len() < 2 {
            return Err(AutomatonError::PathTooShort { len: path.len() });
        }

        let hops = path
            .iter()
            .tuple_windows()
            .map(|(from, to)| {
                let symbols = K::hop_symbols(self, from.as_ref(), to.as_ref());
                if symbols.is_empty() {
                    Err(AutomatonError::MissingEdge {
                        from: from.as_ref().to_string(),
                        to: to.as_ref().to_string(),
                    })
                } else {
                    Ok(symbols)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hops
            .into_iter()
            .multi_cartesian_product()
            .map(|word| word.concat())
            .collect())
    }

    /// Returns a copy of `self` without the given states. Transitions that leave a removed
    /// state disappear, transitions into a removed state are dropped from their target. The
    /// result is validated again, so for a [`DFA`] this fails if totality is lost.
    pub fn remove_states<S: AsRef<str>>(
        &self,
        removed: impl IntoIterator<Item = S>,
    ) -> Result<Self, AutomatonError> {
        let removed: OrderedSet<String> = removed
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if removed.contains(&self.initial) {
            return Err(AutomatonError::RemovesInitial {
                state: self.initial.clone(),
            });
        }

        let transitions = self
            .transitions
            .iter()
            .filter(|((source, _), _)| !removed.contains(source))
            .filter_map(|(key, target)| Some((key.clone(), K::restrict(target, &removed)?)))
            .collect();

        Self::new(Components {
            states: self.states.difference(&removed).cloned().collect(),
            alphabet: self.alphabet.clone(),
            transitions,
            initial: self.initial.clone(),
            accepting: self.accepting.difference(&removed).cloned().collect(),
        })
    }

    /// The symbols that head the columns of the transition table, epsilon last if present.
    pub(crate) fn table_symbols(&self) -> Vec<Symbol> {
        self.alphabet
            .iter()
            .map(Symbol::from)
            .chain(K::HAS_EPSILON.then_some(Symbol::Epsilon))
            .collect()
    }

    /// Returns the transition table as rows of strings. The first row holds the header
    /// `state` followed by the sorted symbols, every further row corresponds to one state
    /// in sorted order. Missing transitions are shown as `-`.
    pub fn get_transition_table(&self) -> Vec<Vec<String>> {
        let symbols = self.table_symbols();
        let header = std::iter::once("state".to_string())
            .chain(symbols.iter().map(|sym| sym.label().to_string()))
            .collect();

        std::iter::once(header)
            .chain(self.states.iter().map(|state| {
                std::iter::once(state.clone())
                    .chain(symbols.iter().map(|sym| {
                        K::format_target(self.transitions.get(&(state.clone(), sym.clone())))
                    }))
                    .collect()
            }))
            .collect()
    }

    /// Renders the transition table for display in a terminal. The start state is
    /// marked with `→`, accepting states are marked with `*` and highlighted.
    pub fn show_transition_table(&self) -> String {
        use owo_colors::OwoColorize;

        let mut builder = tabled::builder::Builder::default();
        for (i, row) in self.get_transition_table().into_iter().enumerate() {
            if i == 0 {
                builder.push_record(row);
                continue;
            }
            let mut row = row.into_iter();
            let state = row.next().unwrap_or_default();
            let marker = match (state == self.initial, self.is_accepting(&state)) {
                (true, true) => "→*",
                (true, false) => "→",
                (false, true) => "*",
                (false, false) => "",
            };
            let label = if self.is_accepting(&state) {
                format!("{marker}{}", state.bold())
            } else {
                format!("{marker}{state}")
            };
            builder.push_record(std::iter::once(label).chain(row));
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl<K: Kind> Clone for Automaton<K> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            alphabet: self.alphabet.clone(),
            transitions: self.transitions.clone(),
            initial: self.initial.clone(),
            accepting: self.accepting.clone(),
            edges: self.edges.clone(),
            transition_cache: RefCell::new(Map::default()),
            closure_cache: RefCell::new(Map::default()),
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> PartialEq for Automaton<K> {
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
            && self.alphabet == other.alphabet
            && self.transitions == other.transitions
            && self.initial == other.initial
            && self.accepting == other.accepting
    }
}

impl<K: Kind> Eq for Automaton<K> {}

impl<K: Kind> Debug for Automaton<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(K::NAME)
            .field("Q", &self.states)
            .field("Σ", &self.alphabet)
            .field("δ", &self.transitions)
            .field("q0", &self.initial)
            .field("F", &self.accepting)
            .finish()
    }
}
