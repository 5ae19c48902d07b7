//! Library for working with finite automata over finite words.
//!
//! An automaton is given by a finite set of states $Q$, an alphabet $\Sigma$ of symbols, a
//! transition relation, a designated start state $q_0 \in Q$ and a set of accepting states
//! $F \subseteq Q$. The crate distinguishes two kinds, which share one representation
//! [`automaton::Automaton`] and differ only in the type of transition targets:
//! - a [`automaton::DFA`] maps every pair of state and symbol to exactly one state,
//! - an [`automaton::NFA`] maps pairs to sets of states and may additionally move along
//!   epsilon transitions, which consume no input (see [`symbol::Symbol::Epsilon`]).
//!
//! Automata are immutable once constructed, every construction is validated. Operations
//! such as [`minimization::minimize`], [`operations::subset_construction`] or the regular
//! operators [`operations::union`], [`operations::concatenate`] and
//! [`operations::kleene_star`] produce new automata. For incremental modifications there
//! is the [`editor::RegAuto`] which works on integer ids, records edits within a
//! transaction and validates the result once the transaction is closed.
//!
//! The [`sampler::Sampler`] enumerates short accepted words, which is mostly useful for
//! testing and for getting a feeling for the language of an automaton.
//!
//! Automata can be stored in a simple line based text format (see [`format`], behind the
//! `format` feature) and exported to graphviz (behind the `dot` feature).
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use regular_automata::prelude::*;` should be enough to use the package.
pub mod prelude {
    #[cfg(feature = "dot")]
    pub use super::dot::{DotStateAttribute, DotTransitionAttribute};
    #[cfg(feature = "format")]
    pub use super::format::{
        load, parse_dfa, parse_nfa, save, write_dfa, write_nfa, Format, FormatError,
    };
    pub use super::{
        automaton::{
            Automaton, AutomatonBuilder, AutomatonError, Components, Deterministic, Edges, Kind,
            Nondeterministic, ReachableStates, DFA, NFA,
        },
        editor::{EditError, EditableDfa, EditableNfa, EditorKind, IntoDestinations, RegAuto},
        math::{self, OrderedMap, OrderedSet, Partition},
        minimization::{find_dead_states, group_indistinguishable_states, minimize, Complete},
        operations::{
            concatenate, convert_dfa_to_nfa, convert_nfa_to_dfa, kleene_star, subset_construction,
            union, FRESH_START,
        },
        sampler::{SampleConfig, Sampler},
        symbol::{Symbol, EPSILON_LABEL},
    };
}

/// Set and map types used throughout the crate, as well as bijections and partitions.
pub mod math;

/// The symbols that label transitions.
pub mod symbol;

/// Validated, immutable automata.
#[allow(clippy::upper_case_acronyms)]
pub mod automaton;

/// Transactional editing of automata.
pub mod editor;

/// Removal of useless states and merging of equivalent ones.
pub mod minimization;

/// Constructions that combine or convert automata.
pub mod operations;

/// Enumeration of short accepted words.
pub mod sampler;

/// Reading and writing the `.dfauto`/`.nfauto` text format.
#[cfg(feature = "format")]
#[allow(missing_docs)]
pub mod format;

/// Graphviz output.
#[cfg(feature = "dot")]
#[allow(missing_docs)]
pub mod dot;
