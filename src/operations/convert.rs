use crate::{
    automaton::{Components, DFA, NFA},
    math::OrderedSet,
};

/// Views a [`DFA`] as an [`NFA`] by turning every target into a singleton set. The result is
/// minimized.
pub fn convert_dfa_to_nfa(dfa: &DFA) -> NFA {
    let Components {
        states,
        alphabet,
        transitions,
        initial,
        accepting,
    } = dfa.components();

    NFA::new_unchecked(Components {
        states,
        alphabet,
        transitions: transitions
            .into_iter()
            .map(|(key, target)| (key, OrderedSet::from([target])))
            .collect(),
        initial,
        accepting,
    })
    .minimize()
}

/// Determinizes an [`NFA`], see [`super::subset_construction`].
pub fn convert_nfa_to_dfa(nfa: &NFA) -> DFA {
    super::subset_construction(nfa)
}

impl DFA {
    /// See [`convert_dfa_to_nfa`].
    pub fn to_nfa(&self) -> NFA {
        convert_dfa_to_nfa(self)
    }
}

impl NFA {
    /// See [`convert_nfa_to_dfa`].
    pub fn to_dfa(&self) -> DFA {
        convert_nfa_to_dfa(self)
    }
}
