use crate::{
    automaton::{Components, Deterministic, DFA},
    math::OrderedMap,
};

use super::{EditError, EditorKind, RegAuto};

/// Editor whose transactions must leave a total, deterministic transition function over the
/// live states and letters.
pub type EditableDfa = RegAuto<Deterministic>;

impl EditorKind for Deterministic {
    const EPSILON_LETTER: Option<usize> = None;

    fn reject_epsilon(operation: &'static str) -> EditError {
        EditError::EpsilonInDeterministic { operation }
    }

    fn check_live(editor: &RegAuto<Self>) -> Result<(), EditError> {
        let invalid = |reason: String| EditError::Invalid {
            kind: "DFA",
            reason,
        };
        let states = editor.states();
        let alphabet = editor.alphabet();
        if states.is_empty() {
            return Err(invalid("there are no live states".to_string()));
        }
        if alphabet.is_empty() {
            return Err(invalid("there are no live letters".to_string()));
        }

        let transitions = editor.transitions();
        for state in &states {
            for letter in &alphabet {
                let count = transitions
                    .get(&(state.clone(), letter.into()))
                    .map_or(0, |destinations| destinations.len());
                if count != 1 {
                    return Err(invalid(format!(
                        "({state}, {letter}) must have exactly one live destination, found {count}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl EditableDfa {
    /// Copies a frozen [`DFA`] into a new editor.
    pub fn from_dfa(dfa: &DFA) -> Result<Self, EditError> {
        Self::new(dfa.components())
    }

    /// Freezes the live part of the editor into a [`DFA`].
    pub fn to_dfa(&self) -> Result<DFA, EditError> {
        if self.is_editing() {
            return Err(EditError::Editing {
                operation: "freeze the automaton",
            });
        }
        let transitions = self
            .transitions()
            .into_iter()
            .filter_map(|(key, destinations)| Some((key, destinations.into_iter().next()?)))
            .collect::<OrderedMap<_, _>>();
        Ok(DFA::new(Components {
            states: self.states(),
            alphabet: self.alphabet(),
            transitions,
            initial: self.initial().to_string(),
            accepting: self.accepting(),
        })?)
    }
}
