use crate::{
    automaton::{Components, Nondeterministic, NFA},
    math::OrderedSet,
};

use super::{EditError, EditorKind, RegAuto};

/// Editor for automata with epsilon transitions. Epsilon is the letter with id 0, it is part
/// of the transition relation but never of the alphabet, and it cannot be removed or renamed.
pub type EditableNfa = RegAuto<Nondeterministic>;

impl EditorKind for Nondeterministic {
    const EPSILON_LETTER: Option<usize> = Some(0);

    fn reject_epsilon(operation: &'static str) -> EditError {
        EditError::ProtectedEpsilon { operation }
    }

    fn check_live(editor: &RegAuto<Self>) -> Result<(), EditError> {
        if editor.states().is_empty() {
            return Err(EditError::Invalid {
                kind: "NFA",
                reason: "there are no live states".to_string(),
            });
        }
        if !editor.letter_live(0) {
            return Err(EditError::Invalid {
                kind: "NFA",
                reason: "epsilon must remain live".to_string(),
            });
        }
        Ok(())
    }
}

impl EditableNfa {
    /// Copies a frozen [`NFA`] into a new editor.
    pub fn from_nfa(nfa: &NFA) -> Result<Self, EditError> {
        Self::new(nfa.components())
    }

    /// Freezes the live part of the editor into an [`NFA`]. Fails if the start state is dead.
    pub fn to_nfa(&self) -> Result<NFA, EditError> {
        if self.is_editing() {
            return Err(EditError::Editing {
                operation: "freeze the automaton",
            });
        }
        Ok(NFA::new(Components {
            states: self.states(),
            alphabet: self.alphabet(),
            transitions: self.transitions(),
            initial: self.initial().to_string(),
            accepting: self.accepting(),
        })?)
    }

    /// The live epsilon-closure of `state`, empty if the state is dead.
    pub fn epsilon_closure(&self, state: &str) -> Result<OrderedSet<String>, EditError> {
        let sid = self.sid_of(state)?;
        Ok(self
            .closure(sid)
            .into_iter()
            .filter_map(|sid| self.state_name(sid).map(str::to_string))
            .collect())
    }
}
