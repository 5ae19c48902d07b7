//! Operations that build new automata from existing ones. The inputs are never modified and
//! the results never share states with them: every state that is taken over from an operand
//! is renamed with a prefix that identifies the operand.

mod convert;
pub use convert::{convert_dfa_to_nfa, convert_nfa_to_dfa};

mod subset;
pub use subset::subset_construction;

mod regular;
pub use regular::{concatenate, kleene_star, union, FRESH_START};
