use std::fmt::{Result, Write};

use itertools::Itertools;
use tracing::trace;

use super::Format;
use crate::{
    automaton::{Automaton, DFA, NFA},
    math::OrderedMap,
};

/// Writes the textual representation of `automaton` into `w`. States and symbols appear in
/// their sorted order and every state is referred to by its position in that order.
pub fn write_into<K: Format, W: Write>(automaton: &Automaton<K>, w: &mut W) -> Result {
    let index: OrderedMap<&str, usize> = automaton
        .states()
        .iter()
        .enumerate()
        .map(|(i, q)| (q.as_str(), i))
        .collect();

    writeln!(
        w,
        "{} [{}]",
        automaton.states().len(),
        automaton.states().iter().join(", ")
    )?;
    writeln!(
        w,
        "{} [{}]",
        automaton.alphabet().len(),
        automaton.alphabet().iter().join(", ")
    )?;

    let columns = automaton.table_symbols();
    for state in automaton.states() {
        let row = columns
            .iter()
            .map(|sym| {
                K::write_cell(
                    automaton.transitions().get(&(state.clone(), sym.clone())),
                    &index,
                )
            })
            .join(", ");
        writeln!(w, "{row}")?;
    }

    writeln!(w, "{}", index[automaton.initial()])?;
    writeln!(
        w,
        "{}",
        automaton
            .accepting()
            .iter()
            .filter_map(|q| index.get(q.as_str()))
            .sorted()
            .join(", ")
    )
}

/// Gives the textual representation of `automaton`, see [`write_into`].
pub fn write<K: Format>(automaton: &Automaton<K>) -> String {
    let mut out = String::new();
    write_into(automaton, &mut out).expect("writing into a String does not fail");
    trace!("wrote {}\n{}", K::NAME, out);
    out
}

/// See [`write`].
pub fn write_dfa(dfa: &DFA) -> String {
    write(dfa)
}

/// See [`write`].
pub fn write_nfa(nfa: &NFA) -> String {
    write(nfa)
}
