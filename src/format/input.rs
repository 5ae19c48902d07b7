use tracing::{debug, trace};

use super::{state_at, Format, FormatError};
use crate::{
    automaton::{Automaton, Components, DFA, NFA},
    math::{OrderedMap, OrderedSet},
    symbol::Symbol,
};

/// Names of states are identifiers: a letter or underscore followed by letters, digits and
/// underscores.
fn is_state_label(label: &str) -> bool {
    let mut chars = label.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Symbols are single word characters.
fn is_symbol_label(label: &str) -> bool {
    let mut chars = label.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphanumeric() || c == '_')
}

/// Parses `<count>` or `<count> [<item>, <item>, ...]`.
fn parse_counted_list(
    text: &str,
    line: usize,
    valid: fn(&str) -> bool,
) -> Result<(usize, Option<Vec<String>>), FormatError> {
    let (count, items) = match text.split_once('[') {
        Some((count, rest)) => {
            let items = rest
                .trim_end()
                .strip_suffix(']')
                .ok_or_else(|| FormatError::syntax(line, "unclosed `[`"))?;
            (count, Some(items.trim()))
        }
        None => (text, None),
    };
    let count: usize = count
        .trim()
        .parse()
        .map_err(|_| FormatError::syntax(line, "expected `<number>` or `<number> [items]`"))?;

    let Some(items) = items.filter(|items| !items.is_empty()) else {
        return Ok((count, None));
    };
    let items: Vec<String> = items.split(',').map(|s| s.trim().to_string()).collect();
    if let Some(pos) = items.iter().position(|item| item.is_empty()) {
        return Err(FormatError::syntax(line, format!("empty item at position {}", pos + 1)));
    }
    if let Some(item) = items.iter().find(|item| !valid(item)) {
        return Err(FormatError::syntax(line, format!("invalid label {item:?}")));
    }
    if items.len() != count {
        return Err(FormatError::syntax(
            line,
            format!("count says {count} but the list has {} items", items.len()),
        ));
    }
    if items.iter().collect::<OrderedSet<_>>().len() != items.len() {
        return Err(FormatError::syntax(line, "items must be unique"));
    }
    Ok((count, Some(items)))
}

/// Parses an automaton of kind `K` from its textual representation. Trailing empty lines
/// are ignored, otherwise the number of lines has to match the number of states exactly.
pub fn parse<K: Format>(text: &str) -> Result<Automaton<K>, FormatError> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() < 2 {
        return Err(FormatError::LineCount {
            expected: 4,
            found: lines.len(),
        });
    }

    let (state_count, states) = parse_counted_list(lines[0], 1, is_state_label)?;
    let expected = state_count
        .checked_add(4)
        .ok_or_else(|| FormatError::syntax(1, "too many states"))?;
    if lines.len() != expected {
        return Err(FormatError::LineCount {
            expected,
            found: lines.len(),
        });
    }
    let states = states.unwrap_or_else(|| (1..=state_count).map(|i| format!("q_{i}")).collect());

    let (symbol_count, alphabet) = parse_counted_list(lines[1], 2, is_symbol_label)?;
    let alphabet = match alphabet {
        Some(alphabet) => alphabet,
        None => (0..symbol_count)
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| char::from_u32('a' as u32 + i))
                    .map(String::from)
                    .ok_or_else(|| FormatError::syntax(2, "too many unnamed symbols"))
            })
            .collect::<Result<_, _>>()?,
    };
    trace!("parsing {} with states {states:?} over {alphabet:?}", K::NAME);

    let columns: Vec<Symbol> = alphabet
        .iter()
        .map(Symbol::from)
        .chain(K::HAS_EPSILON.then_some(Symbol::Epsilon))
        .collect();
    let mut transitions = OrderedMap::new();
    for (offset, (source, row)) in states.iter().zip(&lines[2..2 + state_count]).enumerate() {
        let line = offset + 3;
        let cells: Vec<&str> = if columns.is_empty() && row.trim().is_empty() {
            vec![]
        } else {
            row.split(',').map(str::trim).collect()
        };
        if cells.len() != columns.len() {
            return Err(FormatError::syntax(
                line,
                format!("found {} cells, expected {}", cells.len(), columns.len()),
            ));
        }
        for (symbol, cell) in columns.iter().zip(cells) {
            if let Some(target) = K::parse_cell(cell, line, &states)? {
                transitions.insert((source.clone(), symbol.clone()), target);
            }
        }
    }

    let initial = state_at(&states, lines[2 + state_count].trim(), 3 + state_count)?;
    let accepting = lines[3 + state_count]
        .split(',')
        .map(str::trim)
        .filter(|index| !index.is_empty())
        .map(|index| state_at(&states, index, 4 + state_count))
        .collect::<Result<OrderedSet<_>, _>>()?;
    if accepting.is_empty() {
        return Err(FormatError::NoAcceptingState);
    }

    let automaton = Automaton::new(Components {
        states: states.into_iter().collect(),
        alphabet: alphabet.into_iter().collect(),
        transitions,
        initial,
        accepting,
    })?;
    debug!(
        "parsed {} with {} states",
        K::NAME,
        automaton.states().len()
    );
    Ok(automaton)
}

/// Parses a [`DFA`], see [`parse`].
pub fn parse_dfa(text: &str) -> Result<DFA, FormatError> {
    parse(text)
}

/// Parses an [`NFA`], see [`parse`].
pub fn parse_nfa(text: &str) -> Result<NFA, FormatError> {
    parse(text)
}

#[cfg(test)]
mod tests {
    use super::parse_counted_list;
    use crate::prelude::*;

    /// Drops the indentation of inline fixtures.
    fn text(lines: &[&str]) -> String {
        lines.join("\n") + "\n"
    }

    #[test]
    fn counted_lists() {
        let label = |s: &str| !s.is_empty();
        assert_eq!(parse_counted_list("3", 1, label).unwrap(), (3, None));
        assert_eq!(parse_counted_list(" 2 [ ] ", 1, label).unwrap(), (2, None));
        assert_eq!(
            parse_counted_list("2 [x, y]", 1, label).unwrap(),
            (2, Some(vec!["x".to_string(), "y".to_string()]))
        );
        for bad in ["", "x", "2 [x, y", "2 [x,, y]", "2 [x]", "1 [x, y]", "2 [x, x]"] {
            assert!(parse_counted_list(bad, 1, label).is_err(), "{bad:?}");
        }
    }

    #[test_log::test]
    fn valid_dfa() {
        let dfa = parse_dfa(&text(&["3 [q0, q1, q2]", "2 [a, b]", "1,0", "2,1", "2,0", "0", "1,2"]))
            .unwrap();
        assert_eq!(dfa.initial(), "q0");
        assert_eq!(
            dfa.accepting(),
            &OrderedSet::from(["q1".to_string(), "q2".to_string()])
        );
        assert_eq!(dfa.transition("q1", "a"), Ok("q2".to_string()));
        assert_eq!(dfa.transition("q2", "b"), Ok("q0".to_string()));
    }

    #[test]
    fn default_names() {
        let dfa = parse_dfa(&text(&["2", "2", "1, 0", "1, 1", "0", "1"])).unwrap();
        assert_eq!(
            dfa.states(),
            &OrderedSet::from(["q_1".to_string(), "q_2".to_string()])
        );
        assert_eq!(
            dfa.alphabet(),
            &OrderedSet::from(["a".to_string(), "b".to_string()])
        );
        assert_eq!(dfa.accepts("ba"), Ok(true));
        assert_eq!(dfa.accepts("b"), Ok(false));
    }

    #[test]
    fn invalid_dfas() {
        let cases: [&[&str]; 11] = [
            // fewer states than declared
            &["2 [q0]", "2 [a, b]", "1,0", "0,1", "0", "1"],
            // not a word character
            &["2 [q0, q1]", "1 [!]", "1", "0", "0", "1"],
            &["2 [q0, q1]", "2 [a]", "0", "1", "0", "1"],
            &["2 [q0, q1]", "1 [a, b]", "0,1", "1,0", "0", "1"],
            &["2 [q0, q1, q2]", "1 [a]", "1", "0", "0", "1"],
            // accepting index out of range
            &["3 [q0, q1, q2]", "1 [a]", "1", "2", "2", "0", "5"],
            &["3 [q0, q1, q2]", "2 [a, b]", "1", "2,1", "2,0", "0", "1,2"],
            &["3 [q0, q1, q2]", "2 [a, b]", "1,0,0", "2,1", "2,0", "0", "1,2"],
            // too few and too many rows
            &["3 [q0, q1, q2]", "2 [a, b]", "1,0", "2,1", "0", "1,2"],
            &["2 [q0, q1]", "2 [a, b]", "1,0", "0,1", "1,1", "0", "1"],
            // missing accepting line
            &["2 [q0, q1]", "1 [a]", "1", "0", "0"],
        ];
        for case in cases {
            assert!(parse_dfa(&text(case)).is_err(), "{case:?}");
        }
    }

    #[test]
    fn specific_errors() {
        assert!(matches!(
            parse_dfa(&text(&["3 [q0, q1, q2]", "1 [a]", "1", "2", "2", "0", "5"])),
            Err(FormatError::IndexOutOfRange { line: 7, index: 5, len: 3 })
        ));
        assert!(matches!(
            parse_dfa(&text(&["2 [q0, q1]", "1 [a]", "1", "0", "0"])),
            Err(FormatError::LineCount { expected: 6, found: 5 })
        ));
        assert!(matches!(
            parse_dfa(&text(&["1 [q0]", "1 [a]", "", "0", "0"])),
            Err(FormatError::Syntax { line: 3, .. })
        ));
    }

    #[test]
    fn huge_state_counts() {
        assert!(matches!(
            parse_dfa("30000000\n1\n0\n0\n"),
            Err(FormatError::LineCount { expected: 30000004, found: 4 })
        ));
        let text = format!("{}\n1\n0\n0\n", usize::MAX);
        assert!(matches!(
            parse_dfa(&text),
            Err(FormatError::Syntax { line: 1, .. })
        ));
    }

    #[test_log::test]
    fn nfa_with_epsilon_and_multiple_targets() {
        let nfa = parse_nfa(&text(&[
            "3 [q0, q1, qf]",
            "2 [a, b]",
            "1,   , 1",
            "2 0, , 2",
            ",    , ",
            "0",
            "2",
        ]))
        .unwrap();
        let set = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<OrderedSet<_>>();
        let raw = nfa.transitions();
        assert_eq!(raw[&("q0".to_string(), Symbol::from("a"))], set(&["q1"]));
        assert_eq!(raw[&("q0".to_string(), Symbol::Epsilon)], set(&["q1"]));
        assert_eq!(raw[&("q1".to_string(), Symbol::from("a"))], set(&["q0", "qf"]));
        assert!(!raw.contains_key(&("q0".to_string(), Symbol::from("b"))));
        assert!(!raw.keys().any(|(state, _)| state == "qf"));
        assert_eq!(nfa.accepts(""), Ok(true));
        assert_eq!(nfa.accepts("b"), Ok(false));
    }

    #[test]
    fn epsilon_is_not_a_symbol() {
        let result = parse_nfa(&text(&["1 [q0]", "1 [ε]", ",", "0", "0"]));
        assert!(matches!(
            result,
            Err(FormatError::Automaton(AutomatonError::ReservedSymbol))
        ));
    }

    #[test]
    fn invalid_nfas() {
        // every row needs a cell per symbol and one for epsilon
        assert!(parse_nfa(&text(&["2 [q0, q1]", "2 [a, b]", "1,", "1, ,", "0", "1"])).is_err());
        assert!(parse_nfa(&text(&["2 [q0, q1]", "1 [a]", ", ", ", ", "2", "1"])).is_err());
        assert!(matches!(
            parse_nfa(&text(&["2 [q0, q1]", "1 [a]", ", ", ", ", "0", " "])),
            Err(FormatError::LineCount { .. })
        ));
        assert!(matches!(
            parse_nfa("2 [q0, q1]\n1 [a]\n, \n, \n0\n , \n"),
            Err(FormatError::NoAcceptingState)
        ));
    }

    #[test]
    fn empty_alphabet() {
        let dfa = parse_dfa(&text(&["1 [q]", "0", "", "0", "0"])).unwrap();
        assert!(dfa.alphabet().is_empty());
        assert_eq!(dfa.accepts(""), Ok(true));
    }
}
