//! A line based text format for storing automata in `.dfauto` and `.nfauto` files.
//!
//! ```text
//! 3 [q0, q1, q2]     number of states, optionally followed by their names
//! 2 [a, b]           number of symbols, optionally followed by the symbols
//! 1, 0               one row per state with one cell per symbol, for an NFA
//! 2, 1               there is an additional last cell for epsilon
//! 2, 0
//! 0                  index of the start state
//! 1, 2               indices of the accepting states
//! ```
//!
//! States are referred to by their index in the list of the first line. If the names are
//! omitted, the states are called `q_1`, `q_2`, ... and the symbols `a`, `b`, ... . A cell
//! of a deterministic automaton holds exactly one index, a cell of a nondeterministic one
//! holds any number of whitespace separated indices.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::{
    automaton::{Automaton, AutomatonError, Deterministic, Kind, Nondeterministic},
    math::{OrderedMap, OrderedSet},
};

pub mod input;
pub use input::{parse, parse_dfa, parse_nfa};

pub mod output;
pub use output::{write, write_dfa, write_nfa};

/// Errors that arise while reading or writing the text format.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("expected {expected} lines but found {found}")]
    LineCount { expected: usize, found: usize },
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },
    #[error("line {line}: index {index} is out of range, there are only {len} states")]
    IndexOutOfRange {
        line: usize,
        index: usize,
        len: usize,
    },
    #[error("at least one accepting state must be given")]
    NoAcceptingState,
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
    #[error("could not access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FormatError {
    pub(crate) fn syntax(line: usize, reason: impl Into<String>) -> Self {
        FormatError::Syntax {
            line,
            reason: reason.into(),
        }
    }
}

/// Automaton kinds that can be stored in the text format. The kinds only differ in how a
/// single cell of a transition row is written and read.
pub trait Format: Kind {
    /// File extension, without the leading dot.
    const EXTENSION: &'static str;

    /// Writes the target of a transition as state indices.
    fn write_cell(target: Option<&Self::Target>, index: &OrderedMap<&str, usize>) -> String;

    /// Reads a cell of line `line`, `states` are the names in index order. Gives `None` if
    /// the cell stands for no transition at all.
    fn parse_cell(
        cell: &str,
        line: usize,
        states: &[String],
    ) -> Result<Option<Self::Target>, FormatError>;
}

pub(crate) fn state_at(states: &[String], index: &str, line: usize) -> Result<String, FormatError> {
    let index: usize = index
        .parse()
        .map_err(|_| FormatError::syntax(line, format!("{index:?} is not a state index")))?;
    states
        .get(index)
        .cloned()
        .ok_or(FormatError::IndexOutOfRange {
            line,
            index,
            len: states.len(),
        })
}

impl Format for Deterministic {
    const EXTENSION: &'static str = "dfauto";

    fn write_cell(target: Option<&String>, index: &OrderedMap<&str, usize>) -> String {
        target
            .and_then(|q| index.get(q.as_str()))
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    fn parse_cell(
        cell: &str,
        line: usize,
        states: &[String],
    ) -> Result<Option<String>, FormatError> {
        state_at(states, cell, line).map(Some)
    }
}

impl Format for Nondeterministic {
    const EXTENSION: &'static str = "nfauto";

    fn write_cell(target: Option<&OrderedSet<String>>, index: &OrderedMap<&str, usize>) -> String {
        let mut indices: Vec<usize> = target
            .into_iter()
            .flatten()
            .filter_map(|q| index.get(q.as_str()).copied())
            .collect();
        indices.sort_unstable();
        indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
    }

    fn parse_cell(
        cell: &str,
        line: usize,
        states: &[String],
    ) -> Result<Option<OrderedSet<String>>, FormatError> {
        let targets = cell
            .split_whitespace()
            .map(|index| state_at(states, index, line))
            .collect::<Result<OrderedSet<_>, _>>()?;
        Ok((!targets.is_empty()).then_some(targets))
    }
}

/// The path `base` with the extension of `K` appended, so `machine` becomes `machine.dfauto`.
pub fn path_for<K: Format>(base: impl AsRef<Path>) -> PathBuf {
    let mut path = base.as_ref().as_os_str().to_owned();
    path.push(".");
    path.push(K::EXTENSION);
    PathBuf::from(path)
}

/// Writes `automaton` to the file `base.dfauto` or `base.nfauto` and returns its path.
pub fn save<K: Format>(
    automaton: &Automaton<K>,
    base: impl AsRef<Path>,
) -> Result<PathBuf, FormatError> {
    let path = path_for::<K>(base);
    std::fs::write(&path, write(automaton)).map_err(|source| FormatError::Io {
        path: path.clone(),
        source,
    })?;
    debug!("saved {} to {}", K::NAME, path.display());
    Ok(path)
}

/// Reads an automaton from the file at `path`.
pub fn load<K: Format>(path: impl AsRef<Path>) -> Result<Automaton<K>, FormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

impl<K: Format> Automaton<K> {
    /// See [`save`].
    pub fn save(&self, base: impl AsRef<Path>) -> Result<PathBuf, FormatError> {
        save(self, base)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let dfa = AutomatonBuilder::default()
            .with_edges([("q0", 'a', "q1"), ("q0", 'b', "q0"), ("q1", 'a', "q1"), ("q1", 'b', "q0")])
            .with_accepting(["q1"])
            .into_dfa("q0")
            .unwrap();

        let path = dfa.save(dir.path().join("machine")).unwrap();
        assert_eq!(path, dir.path().join("machine.dfauto"));
        assert_eq!(load::<Deterministic>(&path).unwrap(), dfa);

        let nfa = dfa.to_nfa();
        let path = save(&nfa, dir.path().join("machine")).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("nfauto"));
        assert_eq!(load::<Nondeterministic>(&path).unwrap(), nfa);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nothing.nfauto");
        assert!(matches!(
            load::<Nondeterministic>(&missing),
            Err(FormatError::Io { path, .. }) if path == missing
        ));
    }
}
