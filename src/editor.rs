use std::{cell::RefCell, fmt::Debug, marker::PhantomData};

use bit_set::BitSet;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    automaton::{AutomatonError, Components, Edges, Kind},
    math::{Bijection, Map, OrderedMap, OrderedSet},
    symbol::{Symbol, EPSILON_LABEL},
};

mod index;
pub use index::TransitionIndex;

mod dfa;
pub use dfa::EditableDfa;

mod nfa;
pub use nfa::EditableNfa;

/// Errors raised by the [`RegAuto`] editor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A mutator was called while no transaction is open.
    #[error("cannot {operation} outside of an edit transaction")]
    NotEditing {
        /// What was attempted.
        operation: &'static str,
    },
    /// A query that needs a consistent automaton was made during a transaction.
    #[error("cannot {operation} during an edit transaction")]
    Editing {
        /// What was attempted.
        operation: &'static str,
    },
    /// A rename would give two entities the same name.
    #[error("the name {name:?} is already taken")]
    NameTaken {
        /// The requested name.
        name: String,
    },
    /// No state with this name exists, dead or alive.
    #[error("there is no state {name:?}")]
    UnknownState {
        /// The requested name.
        name: String,
    },
    /// No letter with this name exists, dead or alive.
    #[error("there is no letter {name:?}")]
    UnknownLetter {
        /// The requested name.
        name: String,
    },
    /// An id that was never handed out.
    #[error("there is no {kind} with id {id}")]
    UnknownId {
        /// Either `"state"` or `"letter"`.
        kind: &'static str,
        /// The requested id.
        id: usize,
    },
    /// The epsilon letter of a nondeterministic editor cannot be touched.
    #[error("cannot {operation} the reserved epsilon letter")]
    ProtectedEpsilon {
        /// What was attempted.
        operation: &'static str,
    },
    /// Deterministic editors know no epsilon letter.
    #[error("cannot {operation} epsilon in a deterministic automaton")]
    EpsilonInDeterministic {
        /// What was attempted.
        operation: &'static str,
    },
    /// A step was requested from a dead state.
    #[error("state {name:?} is dead")]
    DeadState {
        /// Name of the dead state.
        name: String,
    },
    /// A step was requested on a dead letter.
    #[error("letter {name:?} is dead")]
    DeadLetter {
        /// Name of the dead letter.
        name: String,
    },
    /// The live part violates the invariant once a transaction closes.
    #[error("invalid {kind} after edit: {reason}")]
    Invalid {
        /// The kind of automaton, see [`Kind::NAME`].
        kind: &'static str,
        /// What is wrong.
        reason: String,
    },
    /// Converting to or from a frozen automaton failed.
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

/// Turns the right hand side of a transition into destination names. Implemented for single
/// names as well as for collections of names.
pub trait IntoDestinations {
    /// Produces the destination names.
    fn into_destinations(self) -> Vec<String>;
}

impl IntoDestinations for &str {
    fn into_destinations(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoDestinations for String {
    fn into_destinations(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoDestinations for &String {
    fn into_destinations(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: Into<String>> IntoDestinations for Vec<S> {
    fn into_destinations(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoDestinations for [S; N] {
    fn into_destinations(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl IntoDestinations for OrderedSet<String> {
    fn into_destinations(self) -> Vec<String> {
        self.into_iter().collect()
    }
}

/// The part of the editor behaviour that depends on determinism.
pub trait EditorKind: Kind {
    /// Id of the reserved epsilon letter, if there is one.
    const EPSILON_LETTER: Option<usize>;

    /// The error for an attempt to `operation` epsilon through the public API.
    fn reject_epsilon(operation: &'static str) -> EditError;

    /// The invariant that is checked when an edit transaction closes.
    fn check_live(editor: &RegAuto<Self>) -> Result<(), EditError>;
}

/// A mutable automaton that can only be changed inside an edit transaction, see
/// [`RegAuto::edit`].
///
/// States and letters are stored with dense ids. Removing a state or a letter only marks it
/// as dead, its transitions are retained in the [`TransitionIndex`] but disappear from all
/// public views. Adding a name that already exists revives the dead entity.
///
/// ```
/// use regular_automata::prelude::*;
///
/// let dfa = AutomatonBuilder::default()
///     .with_edges([("q0", 'a', "q1"), ("q1", 'a', "q1")])
///     .with_accepting(["q1"])
///     .into_dfa("q0")
///     .unwrap();
/// let mut editor = EditableDfa::from_dfa(&dfa).unwrap();
/// editor
///     .edit(|e| {
///         e.add_states(["q2"])?;
///         e.add_transitions([(("q2", "a"), "q2")])?;
///         e.remove_states(["q1"])?;
///         e.add_transitions([(("q0", "a"), "q2")])
///     })
///     .unwrap();
/// // `q1` is dead, so nothing is accepted anymore
/// assert!(editor.states().contains("q2"));
/// assert!(editor.accepting().is_empty());
/// assert_eq!(editor.accepts("aa"), Ok(false));
/// ```
pub struct RegAuto<K: EditorKind> {
    state_ids: Bijection<String, usize>,
    letter_ids: Bijection<Symbol, usize>,
    dead_states: BitSet,
    dead_letters: BitSet,
    index: TransitionIndex,
    initial: usize,
    accepting: OrderedSet<usize>,
    editing: bool,
    closure_cache: RefCell<Map<usize, OrderedSet<usize>>>,
    _kind: PhantomData<K>,
}

impl<K: EditorKind> RegAuto<K> {
    fn empty() -> Self {
        let mut letter_ids = Bijection::new();
        if let Some(eps) = K::EPSILON_LETTER {
            letter_ids.insert(Symbol::Epsilon, eps);
        }
        Self {
            state_ids: Bijection::new(),
            letter_ids,
            dead_states: BitSet::new(),
            dead_letters: BitSet::new(),
            index: TransitionIndex::default(),
            initial: 0,
            accepting: OrderedSet::new(),
            editing: false,
            closure_cache: RefCell::new(Map::default()),
            _kind: PhantomData,
        }
    }

    /// Builds an editor from a 5-tuple. The construction itself runs as an edit transaction,
    /// so the result satisfies the invariant of `K`.
    pub fn new<T: IntoDestinations>(components: Components<T>) -> Result<Self, EditError> {
        let Components {
            states,
            alphabet,
            transitions,
            initial,
            accepting,
        } = components;

        let mut editor = Self::empty();
        editor.edit(|e| {
            e.add_states(states)?;
            e.add_letters(alphabet)?;
            e.add_transitions(transitions)
        })?;

        editor.initial = editor.sid_of(&initial)?;
        editor.accepting = accepting
            .iter()
            .map(|name| editor.sid_of(name))
            .collect::<Result<_, _>>()?;
        Ok(editor)
    }

    /// Opens an edit transaction and runs `body` in it. Once `body` returns, the previous
    /// mode is restored and the invariant is checked. An error returned by `body` takes
    /// precedence. Mutations are never rolled back, even if the check fails.
    pub fn edit<R, F>(&mut self, body: F) -> Result<R, EditError>
    where
        F: FnOnce(&mut Self) -> Result<R, EditError>,
    {
        let was_editing = std::mem::replace(&mut self.editing, true);
        trace!("opened {} edit transaction", K::NAME);

        let result = body(self);
        self.editing = was_editing;
        self.invalidate();

        let value = result?;
        if let Err(err) = K::check_live(self) {
            warn!("{} edit transaction closed with violation: {err}", K::NAME);
            return Err(err);
        }
        debug!(
            "closed {} edit transaction with {} live states",
            K::NAME,
            self.states().len()
        );
        Ok(value)
    }

    /// Returns true while an edit transaction is open.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    fn guard(&self, operation: &'static str) -> Result<(), EditError> {
        if self.editing {
            Ok(())
        } else {
            Err(EditError::NotEditing { operation })
        }
    }

    fn invalidate(&mut self) {
        self.index.invalidate();
        self.closure_cache.borrow_mut().clear();
    }

    fn sid_of(&self, name: &str) -> Result<usize, EditError> {
        self.state_ids
            .get_by_left(name)
            .copied()
            .ok_or_else(|| EditError::UnknownState {
                name: name.to_string(),
            })
    }

    fn aid_of(&self, symbol: &Symbol, operation: &'static str) -> Result<usize, EditError> {
        if symbol.is_epsilon() {
            return K::EPSILON_LETTER.ok_or_else(|| K::reject_epsilon(operation));
        }
        if symbol.label() == EPSILON_LABEL {
            return Err(K::reject_epsilon(operation));
        }
        self.letter_ids
            .get_by_left(symbol)
            .copied()
            .ok_or_else(|| EditError::UnknownLetter {
                name: symbol.label().to_string(),
            })
    }

    fn is_reserved(&self, aid: usize) -> bool {
        K::EPSILON_LETTER == Some(aid)
    }

    /// Adds states, reviving those that exist but are dead.
    pub fn add_states<I, S>(&mut self, states: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard("add states")?;
        for name in states {
            let name = name.into();
            match self.state_ids.get_by_left(&name) {
                Some(&sid) => {
                    self.dead_states.remove(sid);
                }
                None => {
                    let sid = self.state_ids.len();
                    self.state_ids.insert(name, sid);
                }
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Adds letters, reviving those that exist but are dead.
    pub fn add_letters<I, S>(&mut self, letters: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard("add letters")?;
        let letters: Vec<String> = letters.into_iter().map(Into::into).collect();
        if letters.iter().any(|l| l == EPSILON_LABEL) {
            return Err(K::reject_epsilon("add"));
        }
        for letter in letters {
            let symbol = Symbol::from(letter);
            match self.letter_ids.get_by_left(&symbol) {
                Some(&aid) => {
                    self.dead_letters.remove(aid);
                }
                None => {
                    let aid = self.letter_ids.len();
                    self.letter_ids.insert(symbol, aid);
                }
            }
        }
        self.invalidate();
        Ok(())
    }

    fn bucket<I, Q, L, D>(
        &self,
        transitions: I,
        operation: &'static str,
    ) -> Result<OrderedMap<(usize, usize), OrderedSet<usize>>, EditError>
    where
        I: IntoIterator<Item = ((Q, L), D)>,
        Q: AsRef<str>,
        L: Into<Symbol>,
        D: IntoDestinations,
    {
        let mut bucket: OrderedMap<(usize, usize), OrderedSet<usize>> = OrderedMap::new();
        for ((source, symbol), destinations) in transitions {
            let key = (
                self.sid_of(source.as_ref())?,
                self.aid_of(&symbol.into(), operation)?,
            );
            let destinations = destinations
                .into_destinations()
                .iter()
                .map(|name| self.sid_of(name))
                .collect::<Result<Vec<_>, _>>()?;
            bucket.entry(key).or_default().extend(destinations);
        }
        Ok(bucket)
    }

    /// Adds transitions, each given as `((source, symbol), destinations)` where the
    /// destinations may be a single name or a collection of names. Existing destinations
    /// are kept. All names are resolved before anything changes.
    pub fn add_transitions<I, Q, L, D>(&mut self, transitions: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = ((Q, L), D)>,
        Q: AsRef<str>,
        L: Into<Symbol>,
        D: IntoDestinations,
    {
        self.guard("add transitions")?;
        let bucket = self.bucket(transitions, "add transitions on")?;
        self.index.extend(bucket);
        self.invalidate();
        Ok(())
    }

    /// Removes the given destinations from their transitions.
    pub fn remove_transitions<I, Q, L, D>(&mut self, transitions: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = ((Q, L), D)>,
        Q: AsRef<str>,
        L: Into<Symbol>,
        D: IntoDestinations,
    {
        self.guard("remove transitions")?;
        let bucket = self.bucket(transitions, "remove transitions on")?;
        self.index.remove(bucket);
        self.invalidate();
        Ok(())
    }

    /// Marks states as dead. Their transitions remain in the index.
    pub fn remove_states<I, S>(&mut self, states: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.guard("remove states")?;
        let sids = states
            .into_iter()
            .map(|name| self.sid_of(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.dead_states.extend(sids);
        self.invalidate();
        Ok(())
    }

    /// Marks letters as dead. The epsilon letter cannot be removed.
    pub fn remove_letters<I, S>(&mut self, letters: I) -> Result<(), EditError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.guard("remove letters")?;
        let aids = letters
            .into_iter()
            .map(|name| self.aid_of(&Symbol::from(name.as_ref()), "remove"))
            .collect::<Result<Vec<_>, _>>()?;
        self.dead_letters.extend(aids);
        self.invalidate();
        Ok(())
    }

    /// Changes the name of a state, keeping its id.
    pub fn rename_state(&mut self, old: &str, new: &str) -> Result<(), EditError> {
        self.guard("rename states")?;
        let sid = self.sid_of(old)?;
        match self.state_ids.get_by_left(new) {
            Some(&other) if other != sid => Err(EditError::NameTaken {
                name: new.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.state_ids.remove_by_right(&sid);
                self.state_ids.insert(new.to_string(), sid);
                self.invalidate();
                Ok(())
            }
        }
    }

    /// Changes the name of a letter, keeping its id. Epsilon can neither be renamed nor
    /// be the new name.
    pub fn rename_letter(&mut self, old: &str, new: &str) -> Result<(), EditError> {
        self.guard("rename letters")?;
        if new == EPSILON_LABEL {
            return Err(K::reject_epsilon("rename to"));
        }
        let aid = self.aid_of(&Symbol::from(old), "rename")?;
        let symbol = Symbol::from(new);
        match self.letter_ids.get_by_left(&symbol) {
            Some(&other) if other != aid => Err(EditError::NameTaken {
                name: new.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.letter_ids.remove_by_right(&aid);
                self.letter_ids.insert(symbol, aid);
                self.invalidate();
                Ok(())
            }
        }
    }

    fn state_live(&self, sid: usize) -> bool {
        sid < self.state_ids.len() && !self.dead_states.contains(sid)
    }

    fn letter_live(&self, aid: usize) -> bool {
        aid < self.letter_ids.len() && !self.dead_letters.contains(aid)
    }

    /// The name of the state with id `sid`, dead or alive.
    pub fn state_name(&self, sid: usize) -> Option<&str> {
        self.state_ids.get_by_right(&sid).map(String::as_str)
    }

    /// The letter with id `aid`, dead or alive.
    pub fn letter(&self, aid: usize) -> Option<&Symbol> {
        self.letter_ids.get_by_right(&aid)
    }

    /// The id of the state named `name`.
    pub fn state_id(&self, name: &str) -> Option<usize> {
        self.state_ids.get_by_left(name).copied()
    }

    /// The id of the given letter.
    pub fn letter_id<S: Into<Symbol>>(&self, letter: S) -> Option<usize> {
        self.letter_ids.get_by_left(&letter.into()).copied()
    }

    /// Names of all live states.
    pub fn states(&self) -> OrderedSet<String> {
        self.state_ids
            .iter()
            .filter(|(_, &sid)| self.state_live(sid))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names of all live letters, never including epsilon.
    pub fn alphabet(&self) -> OrderedSet<String> {
        self.letter_ids
            .iter()
            .filter(|(_, &aid)| self.letter_live(aid) && !self.is_reserved(aid))
            .filter_map(|(symbol, _)| symbol.as_ordinary().map(str::to_string))
            .collect()
    }

    /// The live transition relation. Every pair of live source and live letter that has an
    /// entry shows up, with dead destinations filtered out, even if nothing remains.
    pub fn transitions(&self) -> OrderedMap<(String, Symbol), OrderedSet<String>> {
        self.index
            .delta()
            .iter()
            .filter(|((src, letter), _)| self.state_live(*src) && self.letter_live(*letter))
            .filter_map(|((src, letter), destinations)| {
                let key = (
                    self.state_name(*src)?.to_string(),
                    self.letter(*letter)?.clone(),
                );
                let live = destinations
                    .iter()
                    .filter(|dst| self.state_live(**dst))
                    .filter_map(|dst| self.state_name(*dst).map(str::to_string))
                    .collect();
                Some((key, live))
            })
            .collect()
    }

    /// The current name of the start state. This is reported even if the state is dead.
    pub fn initial(&self) -> &str {
        self.state_name(self.initial).unwrap_or_default()
    }

    /// Names of the live accepting states.
    pub fn accepting(&self) -> OrderedSet<String> {
        self.accepting
            .iter()
            .filter(|sid| self.state_live(**sid))
            .filter_map(|sid| self.state_name(*sid).map(str::to_string))
            .collect()
    }

    /// Grouped adjacency over live states and letters, in the same shape as
    /// [`crate::automaton::Automaton::edges`].
    pub fn edges(&self) -> Edges {
        let mut edges = Edges::new();
        for (&src, outgoing) in self.index.edges() {
            if !self.state_live(src) {
                continue;
            }
            for &(letter, dst) in outgoing {
                if !self.letter_live(letter) || !self.state_live(dst) {
                    continue;
                }
                let (Some(source), Some(target), Some(symbol)) =
                    (self.state_name(src), self.state_name(dst), self.letter(letter))
                else {
                    continue;
                };
                edges
                    .entry(source.to_string())
                    .or_default()
                    .entry(target.to_string())
                    .or_default()
                    .push(symbol.clone());
            }
        }
        for symbols in edges.values_mut().flat_map(|by_target| by_target.values_mut()) {
            symbols.sort();
        }
        edges
    }

    /// The live predecessors of `state`, grouped by letter.
    pub fn incoming(&self, state: &str) -> Result<OrderedMap<Symbol, OrderedSet<String>>, EditError> {
        let sid = self.sid_of(state)?;
        Ok(self.grouped(self.index.inn().get(&sid)))
    }

    /// The live successors of `state`, grouped by letter.
    pub fn outgoing(&self, state: &str) -> Result<OrderedMap<Symbol, OrderedSet<String>>, EditError> {
        let sid = self.sid_of(state)?;
        Ok(self.grouped(self.index.out().get(&sid)))
    }

    fn grouped(
        &self,
        row: Option<&OrderedMap<usize, OrderedSet<usize>>>,
    ) -> OrderedMap<Symbol, OrderedSet<String>> {
        row.into_iter()
            .flatten()
            .filter(|(letter, _)| self.letter_live(**letter))
            .filter_map(|(letter, others)| {
                let names: OrderedSet<String> = others
                    .iter()
                    .filter(|sid| self.state_live(**sid))
                    .filter_map(|sid| self.state_name(*sid).map(str::to_string))
                    .collect();
                if names.is_empty() {
                    return None;
                }
                Some((self.letter(*letter)?.clone(), names))
            })
            .collect()
    }

    /// The live destinations of a raw move, without any epsilon-closure.
    fn live_move(&self, sid: usize, aid: usize) -> OrderedSet<usize> {
        self.index
            .get(sid, aid)
            .into_iter()
            .flatten()
            .copied()
            .filter(|dst| self.state_live(*dst))
            .collect()
    }

    /// The live states reachable from `sid` through live epsilon transitions. Empty if
    /// `sid` is dead. Memoized until the next mutation.
    pub(crate) fn closure(&self, sid: usize) -> OrderedSet<usize> {
        if !self.state_live(sid) {
            return OrderedSet::new();
        }
        let Some(eps) = K::EPSILON_LETTER else {
            return OrderedSet::from([sid]);
        };
        if let Some(closure) = self.closure_cache.borrow().get(&sid) {
            return closure.clone();
        }

        let mut seen = OrderedSet::new();
        let mut stack = vec![sid];
        while let Some(u) = stack.pop() {
            if !seen.insert(u) {
                continue;
            }
            stack.extend(
                self.live_move(u, eps)
                    .into_iter()
                    .filter(|v| !seen.contains(v)),
            );
        }

        self.closure_cache.borrow_mut().insert(sid, seen.clone());
        seen
    }

    fn closure_all(&self, sids: impl IntoIterator<Item = usize>) -> OrderedSet<usize> {
        sids.into_iter().flat_map(|sid| self.closure(sid)).collect()
    }

    /// Performs a step on ids. For an automaton with epsilon transitions, the move starts
    /// from the epsilon-closure of `sid` and the result is closed again, unless `aid` is
    /// epsilon itself, in which case only the raw move is made. If `sid` or `aid` is dead,
    /// this fails when `throw_on_dead` is set and gives the empty set otherwise.
    pub fn transition(
        &self,
        sid: usize,
        aid: usize,
        throw_on_dead: bool,
    ) -> Result<OrderedSet<usize>, EditError> {
        if self.editing {
            return Err(EditError::Editing {
                operation: "run a transition",
            });
        }
        let state = self
            .state_name(sid)
            .ok_or(EditError::UnknownId { kind: "state", id: sid })?;
        let letter = self
            .letter(aid)
            .ok_or(EditError::UnknownId { kind: "letter", id: aid })?;

        if !self.state_live(sid) || !self.letter_live(aid) {
            if !throw_on_dead {
                return Ok(OrderedSet::new());
            }
            return Err(if self.state_live(sid) {
                EditError::DeadLetter {
                    name: letter.label().to_string(),
                }
            } else {
                EditError::DeadState {
                    name: state.to_string(),
                }
            });
        }

        if self.is_reserved(aid) {
            return Ok(self.live_move(sid, aid));
        }
        let moved = self
            .closure(sid)
            .into_iter()
            .flat_map(|source| self.live_move(source, aid));
        Ok(self.closure_all(moved))
    }

    /// Decides membership of `word` over the live part, reading one letter per character.
    /// Every character must be a live letter, even if the run has already died out.
    pub fn accepts(&self, word: &str) -> Result<bool, EditError> {
        let alphabet = self.alphabet();
        let aids = word
            .chars()
            .map(|ch| {
                let symbol = Symbol::from(ch);
                match self.letter_ids.get_by_left(&symbol) {
                    Some(&aid) if alphabet.contains(symbol.label()) => Ok(aid),
                    _ => Err(AutomatonError::UnknownSymbol {
                        symbol: symbol.label().to_string(),
                        alphabet: alphabet.clone(),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut current = self.closure(self.initial);
        for aid in aids {
            if current.is_empty() {
                break;
            }
            let moved = current
                .iter()
                .flat_map(|sid| self.live_move(*sid, aid))
                .collect::<Vec<_>>();
            current = self.closure_all(moved);
        }
        Ok(current.iter().any(|sid| self.accepting.contains(sid)))
    }

    /// Number of live states.
    pub fn size(&self) -> usize {
        self.states().len()
    }
}

impl<K: EditorKind> Debug for RegAuto<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegAuto")
            .field("kind", &K::NAME)
            .field("Q", &self.states())
            .field("Σ", &self.alphabet())
            .field("δ", &self.transitions())
            .field("q0", &self.initial())
            .field("F", &self.accepting())
            .field("editing", &self.editing)
            .finish()
    }
}
