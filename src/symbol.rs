use std::fmt::{Debug, Display};

/// The label that is printed for epsilon transitions. No ordinary symbol may carry it.
pub const EPSILON_LABEL: &str = "ε";

/// A transition label. Either an ordinary alphabet symbol or the reserved [`Symbol::Epsilon`],
/// which consumes no input. Ordinary symbols are ordered lexicographically and all of them
/// sort before epsilon, which is what the derived ordering gives us because of the variant
/// order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// A symbol of the alphabet.
    Ordinary(String),
    /// The empty move.
    Epsilon,
}

impl Symbol {
    /// Creates an ordinary symbol.
    pub fn new<S: Into<String>>(symbol: S) -> Self {
        Symbol::Ordinary(symbol.into())
    }

    /// Returns true if `self` is the epsilon sentinel.
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// Gives the underlying string of an ordinary symbol, `None` for epsilon.
    pub fn as_ordinary(&self) -> Option<&str> {
        match self {
            Symbol::Ordinary(s) => Some(s),
            Symbol::Epsilon => None,
        }
    }

    /// The label used when printing, i.e. the symbol itself or [`EPSILON_LABEL`].
    pub fn label(&self) -> &str {
        match self {
            Symbol::Ordinary(s) => s,
            Symbol::Epsilon => EPSILON_LABEL,
        }
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol::Ordinary(value.to_string())
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Symbol::Ordinary(value)
    }
}

impl From<&String> for Symbol {
    fn from(value: &String) -> Self {
        Symbol::Ordinary(value.clone())
    }
}

impl From<char> for Symbol {
    fn from(value: char) -> Self {
        Symbol::Ordinary(value.to_string())
    }
}

impl From<&Symbol> for Symbol {
    fn from(value: &Symbol) -> Self {
        value.clone()
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Ordinary(s) => write!(f, "{s:?}"),
            Symbol::Epsilon => write!(f, "{EPSILON_LABEL}"),
        }
    }
}
