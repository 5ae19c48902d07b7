use std::fmt::Display;

use itertools::Itertools;
use tracing::trace;

use crate::automaton::{Automaton, Kind};

/// Attributes of a node in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
    /// The width of a node
    Width(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label={}", quote(s)),
            DotStateAttribute::Shape(s) => write!(f, "shape={}", quote(s)),
            DotStateAttribute::Width(w) => write!(f, "width={}", quote(w)),
        }
    }
}

/// Attributes of an edge in the DOT format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotTransitionAttribute {
    Label(String),
}

impl Display for DotTransitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotTransitionAttribute::Label(lbl) => write!(f, "label={}", quote(lbl)),
        }
    }
}

/// Turns `name` into a quoted DOT identifier.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn attributes<A: Display>(attrs: impl IntoIterator<Item = A>) -> String {
    attrs.into_iter().map(|attr| attr.to_string()).join(", ")
}

impl<K: Kind> Automaton<K> {
    /// The identifier of the invisible node from which the arrow into the start state
    /// originates. It differs from every state name.
    fn dot_start_ident(&self) -> String {
        let mut ident = "start".to_string();
        while self.states().contains(&ident) {
            ident.push('_');
        }
        ident
    }

    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    ///
    /// Accepting states are drawn as double circles and the start state is marked by an
    /// arrow from an invisible point. There is one edge for every pair of states that are
    /// connected, labelled with all symbols that lead from one to the other.
    pub fn dot_representation(&self) -> String {
        let start = self.dot_start_ident();
        let header = [
            format!("digraph {} {{", K::NAME),
            "rankdir=LR".to_string(),
            "node [shape=circle]".to_string(),
            format!(
                "{} [{}]",
                quote(&start),
                attributes([
                    DotStateAttribute::Shape("point".into()),
                    DotStateAttribute::Width("0.01".into()),
                ])
            ),
            format!("{{ rank=source {} }}", quote(&start)),
        ];

        let states = self.states().iter().map(|q| {
            let shape = if self.is_accepting(q) {
                "doublecircle"
            } else {
                "circle"
            };
            format!(
                "{} [{}]",
                quote(q),
                attributes([
                    DotStateAttribute::Shape(shape.into()),
                    DotStateAttribute::Label(q.clone()),
                ])
            )
        });

        let initial = std::iter::once(format!("{} -> {}", quote(&start), quote(self.initial())));

        let transitions = self.edges().iter().flat_map(|(source, targets)| {
            targets.iter().map(move |(target, symbols)| {
                format!(
                    "{} -> {} [{}]",
                    quote(source),
                    quote(target),
                    attributes([DotTransitionAttribute::Label(symbols.iter().join(", "))])
                )
            })
        });

        let dot = header
            .into_iter()
            .chain(states)
            .chain(initial)
            .chain(transitions)
            .chain(std::iter::once("}".to_string()))
            .join("\n");
        trace!("produced dot representation\n{dot}");
        dot
    }
}
