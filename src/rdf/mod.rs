//! RDF parsing: Turtle grammar, prefix handling, terms and vocabulary.
//!
//! The parser is a capability behind [`TripleParser`] so extraction never
//! depends on a particular syntax. [`TurtleParser`] is the pest implementation
//! used everywhere today.

mod prefix;
mod term;
mod turtle;
pub mod vocab;

pub use prefix::{is_absolute, join_namespace, resolve_iri, PrefixMap};
pub use term::{Literal, Term, Triple};
pub use turtle::TurtleParser;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A problem found while parsing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Everything recovered from one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedDocument {
    pub triples: Vec<Triple>,
    pub prefixes: PrefixMap,
    pub base: Option<String>,
    /// Prefixed names whose prefix was never declared, verbatim.
    pub unresolved: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns serialized RDF into triples.
///
/// Implementations must be total: malformed input yields diagnostics and
/// whatever triples could be recovered, never an error.
pub trait TripleParser: Send + Sync {
    fn parse(&self, text: &str) -> ParsedDocument;
}
