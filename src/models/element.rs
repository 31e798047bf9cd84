//! Ontology elements and their kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The closed set of ontology element kinds.
///
/// Ordering doubles as declaration precedence: when one IRI is declared with
/// several kinds, the smallest wins (Class > ObjectProperty > DatatypeProperty
/// > Individual).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ElementKind {
    Class,
    ObjectProperty,
    DatatypeProperty,
    Individual,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Class,
        ElementKind::ObjectProperty,
        ElementKind::DatatypeProperty,
        ElementKind::Individual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Class => "Class",
            ElementKind::ObjectProperty => "ObjectProperty",
            ElementKind::DatatypeProperty => "DatatypeProperty",
            ElementKind::Individual => "Individual",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::Internal(format!("unknown element kind '{}'", s)))
    }
}

/// An element declared by an ontology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyElement {
    pub iri: String,
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl OntologyElement {
    pub fn new(iri: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            iri: iri.into(),
            kind,
            label: None,
            comment: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// An element referenced (not declared) by microtheory content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementRef {
    pub iri: String,
    pub kind: ElementKind,
    /// False when the IRI uses an undeclared prefix and was kept verbatim.
    #[serde(default = "resolved_default")]
    pub resolved: bool,
}

fn resolved_default() -> bool {
    true
}

impl ElementRef {
    pub fn new(iri: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            iri: iri.into(),
            kind,
            resolved: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ElementKind::ALL {
            assert_eq!(kind.as_str().parse::<ElementKind>().unwrap(), kind);
        }
        assert!("Thing".parse::<ElementKind>().is_err());
    }

    #[test]
    fn test_kind_precedence() {
        assert!(ElementKind::Class < ElementKind::ObjectProperty);
        assert!(ElementKind::ObjectProperty < ElementKind::DatatypeProperty);
        assert!(ElementKind::DatatypeProperty < ElementKind::Individual);
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&ElementKind::DatatypeProperty).unwrap();
        assert_eq!(json, "\"DatatypeProperty\"");
    }
}
