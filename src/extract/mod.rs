//! Dependency extraction from Turtle content.
//!
//! Two views over the same parse:
//! - **declarations**: elements an ontology defines (`:Person a owl:Class`)
//! - **references**: elements microtheory triples use without defining them
//!   (`:alice a :Person ; :hasName "Alice"`)
//!
//! Extraction is pure and total. Malformed statements are skipped and show up
//! as diagnostics; the caller always gets a result.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{ElementKind, ElementRef, OntologyElement};
use crate::rdf::vocab::{
    is_vocabulary, OWL_CLASS, OWL_DATATYPE_PROPERTY, OWL_NAMED_INDIVIDUAL, OWL_OBJECT_PROPERTY,
    OWL_OBJECT_PROPERTY_CHARACTERISTICS, RDFS_CLASS, RDFS_COMMENT, RDFS_LABEL, RDF_TYPE,
};
use crate::rdf::{Diagnostic, ParsedDocument, PrefixMap, Term, Triple, TripleParser, TurtleParser};

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    /// Declared elements, sorted by IRI.
    pub declarations: Vec<OntologyElement>,
    /// Referenced elements not declared locally, sorted by IRI.
    pub references: Vec<ElementRef>,
    pub prefixes: PrefixMap,
    /// Prefixed names with undeclared prefixes, verbatim.
    pub unresolved: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub triple_count: usize,
}

/// Finds the ontology elements a document declares or references.
#[derive(Debug, Clone, Default)]
pub struct DependencyExtractor<P = TurtleParser> {
    parser: P,
}

impl DependencyExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: TripleParser> DependencyExtractor<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }

    /// Parse once and classify both ways.
    pub fn extract(&self, content: &str) -> Extraction {
        let document = self.parser.parse(content);
        let declared = declarations(&document.triples);
        let references = references(&document.triples, &declared);
        finish(document, declared.into_values().collect(), references)
    }

    /// Elements declared by ontology content.
    pub fn declarations(&self, content: &str) -> Vec<OntologyElement> {
        let document = self.parser.parse(content);
        declarations(&document.triples).into_values().collect()
    }

    /// Elements referenced by microtheory content.
    pub fn references(&self, content: &str) -> Vec<ElementRef> {
        self.extract(content).references
    }
}

fn finish(
    document: ParsedDocument,
    declarations: Vec<OntologyElement>,
    references: Vec<ElementRef>,
) -> Extraction {
    Extraction {
        declarations,
        references,
        triple_count: document.triples.len(),
        prefixes: document.prefixes,
        unresolved: document.unresolved.into_iter().collect(),
        diagnostics: document.diagnostics,
    }
}

/// Kind implied by `subject rdf:type object`, if any.
fn declared_kind(class: &Term) -> Option<ElementKind> {
    let name = class.name()?;
    match name {
        OWL_CLASS | RDFS_CLASS => Some(ElementKind::Class),
        OWL_OBJECT_PROPERTY => Some(ElementKind::ObjectProperty),
        OWL_DATATYPE_PROPERTY => Some(ElementKind::DatatypeProperty),
        OWL_NAMED_INDIVIDUAL => Some(ElementKind::Individual),
        _ if OWL_OBJECT_PROPERTY_CHARACTERISTICS.contains(&name) => {
            Some(ElementKind::ObjectProperty)
        }
        // Class assertion against a domain class.
        _ if !is_vocabulary(name) => Some(ElementKind::Individual),
        _ => None,
    }
}

fn declarations(triples: &[Triple]) -> BTreeMap<String, OntologyElement> {
    let mut elements: BTreeMap<String, OntologyElement> = BTreeMap::new();

    for triple in triples.iter().filter(|t| t.has_predicate(RDF_TYPE)) {
        let (Some(subject), Some(kind)) = (triple.subject.name(), declared_kind(&triple.object))
        else {
            continue;
        };
        elements
            .entry(subject.to_string())
            .and_modify(|e| e.kind = e.kind.min(kind))
            .or_insert_with(|| OntologyElement::new(subject, kind));
    }

    for triple in triples {
        let is_label = triple.has_predicate(RDFS_LABEL);
        if !is_label && !triple.has_predicate(RDFS_COMMENT) {
            continue;
        }
        let (Some(subject), Some(literal)) = (triple.subject.name(), triple.object.as_literal())
        else {
            continue;
        };
        if let Some(element) = elements.get_mut(subject) {
            let slot = if is_label {
                &mut element.label
            } else {
                &mut element.comment
            };
            if slot.is_none() {
                *slot = Some(literal.lexical.clone());
            }
        }
    }

    elements
}

fn references(
    triples: &[Triple],
    declared: &BTreeMap<String, OntologyElement>,
) -> Vec<ElementRef> {
    let mut found: BTreeMap<String, ElementRef> = BTreeMap::new();
    let mut note = |term: &Term, kind: ElementKind| {
        let Some(name) = term.name() else {
            return;
        };
        if is_vocabulary(name) || declared.contains_key(name) {
            return;
        }
        found
            .entry(name.to_string())
            .and_modify(|r| r.kind = r.kind.min(kind))
            .or_insert_with(|| ElementRef {
                iri: name.to_string(),
                kind,
                resolved: term.is_resolved(),
            });
    };

    for triple in triples {
        if triple.has_predicate(RDF_TYPE) {
            note(&triple.object, ElementKind::Class);
        } else {
            let kind = if triple.object.is_literal() {
                ElementKind::DatatypeProperty
            } else {
                ElementKind::ObjectProperty
            };
            note(&triple.predicate, kind);
        }
    }

    found.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONTOLOGY: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix : <http://ex.org/onto#> .

        :Person a owl:Class ;
            rdfs:label "Person" ;
            rdfs:label "Human" ;
            rdfs:comment "A human being" .
        :hasName a owl:DatatypeProperty ; rdfs:range xsd:string .
        :knows a owl:ObjectProperty, owl:SymmetricProperty .
        :ancestorOf a owl:TransitiveProperty .
        :bob a owl:NamedIndividual, :Person .
        :Weird a owl:Class, owl:ObjectProperty .
    "#;

    const MICROTHEORY: &str = r#"
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix : <http://ex.org/onto#> .

        :alice a :Person ;
            :hasName "Alice" ;
            :knows :carol .
        :LocalThing a owl:Class .
        :carol a :LocalThing .
    "#;

    fn ns(local: &str) -> String {
        format!("http://ex.org/onto#{}", local)
    }

    #[test]
    fn test_declarations() {
        let elements = DependencyExtractor::new().declarations(ONTOLOGY);
        let kinds: Vec<(String, ElementKind)> =
            elements.iter().map(|e| (e.iri.clone(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (ns("Person"), ElementKind::Class),
                (ns("Weird"), ElementKind::Class),
                (ns("ancestorOf"), ElementKind::ObjectProperty),
                (ns("bob"), ElementKind::Individual),
                (ns("hasName"), ElementKind::DatatypeProperty),
                (ns("knows"), ElementKind::ObjectProperty),
            ]
        );

        let person = &elements[0];
        assert_eq!(person.label.as_deref(), Some("Person"));
        assert_eq!(person.comment.as_deref(), Some("A human being"));
    }

    #[test]
    fn test_references_exclude_local_and_vocabulary() {
        let refs = DependencyExtractor::new().references(MICROTHEORY);
        assert_eq!(
            refs,
            vec![
                ElementRef::new(ns("Person"), ElementKind::Class),
                ElementRef::new(ns("hasName"), ElementKind::DatatypeProperty),
                ElementRef::new(ns("knows"), ElementKind::ObjectProperty),
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = DependencyExtractor::new();
        assert_eq!(extractor.references(MICROTHEORY), extractor.references(MICROTHEORY));
        assert_eq!(extractor.declarations(ONTOLOGY), extractor.declarations(ONTOLOGY));
    }

    #[test]
    fn test_empty_content() {
        let extraction = DependencyExtractor::new().extract("");
        assert!(extraction.references.is_empty());
        assert!(extraction.declarations.is_empty());
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_undeclared_prefix_is_flagged() {
        let extraction = DependencyExtractor::new().extract(
            "@prefix : <http://ex.org/onto#> .\n:alice a foo:Robot ; foo:serial \"42\" .",
        );
        assert_eq!(extraction.unresolved, vec!["foo:Robot", "foo:serial"]);
        assert_eq!(
            extraction.references,
            vec![
                ElementRef {
                    iri: "foo:Robot".into(),
                    kind: ElementKind::Class,
                    resolved: false
                },
                ElementRef {
                    iri: "foo:serial".into(),
                    kind: ElementKind::DatatypeProperty,
                    resolved: false
                },
            ]
        );
    }

    #[test]
    fn test_partial_results_survive_bad_statements() {
        let extraction = DependencyExtractor::new().extract(
            r#"
            @prefix : <http://ex.org/onto#> .
            :alice a :Person .
            :oops :hasName .
            :alice :hasName "Alice" .
            "#,
        );
        assert_eq!(extraction.references.len(), 2);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.triple_count, 2);
    }
}
