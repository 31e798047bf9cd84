//! Turtle parser built on the pest grammar in `turtle.pest`.

use std::collections::BTreeSet;

use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::prefix::{resolve_iri, PrefixMap};
use super::term::{Literal, Term, Triple};
use super::vocab::{
    RDF_FIRST, RDF_LANG_STRING, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL,
    XSD_DOUBLE, XSD_INTEGER, XSD_STRING,
};
use super::{Diagnostic, ParsedDocument, TripleParser};

#[derive(Parser)]
#[grammar = "rdf/turtle.pest"]
struct TurtleGrammar;

/// Turtle (and therefore N-Triples) with statement-level recovery.
///
/// # Example
///
/// ```
/// use ontodeps::rdf::{TripleParser, TurtleParser};
///
/// let doc = TurtleParser.parse("@prefix : <http://ex.org/onto#> .\n:alice a :Person .");
/// assert_eq!(doc.triples.len(), 1);
/// assert_eq!(doc.triples[0].object.as_iri(), Some("http://ex.org/onto#Person"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleParser;

impl TripleParser for TurtleParser {
    fn parse(&self, text: &str) -> ParsedDocument {
        let document = match TurtleGrammar::parse(Rule::document, text) {
            Ok(mut pairs) => match pairs.next() {
                Some(document) => document,
                None => return ParsedDocument::default(),
            },
            Err(err) => {
                let (line, column) = match err.line_col {
                    LineColLocation::Pos(pos) | LineColLocation::Span(pos, _) => pos,
                };
                return ParsedDocument {
                    diagnostics: vec![Diagnostic::new(
                        line,
                        column,
                        format!("unparseable document: {}", err.variant.message()),
                    )],
                    ..Default::default()
                };
            }
        };

        let mut walker = Walker::new(declared_prefixes(document.clone()));
        for pair in document.into_inner() {
            walker.top_level(pair);
        }
        walker.finish()
    }
}

/// First binding of every prefix anywhere in the document.
///
/// Used only to resolve names that appear before their `@prefix` line.
fn declared_prefixes(document: Pair<'_, Rule>) -> PrefixMap {
    let mut map = PrefixMap::new();
    for pair in document.into_inner() {
        if !matches!(pair.as_rule(), Rule::prefix_decl | Rule::sparql_prefix) {
            continue;
        }
        if let Some((prefix, namespace)) = prefix_binding(pair, None) {
            if !map.contains(&prefix) {
                map.bind(prefix, namespace);
            }
        }
    }
    map
}

fn prefix_binding(pair: Pair<'_, Rule>, base: Option<&str>) -> Option<(String, String)> {
    let mut prefix = None;
    let mut namespace = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::PNAME_NS => prefix = Some(inner.as_str().trim_end_matches(':').to_string()),
            Rule::IRIREF => namespace = Some(iriref(inner.as_str(), base)),
            _ => {}
        }
    }
    Some((prefix?, namespace?))
}

fn iriref(raw: &str, base: Option<&str>) -> String {
    let body = raw
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    resolve_iri(base, &unescape(body))
}

fn line_col(pair: &Pair<'_, Rule>) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

struct Walker {
    prefixes: PrefixMap,
    declared_anywhere: PrefixMap,
    base: Option<String>,
    triples: Vec<Triple>,
    unresolved: BTreeSet<String>,
    reported_prefixes: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
    blank_ids: usize,
}

impl Walker {
    fn new(declared_anywhere: PrefixMap) -> Self {
        Self {
            prefixes: PrefixMap::new(),
            declared_anywhere,
            base: None,
            triples: Vec::new(),
            unresolved: BTreeSet::new(),
            reported_prefixes: BTreeSet::new(),
            diagnostics: Vec::new(),
            blank_ids: 0,
        }
    }

    fn finish(self) -> ParsedDocument {
        ParsedDocument {
            triples: self.triples,
            prefixes: self.prefixes,
            base: self.base,
            unresolved: self.unresolved,
            diagnostics: self.diagnostics,
        }
    }

    fn top_level(&mut self, pair: Pair<'_, Rule>) {
        match pair.as_rule() {
            Rule::prefix_decl | Rule::sparql_prefix => {
                if let Some((prefix, namespace)) = prefix_binding(pair, self.base.as_deref()) {
                    self.prefixes.bind(prefix, namespace);
                }
            }
            Rule::base_decl | Rule::sparql_base => {
                if let Some(iri) = pair.into_inner().find(|p| p.as_rule() == Rule::IRIREF) {
                    self.base = Some(iriref(iri.as_str(), self.base.as_deref()));
                }
            }
            Rule::statement => {
                if let Some(triples) = pair.into_inner().next() {
                    self.triples_block(triples);
                }
            }
            Rule::junk => {
                let (line, column) = line_col(&pair);
                self.diagnostics.push(Diagnostic::new(
                    line,
                    column,
                    format!("skipped malformed statement: {}", snippet(pair.as_str())),
                ));
            }
            _ => {}
        }
    }

    fn triples_block(&mut self, pair: Pair<'_, Rule>) {
        let mut parts = pair.into_inner();
        let Some(first) = parts.next() else {
            return;
        };
        let subject = match first.as_rule() {
            Rule::subject => match first.into_inner().next() {
                Some(node) => self.node(node),
                None => return,
            },
            _ => self.node(first),
        };
        if let Some(list) = parts.next() {
            self.predicate_object_list(&subject, list);
        }
    }

    fn predicate_object_list(&mut self, subject: &Term, pair: Pair<'_, Rule>) {
        for predicate_object in pair.into_inner() {
            let mut parts = predicate_object.into_inner();
            let (Some(verb), Some(objects)) = (parts.next(), parts.next()) else {
                continue;
            };
            let predicate = match verb.into_inner().next() {
                Some(iri) if iri.as_rule() == Rule::iri => self.iri(iri),
                _ => Term::iri(RDF_TYPE),
            };
            for object in objects.into_inner() {
                let object = match object.into_inner().next() {
                    Some(node) => self.node(node),
                    None => continue,
                };
                self.triples
                    .push(Triple::new(subject.clone(), predicate.clone(), object));
            }
        }
    }

    fn node(&mut self, pair: Pair<'_, Rule>) -> Term {
        match pair.as_rule() {
            Rule::iri => self.iri(pair),
            Rule::blank_node => self.blank_node(pair),
            Rule::collection => self.collection(pair),
            Rule::blank_node_property_list => {
                let node = self.fresh_blank();
                if let Some(list) = pair.into_inner().next() {
                    self.predicate_object_list(&node, list);
                }
                node
            }
            Rule::literal => self.literal(pair),
            _ => self.fresh_blank(),
        }
    }

    fn iri(&mut self, pair: Pair<'_, Rule>) -> Term {
        let Some(inner) = pair.into_inner().next() else {
            return self.fresh_blank();
        };
        match inner.as_rule() {
            Rule::IRIREF => Term::Iri(iriref(inner.as_str(), self.base.as_deref())),
            _ => self.prefixed_name(&inner),
        }
    }

    fn prefixed_name(&mut self, pair: &Pair<'_, Rule>) -> Term {
        let text = pair.as_str();
        let Some((prefix, local)) = text.split_once(':') else {
            return Term::Unresolved(text.to_string());
        };
        let local = unescape_local(local);

        if let Some(iri) = self.prefixes.expand(prefix, &local) {
            return Term::Iri(iri);
        }
        if let Some(iri) = self.declared_anywhere.expand(prefix, &local) {
            self.report_prefix(pair, prefix, "used before its declaration");
            return Term::Iri(iri);
        }

        self.report_prefix(pair, prefix, "is not declared");
        self.unresolved.insert(text.to_string());
        Term::Unresolved(text.to_string())
    }

    fn report_prefix(&mut self, pair: &Pair<'_, Rule>, prefix: &str, problem: &str) {
        if self.reported_prefixes.insert(prefix.to_string()) {
            let (line, column) = line_col(pair);
            self.diagnostics.push(Diagnostic::new(
                line,
                column,
                format!("prefix `{}:` {}", prefix, problem),
            ));
        }
    }

    fn blank_node(&mut self, pair: Pair<'_, Rule>) -> Term {
        match pair.into_inner().next() {
            Some(label) if label.as_rule() == Rule::BLANK_NODE_LABEL => {
                let text = label.as_str();
                Term::Blank(text.strip_prefix("_:").unwrap_or(text).to_string())
            }
            _ => self.fresh_blank(),
        }
    }

    fn fresh_blank(&mut self) -> Term {
        self.blank_ids += 1;
        // `#` cannot appear in a blank node label, so these never collide.
        Term::Blank(format!("genid#{}", self.blank_ids))
    }

    fn collection(&mut self, pair: Pair<'_, Rule>) -> Term {
        let items: Vec<Term> = pair
            .into_inner()
            .filter_map(|object| object.into_inner().next())
            .map(|node| self.node(node))
            .collect();
        if items.is_empty() {
            return Term::iri(RDF_NIL);
        }

        let head = self.fresh_blank();
        let mut cell = head.clone();
        let last = items.len() - 1;
        for (i, item) in items.into_iter().enumerate() {
            self.triples
                .push(Triple::new(cell.clone(), Term::iri(RDF_FIRST), item));
            let next = if i == last {
                Term::iri(RDF_NIL)
            } else {
                self.fresh_blank()
            };
            self.triples
                .push(Triple::new(cell, Term::iri(RDF_REST), next.clone()));
            cell = next;
        }
        head
    }

    fn literal(&mut self, pair: Pair<'_, Rule>) -> Term {
        let Some(inner) = pair.into_inner().next() else {
            return Term::Literal(Literal::plain(""));
        };
        match inner.as_rule() {
            Rule::numeric => {
                let text = inner.as_str();
                let datatype = if text.contains(|c| c == 'e' || c == 'E') {
                    XSD_DOUBLE
                } else if text.contains('.') {
                    XSD_DECIMAL
                } else {
                    XSD_INTEGER
                };
                Term::Literal(Literal {
                    lexical: text.to_string(),
                    datatype: Some(datatype.to_string()),
                    language: None,
                })
            }
            Rule::boolean => Term::Literal(Literal {
                lexical: inner.as_str().to_string(),
                datatype: Some(XSD_BOOLEAN.to_string()),
                language: None,
            }),
            _ => self.rdf_literal(inner),
        }
    }

    fn rdf_literal(&mut self, pair: Pair<'_, Rule>) -> Term {
        let mut lexical = String::new();
        let mut datatype = None;
        let mut language = None;
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::string => lexical = string_value(part),
                Rule::LANGTAG => {
                    language = Some(part.as_str().trim_start_matches('@').to_ascii_lowercase())
                }
                Rule::iri => datatype = self.iri(part).name().map(str::to_string),
                _ => {}
            }
        }
        let datatype = match (&language, datatype) {
            (Some(_), _) => RDF_LANG_STRING.to_string(),
            (None, Some(datatype)) => datatype,
            (None, None) => XSD_STRING.to_string(),
        };
        Term::Literal(Literal {
            lexical,
            datatype: Some(datatype),
            language,
        })
    }
}

fn string_value(pair: Pair<'_, Rule>) -> String {
    let Some(inner) = pair.into_inner().next() else {
        return String::new();
    };
    let quote_len = match inner.as_rule() {
        Rule::STRING_LITERAL_LONG_QUOTE | Rule::STRING_LITERAL_LONG_SINGLE_QUOTE => 3,
        _ => 1,
    };
    let text = inner.as_str();
    let body = text
        .get(quote_len..text.len().saturating_sub(quote_len))
        .unwrap_or_default();
    unescape(body)
}

/// Decode `ECHAR` and `UCHAR` escapes.
fn unescape(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some(q @ ('"' | '\'' | '\\')) => out.push(q),
            Some(u @ ('u' | 'U')) => {
                let width = if u == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(width).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(u);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Drop the backslash from `PN_LOCAL_ESC` sequences (`ex:a\-b` → `a-b`).
fn unescape_local(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > 60 {
        format!("{}...", flat.chars().take(60).collect::<String>())
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::vocab::{OWL_CLASS, RDFS_LABEL};

    fn parse(text: &str) -> ParsedDocument {
        TurtleParser.parse(text)
    }

    fn objects_of<'a>(doc: &'a ParsedDocument, predicate: &str) -> Vec<&'a Term> {
        doc.triples
            .iter()
            .filter(|t| t.has_predicate(predicate))
            .map(|t| &t.object)
            .collect()
    }

    #[test]
    fn test_prefixed_names_and_rdf_type() {
        let doc = parse(
            r#"
            @prefix owl: <http://www.w3.org/2002/07/owl#> .
            @prefix : <http://ex.org/onto#> .

            :Person a owl:Class .
            "#,
        );
        assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
        assert_eq!(doc.triples.len(), 1);
        let triple = &doc.triples[0];
        assert_eq!(triple.subject, Term::iri("http://ex.org/onto#Person"));
        assert_eq!(triple.predicate, Term::iri(RDF_TYPE));
        assert_eq!(triple.object, Term::iri(OWL_CLASS));
        assert_eq!(doc.prefixes.namespace(""), Some("http://ex.org/onto#"));
    }

    #[test]
    fn test_sparql_style_directives_and_base() {
        let doc = parse(
            r#"
            BASE <http://ex.org/onto/>
            PREFIX ex: <vocab#>
            <alice> ex:knows <bob> .
            "#,
        );
        assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
        let triple = &doc.triples[0];
        assert_eq!(triple.subject, Term::iri("http://ex.org/onto/alice"));
        assert_eq!(triple.predicate, Term::iri("http://ex.org/onto/vocab#knows"));
        assert_eq!(triple.object, Term::iri("http://ex.org/onto/bob"));
    }

    #[test]
    fn test_malformed_statement_is_skipped() {
        let doc = parse(
            r#"
            @prefix : <http://ex.org/onto#> .
            :broken :p .
            :alice a :Person .
            "#,
        );
        assert_eq!(doc.triples.len(), 1);
        assert_eq!(doc.triples[0].subject, Term::iri("http://ex.org/onto#alice"));
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].line, 3);
        assert!(doc.diagnostics[0].message.contains("skipped malformed statement"));
    }

    #[test]
    fn test_undeclared_prefix_stays_unresolved() {
        let doc = parse(":alice a foo:Bar .");
        assert_eq!(doc.triples.len(), 1);
        assert_eq!(doc.triples[0].object, Term::Unresolved("foo:Bar".into()));
        assert!(doc.unresolved.contains("foo:Bar"));
        assert!(doc.unresolved.contains(":alice"));
        assert_eq!(doc.diagnostics.len(), 2);
    }

    #[test]
    fn test_prefix_used_before_declaration() {
        let doc = parse(
            r#"
            :alice a :Person .
            @prefix : <http://ex.org/onto#> .
            "#,
        );
        assert_eq!(doc.triples[0].object, Term::iri("http://ex.org/onto#Person"));
        assert!(doc.unresolved.is_empty());
        assert_eq!(doc.diagnostics.len(), 1);
        assert!(doc.diagnostics[0].message.contains("before its declaration"));
    }

    #[test]
    fn test_literals() {
        let doc = parse(
            r#"
            @prefix : <http://ex.org/onto#> .
            @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
            @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
            :alice rdfs:label "Alice"@en-GB ;
                :age 42 ;
                :height 1.75 ;
                :active true ;
                :born "1990-01-01"^^xsd:date ;
                :bio """Line one.
            She said "hi". Done.""" ;
                :motto 'tab\tquote\'' .
            "#,
        );
        assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
        assert_eq!(doc.triples.len(), 7);

        let label = objects_of(&doc, RDFS_LABEL)[0].as_literal().unwrap();
        assert_eq!(label.lexical, "Alice");
        assert_eq!(label.language.as_deref(), Some("en-gb"));

        let age = objects_of(&doc, "http://ex.org/onto#age")[0].as_literal().unwrap();
        assert_eq!(age.datatype.as_deref(), Some(XSD_INTEGER));
        let height = objects_of(&doc, "http://ex.org/onto#height")[0].as_literal().unwrap();
        assert_eq!(height.datatype.as_deref(), Some(XSD_DECIMAL));
        let active = objects_of(&doc, "http://ex.org/onto#active")[0].as_literal().unwrap();
        assert_eq!(active.datatype.as_deref(), Some(XSD_BOOLEAN));
        let born = objects_of(&doc, "http://ex.org/onto#born")[0].as_literal().unwrap();
        assert_eq!(
            born.datatype.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema#date")
        );
        let bio = objects_of(&doc, "http://ex.org/onto#bio")[0].as_literal().unwrap();
        assert!(bio.lexical.contains("She said \"hi\". Done."));
        let motto = objects_of(&doc, "http://ex.org/onto#motto")[0].as_literal().unwrap();
        assert_eq!(motto.lexical, "tab\tquote'");
    }

    #[test]
    fn test_blank_nodes_and_collections() {
        let doc = parse(
            r#"
            @prefix : <http://ex.org/onto#> .
            :alice :address [ :city "Paris" ] ;
                :likes ( :tea :coffee ) .
            _:x :p :o .
            [] :q :r .
            "#,
        );
        assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
        // address + city, likes + 2x(first, rest), _:x, []
        assert_eq!(doc.triples.len(), 9);
        assert_eq!(objects_of(&doc, RDF_FIRST).len(), 2);
        assert!(objects_of(&doc, RDF_REST).contains(&&Term::iri(RDF_NIL)));
        assert!(doc
            .triples
            .iter()
            .any(|t| t.subject == Term::Blank("x".into())));
    }

    #[test]
    fn test_dots_inside_iris_and_strings_do_not_split_recovery() {
        let doc = parse(
            r#"
            @prefix : <http://ex.org/onto#> .
            :a :p "broken . still broken" :extra .
            :b :p <http://ex.org/v1.#y> garbage .
            :c a :Thing .
            "#,
        );
        assert_eq!(doc.triples.len(), 1);
        assert_eq!(doc.triples[0].subject, Term::iri("http://ex.org/onto#c"));
        assert_eq!(doc.diagnostics.len(), 2);
    }

    #[test]
    fn test_empty_and_comment_only_documents() {
        assert!(parse("").triples.is_empty());
        let doc = parse("# nothing here\n   \n");
        assert!(doc.triples.is_empty());
        assert!(doc.diagnostics.is_empty());
    }
}
