//! RETURN column extraction for AGE's `cypher()` column list.
//!
//! ```
//! use ontodeps::graph::extract_return_columns;
//!
//! let columns = extract_return_columns(
//!     "MATCH (d:Dependency) RETURN d.element_iri AS iri, d.is_valid ORDER BY iri",
//! )
//! .unwrap();
//! assert_eq!(columns, vec!["iri", "d.is_valid"]);
//! ```

use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "graph/cypher.pest"]
struct CypherParser;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid Cypher syntax: {0}")]
    InvalidSyntax(String),

    #[error("statement has no RETURN clause")]
    NoReturnClause,

    #[error("RETURN * is not supported; list the columns explicitly")]
    ReturnStarNotSupported,
}

/// Column names of the last top-level RETURN.
///
/// Aliased items (`expr AS alias`) use the alias; anything else uses the
/// expression text as written.
pub fn extract_return_columns(query: &str) -> Result<Vec<String>, ParseError> {
    let cypher = CypherParser::parse(Rule::Cypher, query)
        .map_err(|e| ParseError::InvalidSyntax(e.to_string()))?
        .next()
        .ok_or(ParseError::NoReturnClause)?;

    let projection = cypher
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::Return)
        .last()
        .and_then(|ret| {
            ret.into_inner()
                .find(|pair| pair.as_rule() == Rule::Projection)
        })
        .ok_or(ParseError::NoReturnClause)?;

    let mut columns = Vec::new();
    for item in projection.into_inner() {
        match item.as_rule() {
            Rule::Star => return Err(ParseError::ReturnStarNotSupported),
            Rule::ProjectionItem => {
                let mut expression = "";
                let mut alias = None;
                for part in item.into_inner() {
                    match part.as_rule() {
                        Rule::Expression => expression = part.as_str(),
                        Rule::Alias => alias = Some(part.as_str().trim_matches('`')),
                        _ => {}
                    }
                }
                columns.push(alias.unwrap_or(expression).to_string());
            }
            _ => {}
        }
    }

    if columns.is_empty() {
        return Err(ParseError::NoReturnClause);
    }
    Ok(columns)
}
