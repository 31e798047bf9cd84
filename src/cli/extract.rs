//! Offline extraction command.

use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde::Serialize;

use crate::extract::DependencyExtractor;
use crate::models::{ElementRef, OntologyElement};
use crate::rdf::Diagnostic;

use super::App;

#[derive(Serialize)]
#[serde(untagged)]
enum Elements {
    Declarations(Vec<OntologyElement>),
    References(Vec<ElementRef>),
}

#[derive(Serialize)]
struct ExtractOutput {
    file: String,
    triples: usize,
    elements: Elements,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl App {
    pub fn run_extract(&self, file: &Path, declarations: bool) -> Result<()> {
        let content = std::fs::read_to_string(file)
            .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
        let extraction = DependencyExtractor::new().extract(&content);
        tracing::debug!(
            file = %file.display(),
            triples = extraction.triple_count,
            diagnostics = extraction.diagnostics.len(),
            "extracted"
        );

        let elements = if declarations {
            Elements::Declarations(extraction.declarations)
        } else {
            Elements::References(extraction.references)
        };
        super::print_json(&ExtractOutput {
            file: file.display().to_string(),
            triples: extraction.triple_count,
            elements,
            unresolved: extraction.unresolved,
            diagnostics: extraction.diagnostics,
        })
    }
}
