//! Offline ontology diff command.

use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::extract::DependencyExtractor;
use crate::models::{ChangeSet, OntologyElement};

use super::App;

impl App {
    /// Print the change set between two ontology files. Individuals are
    /// included; there is no stored snapshot to filter against.
    pub fn run_diff(&self, old: &Path, new: &Path) -> Result<()> {
        let old = declarations(old)?;
        let new = declarations(new)?;
        super::print_json(&ChangeSet::between(&old, &new))
    }
}

fn declarations(path: &Path) -> Result<Vec<OntologyElement>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(DependencyExtractor::new().declarations(&content))
}
