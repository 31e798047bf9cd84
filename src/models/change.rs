//! Change sets, impact reports and the change log.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_ulid, OntologyElement};
use crate::rdf::Diagnostic;

/// Difference between two element snapshots of one ontology graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeSet<String>,
}

impl ChangeSet {
    /// Compare snapshots by IRI.
    ///
    /// An element is modified when its label or comment changed and both the
    /// old and new values are non-empty. A kind change alone is not a
    /// modification; renames show up as one deletion plus one addition.
    pub fn between(old: &[OntologyElement], new: &[OntologyElement]) -> Self {
        let old: HashMap<&str, &OntologyElement> =
            old.iter().map(|e| (e.iri.as_str(), e)).collect();
        let new: HashMap<&str, &OntologyElement> =
            new.iter().map(|e| (e.iri.as_str(), e)).collect();

        let mut changes = ChangeSet::default();
        for (iri, after) in &new {
            match old.get(iri) {
                None => {
                    changes.added.insert(iri.to_string());
                }
                Some(before) => {
                    if text_changed(&before.label, &after.label)
                        || text_changed(&before.comment, &after.comment)
                    {
                        changes.modified.insert(iri.to_string());
                    }
                }
            }
        }
        for iri in old.keys() {
            if !new.contains_key(iri) {
                changes.deleted.insert(iri.to_string());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Deleted and modified IRIs: the ones that can break dependents.
    pub fn breaking(&self) -> Vec<String> {
        self.deleted
            .union(&self.modified)
            .cloned()
            .collect()
    }
}

fn text_changed(before: &Option<String>, after: &Option<String>) -> bool {
    match (before.as_deref(), after.as_deref()) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a != b,
        _ => false,
    }
}

/// Which microtheories depend on which changed elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Element IRI → dependent microtheory ids. Every queried IRI is present,
    /// possibly with an empty list.
    pub impact: BTreeMap<String, Vec<String>>,
    /// De-duplicated union of all dependents, sorted.
    pub affected_microtheories: Vec<String>,
}

impl ImpactReport {
    pub fn from_dependents(impact: BTreeMap<String, Vec<String>>) -> Self {
        let affected: BTreeSet<&String> = impact.values().flatten().collect();
        let affected_microtheories = affected.into_iter().cloned().collect();
        Self {
            impact,
            affected_microtheories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.affected_microtheories.is_empty()
    }
}

/// Full result of change detection for one save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeReport {
    pub graph_iri: String,
    #[serde(flatten)]
    pub changes: ChangeSet,
    #[serde(flatten)]
    pub impact: ImpactReport,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Persisted record of one detected change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: String,
    pub graph_iri: String,
    pub recorded_at: DateTime<Utc>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    pub affected_microtheories: Vec<String>,
}

impl ChangeEvent {
    pub fn from_report(report: &ChangeReport) -> Self {
        Self {
            id: generate_ulid(),
            graph_iri: report.graph_iri.clone(),
            recorded_at: Utc::now(),
            added: report.changes.added.iter().cloned().collect(),
            deleted: report.changes.deleted.iter().cloned().collect(),
            modified: report.changes.modified.iter().cloned().collect(),
            affected_microtheories: report.impact.affected_microtheories.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementKind;

    fn class(iri: &str) -> OntologyElement {
        OntologyElement::new(iri, ElementKind::Class)
    }

    #[test]
    fn test_added_and_deleted() {
        let old = vec![class("ex:A"), class("ex:B")];
        let new = vec![class("ex:B"), class("ex:C")];
        let changes = ChangeSet::between(&old, &new);
        assert_eq!(changes.added, BTreeSet::from(["ex:C".to_string()]));
        assert_eq!(changes.deleted, BTreeSet::from(["ex:A".to_string()]));
        assert!(changes.modified.is_empty());
    }

    #[test]
    fn test_identical_labels_are_never_modified() {
        let old = vec![class("ex:A").with_label("Person").with_comment("A human")];
        let new = old.clone();
        assert!(ChangeSet::between(&old, &new).is_empty());
    }

    #[test]
    fn test_label_change_is_modified() {
        let old = vec![class("ex:A").with_label("Person")];
        let new = vec![class("ex:A").with_label("Human")];
        let changes = ChangeSet::between(&old, &new);
        assert_eq!(changes.modified, BTreeSet::from(["ex:A".to_string()]));
        assert_eq!(changes.breaking(), vec!["ex:A".to_string()]);
    }

    #[test]
    fn test_added_or_removed_label_is_not_modified() {
        let old = vec![class("ex:A"), class("ex:B").with_comment("kept")];
        let new = vec![class("ex:A").with_label("Now labelled"), class("ex:B")];
        assert!(ChangeSet::between(&old, &new).is_empty());
    }

    #[test]
    fn test_kind_change_alone_is_not_modified() {
        let old = vec![class("ex:p")];
        let new = vec![OntologyElement::new("ex:p", ElementKind::ObjectProperty)];
        assert!(ChangeSet::between(&old, &new).is_empty());
    }

    #[test]
    fn test_impact_report_deduplicates() {
        let impact = BTreeMap::from([
            ("ex:A".to_string(), vec!["mt2".to_string(), "mt1".to_string()]),
            ("ex:B".to_string(), vec!["mt1".to_string()]),
            ("ex:C".to_string(), vec![]),
        ]);
        let report = ImpactReport::from_dependents(impact);
        assert_eq!(report.affected_microtheories, vec!["mt1", "mt2"]);
        assert_eq!(report.impact.len(), 3);
    }

    #[test]
    fn test_report_serializes_flat() {
        let report = ChangeReport {
            graph_iri: "http://ex.org/onto".into(),
            changes: ChangeSet {
                deleted: BTreeSet::from(["ex:A".to_string()]),
                ..Default::default()
            },
            impact: ImpactReport::from_dependents(BTreeMap::from([(
                "ex:A".to_string(),
                vec!["mt1".to_string()],
            )])),
            diagnostics: vec![],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deleted"], serde_json::json!(["ex:A"]));
        assert_eq!(json["affected_microtheories"], serde_json::json!(["mt1"]));
        assert_eq!(json["impact"]["ex:A"], serde_json::json!(["mt1"]));
        assert!(json.get("diagnostics").is_none());
    }
}
