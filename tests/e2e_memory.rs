//! The Person/hasName scenario end to end over the in-memory backend.

use ontodeps::config::Config;
use ontodeps::context::Context;
use ontodeps::models::{ElementKind, ValidationStatus};
use ontodeps::services::{
    ChangeDetectionOutcome, ChangeDetector, DependencyService, MicrotheoryService,
    OntologyService, ValidationService,
};

const GRAPH: &str = "http://ex.org/onto";
const PERSON: &str = "http://ex.org/onto#Person";
const HAS_NAME: &str = "http://ex.org/onto#hasName";

const ONTOLOGY_V1: &str = r#"
@prefix : <http://ex.org/onto#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

:Person a owl:Class ; rdfs:label "Person" .
:hasName a owl:DatatypeProperty ; rdfs:label "has name" .
"#;

const ONTOLOGY_V2: &str = r#"
@prefix : <http://ex.org/onto#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

:Person a owl:Class ; rdfs:label "Person" .
"#;

const ONTOLOGY_V3: &str = r#"
@prefix : <http://ex.org/onto#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

:Person a owl:Class ; rdfs:label "Human" .
"#;

const MICROTHEORY: &str = r#"
@prefix : <http://ex.org/onto#> .
:alice a :Person ;
    :hasName "Alice" .
"#;

struct Services {
    microtheories: MicrotheoryService,
    dependencies: DependencyService,
    validation: ValidationService,
    ontology: OntologyService,
    detector: ChangeDetector,
}

fn services() -> Services {
    let ctx = Context::in_memory(Config::in_memory());
    Services {
        microtheories: ctx.resolve(),
        dependencies: ctx.resolve(),
        validation: ctx.resolve(),
        ontology: ctx.resolve(),
        detector: ctx.resolve(),
    }
}

fn completed(outcome: &ChangeDetectionOutcome) -> &ontodeps::models::ChangeReport {
    match outcome {
        ChangeDetectionOutcome::Completed(report) => report,
        ChangeDetectionOutcome::Skipped { reason } => panic!("detection skipped: {}", reason),
    }
}

#[tokio::test]
async fn test_deleting_a_property_breaks_its_microtheory() {
    let s = services();

    let first = s.ontology.save(GRAPH, ONTOLOGY_V1).await.unwrap();
    assert_eq!(completed(&first.change_detection).changes.added.len(), 2);

    let saved = s
        .microtheories
        .create("alice-basics", GRAPH, MICROTHEORY)
        .await
        .unwrap();
    let mt = saved.microtheory.id.clone();
    let refs: Vec<(&str, ElementKind)> = saved
        .dependencies
        .dependencies
        .iter()
        .map(|r| (r.iri.as_str(), r.kind))
        .collect();
    assert_eq!(
        refs,
        vec![
            (PERSON, ElementKind::Class),
            (HAS_NAME, ElementKind::DatatypeProperty)
        ]
    );

    let summary = s.validation.validate(&mt).await.unwrap();
    assert_eq!(summary.validation_status, ValidationStatus::Complete);
    assert_eq!(summary.valid_dependencies, 2);

    let second = s.ontology.save(GRAPH, ONTOLOGY_V2).await.unwrap();
    let report = completed(&second.change_detection);
    assert!(report.changes.deleted.contains(HAS_NAME));
    assert!(report.changes.modified.is_empty());
    assert_eq!(report.impact.impact[HAS_NAME], vec![mt.clone()]);
    assert_eq!(report.impact.affected_microtheories, vec![mt.clone()]);
    assert!(second.change_event_id.is_some());

    let summary = s.validation.validate(&mt).await.unwrap();
    assert_eq!(summary.validation_status, ValidationStatus::Incomplete);
    assert_eq!(summary.total_dependencies, 2);
    assert_eq!(summary.invalid_dependencies, 1);
    assert_eq!(summary.broken_references[0].iri, HAS_NAME);
    assert_eq!(summary.broken_references[0].reason, "not found");

    let rows = s.dependencies.get_dependencies(&mt).await.unwrap();
    let has_name = rows.iter().find(|d| d.element_iri == HAS_NAME).unwrap();
    assert!(!has_name.is_valid);
    assert!(has_name.last_validated_at.is_some());

    let history = s.ontology.history(GRAPH, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].deleted, vec![HAS_NAME]);
    assert_eq!(history[0].affected_microtheories, vec![mt.clone()]);
}

#[tokio::test]
async fn test_relabel_is_a_modification() {
    let s = services();
    s.ontology.save(GRAPH, ONTOLOGY_V2).await.unwrap();
    let mt = s
        .microtheories
        .create("alice", GRAPH, MICROTHEORY)
        .await
        .unwrap()
        .microtheory
        .id;

    let preview = s.ontology.preview(GRAPH, ONTOLOGY_V3).await.unwrap();
    assert!(preview.changes.modified.contains(PERSON));
    assert_eq!(preview.impact.affected_microtheories, vec![mt]);

    let unchanged = s.ontology.preview(GRAPH, ONTOLOGY_V2).await.unwrap();
    assert!(unchanged.changes.is_empty());
}

#[tokio::test]
async fn test_fixing_content_restores_validity() {
    let s = services();
    s.ontology.save(GRAPH, ONTOLOGY_V2).await.unwrap();
    let mt = s
        .microtheories
        .create("alice", GRAPH, MICROTHEORY)
        .await
        .unwrap()
        .microtheory
        .id;
    assert_eq!(
        s.validation.validate(&mt).await.unwrap().validation_status,
        ValidationStatus::Incomplete
    );

    let updated = s
        .microtheories
        .update(&mt, "@prefix : <http://ex.org/onto#> . :alice a :Person .")
        .await
        .unwrap();
    assert_eq!(updated.dependencies.recorded.removed, 1);

    let summary = s.validation.validate(&mt).await.unwrap();
    assert_eq!(summary.validation_status, ValidationStatus::Complete);
    assert_eq!(summary.total_dependencies, 1);
    assert!(s.dependencies.find_dependents(HAS_NAME).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_impact_and_delete() {
    let s = services();
    s.ontology.save(GRAPH, ONTOLOGY_V1).await.unwrap();
    let a = s.microtheories.create("a", GRAPH, MICROTHEORY).await.unwrap().microtheory.id;
    let b = s
        .microtheories
        .create("b", GRAPH, "@prefix : <http://ex.org/onto#> . :bob a :Person .")
        .await
        .unwrap()
        .microtheory
        .id;

    let impact = s.detector.impact(GRAPH, &[]).await.unwrap();
    let mut expected = vec![a.clone(), b.clone()];
    expected.sort();
    assert_eq!(impact.impact[PERSON], expected);
    assert_eq!(impact.impact[HAS_NAME], vec![a.clone()]);

    s.microtheories.delete(&a).await.unwrap();
    assert_eq!(s.dependencies.find_dependents(PERSON).await.unwrap(), vec![b]);
}
