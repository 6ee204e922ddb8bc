//! Event synthesis: relation events, creation events, date-anchored
//! proposition events, and the drop policies around them.

use biograph::canonical::assign;
use biograph::layers::{
    AnnotationBundle, EntityAnnotation, Proposition, PropositionArgument, RelationAnnotation,
};
use biograph::unify::unify;
use biograph::universal::UniversalIndex;
use biograph::vocab::Vocabularies;
use biograph::{events, Event};
use std::collections::{BTreeMap, HashMap};

fn entity(id: &str, category: &str, form: &str, start: usize, end: usize) -> EntityAnnotation {
    EntityAnnotation {
        id: id.into(),
        category: category.into(),
        surface_form: form.into(),
        location_start: start,
        location_end: end,
        sentence_id: None,
        method: None,
    }
}

fn relation(id: &str, subj: &str, obj: &str, value: &str, obj_form: &str) -> RelationAnnotation {
    RelationAnnotation {
        relation_id: id.into(),
        subject_id: subj.into(),
        object_id: obj.into(),
        relation_value: value.into(),
        surface_form_subj: String::new(),
        surface_form_obj: obj_form.into(),
        sentence_id: None,
        method: None,
    }
}

fn run(bundle: &AnnotationBundle, subject: &str) -> (Vec<Event>, biograph::CanonicalSet, Vocabularies) {
    let index = UniversalIndex::build(bundle);
    let unified = unify(&index, &bundle.coreference, &HashMap::new());
    let mut canon = assign(&unified, subject, &HashMap::new());
    let mut vocab = Vocabularies::default();
    let events = events::synthesize(
        &index,
        &unified,
        &mut canon,
        &mut vocab,
        subject,
        &HashMap::new(),
    );
    (events, canon, vocab)
}

#[test]
fn born_in_relation_becomes_one_event_with_inverse_role() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "LOC", "Nuremberg", 18, 27),
        ],
        relations: vec![relation("r0", "e0", "e1", "born_in", "Nuremberg")],
        ..Default::default()
    };
    let (events, canon, vocab) = run(&bundle, "duerer");

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind, "event-kind-born_in");
    assert_eq!(event.id, "duerer-pr-ev-001");
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pr-001" && r.role == "role-born_in"));
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pl-001" && r.role == "role-place_of_birth"));

    // Both endpoints carry the back-pointer.
    let person = canon.get("ent_1").unwrap();
    assert!(person
        .relations
        .iter()
        .any(|r| r.event == event.id && r.role == "role-born_in"));
    let place = canon.get("ent_2").unwrap();
    assert!(place
        .relations
        .iter()
        .any(|r| r.event == event.id && r.role == "role-place_of_birth"));

    // Vocabulary side effects.
    let export = vocab.export();
    assert!(export.event_kind.iter().any(|e| e.id == "event-kind-born_in"));
    assert!(export.role.iter().any(|e| e.id == "role-born_in"));
    assert!(export.role.iter().any(|e| e.id == "role-place_of_birth"));
}

#[test]
fn relation_without_registered_inverse_uses_unk() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "ORG", "the guild", 10, 19),
        ],
        relations: vec![relation("r0", "e0", "e1", "member_of", "the guild")],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
    assert!(events[0].relations.iter().any(|r| r.role == "role-unk"));
    assert!(events[0].relations.iter().any(|r| r.role == "role-member_of"));
}

#[test]
fn relation_duplicated_on_both_endpoints_yields_one_event() {
    // The universal index attaches the relation to both endpoint records, so
    // both unified entities carry it; synthesis must dedup by relation id.
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "PER", "Agnes", 10, 15),
        ],
        relations: vec![relation("r0", "e0", "e1", "married_to", "Agnes")],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
}

#[test]
fn relation_with_untyped_endpoint_is_silently_dropped() {
    // NORP is outside the category table, so the object never becomes
    // canonical and the relation produces no event at all.
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "NORP", "German", 10, 16),
        ],
        relations: vec![relation("r0", "e0", "e1", "born_in", "German")],
        ..Default::default()
    };
    let (events, canon, _) = run(&bundle, "duerer");
    assert!(events.is_empty());
    // The subject entity exists but gained no event pointer.
    assert!(canon.get("ent_1").unwrap().relations.is_empty());
}

#[test]
fn event_relations_reference_existing_entities_only() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "LOC", "Nuremberg", 18, 27),
            entity("e2", "PER", "Agnes Frey", 40, 50),
            entity("e3", "NORP", "German", 60, 66),
        ],
        relations: vec![
            relation("r0", "e0", "e1", "born_in", "Nuremberg"),
            relation("r1", "e0", "e2", "married_to", "Agnes Frey"),
            relation("r2", "e0", "e3", "child_of", "German"),
        ],
        ..Default::default()
    };
    let (events, canon, _) = run(&bundle, "duerer");
    let entity_ids: Vec<String> = canon.into_entities().into_iter().map(|e| e.id).collect();
    for event in &events {
        for relation in &event.relations {
            assert!(
                entity_ids.contains(&relation.entity),
                "event {} points at unknown entity {}",
                event.id,
                relation.entity
            );
        }
    }
    assert_eq!(events.len(), 2);
}

#[test]
fn cultural_object_yields_creation_event() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "WORK_OF_ART", "Melencolia I", 20, 32),
        ],
        ..Default::default()
    };
    let (events, canon, vocab) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind, "event-kind-creation");
    assert_eq!(event.label.default, "Melencolia I");
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pr-001" && r.role == "role-was_creator"));
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-ob-001" && r.role == "role-object_created"));
    assert!(vocab
        .export()
        .event_kind
        .iter()
        .any(|e| e.id == "event-kind-creation"));
    let creator = canon.get("ent_1").unwrap();
    assert!(creator.relations.iter().any(|r| r.role == "role-was_creator"));
}

#[test]
fn cultural_object_without_main_subject_yields_no_creation() {
    let bundle = AnnotationBundle {
        entities: vec![entity("e0", "WORK_OF_ART", "Melencolia I", 20, 32)],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert!(events.is_empty());
}

fn proposition(
    predicate: &str,
    start: usize,
    end: usize,
    args: &[(&str, &str)],
) -> Proposition {
    Proposition {
        predicate_surface_form: predicate.into(),
        predicate_sense: None,
        location_start: start,
        location_end: end,
        sentence_id: None,
        arguments: args
            .iter()
            .map(|(form, label)| PropositionArgument {
                surface_form: (*form).to_string(),
                label: (*label).to_string(),
            })
            .collect(),
        method: None,
    }
}

#[test]
fn main_subject_date_fact_surfaces_unconditionally() {
    // No resolvable object entity in the complement, but the subject is the
    // biography's main subject, so the fact still becomes an event.
    let bundle = AnnotationBundle {
        entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
        semantic_roles: vec![proposition(
            "born",
            10,
            14,
            &[("Dürer", "ARG1"), ("in 1471", "ARGM-TMP")],
        )],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.start_date.as_deref(), Some("1471-01-01"));
    assert_eq!(event.end_date, None);
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pr-001" && r.role == "role-born"));
}

#[test]
fn date_fact_with_known_entity_in_complement_materializes() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "LOC", "Venice", 30, 36),
        ],
        semantic_roles: vec![proposition(
            "traveled",
            10,
            18,
            &[
                ("Dürer", "ARG0"),
                ("to Venice and beyond", "ARG2"),
                ("1505", "ARGM-TMP"),
            ],
        )],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.start_date.as_deref(), Some("1505-01-01"));
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pl-001" && r.role == "role-unk"));
    assert!(event
        .relations
        .iter()
        .any(|r| r.entity == "duerer-pr-001" && r.role == "role-traveled"));
}

#[test]
fn unparseable_date_drops_the_triple() {
    let bundle = AnnotationBundle {
        entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
        semantic_roles: vec![proposition(
            "born",
            10,
            14,
            &[("Dürer", "ARG1"), ("some time later", "ARGM-TMP")],
        )],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert!(events.is_empty());
}

#[test]
fn date_fact_about_unknown_subject_without_matches_is_dropped() {
    let bundle = AnnotationBundle {
        entities: vec![entity("e0", "PER", "Dürer", 0, 5)],
        semantic_roles: vec![proposition(
            "crowned",
            10,
            17,
            &[("Maximilian", "ARG1"), ("1508", "ARGM-TMP")],
        )],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert!(events.is_empty());
}

#[test]
fn year_range_date_fact_carries_both_dates() {
    let bundle = AnnotationBundle {
        entities: vec![
            entity("e0", "PER", "Dürer", 0, 5),
            entity("e1", "LOC", "Venice", 30, 36),
        ],
        semantic_roles: vec![proposition(
            "stayed",
            10,
            16,
            &[
                ("Dürer", "ARG0"),
                ("in Venice", "ARG2"),
                ("1505-1507", "ARGM-TMP"),
            ],
        )],
        ..Default::default()
    };
    let (events, _, _) = run(&bundle, "duerer");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start_date.as_deref(), Some("1505-01-01"));
    assert_eq!(events[0].end_date.as_deref(), Some("1507-12-31"));
}
