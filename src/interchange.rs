use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::assign_generations;
use crate::graph::{EdgeKind, FamilyGraph, Gender, Person, PersonId};

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("duplicate person id in input: {0}")]
    DuplicateId(PersonId),
}

/// One person of the reference interchange document. Relation lists may be
/// asymmetric in the input; building the graph unions them into the
/// symmetric store form. Sibling lists are accepted but re-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_order: Option<u32>,
    #[serde(default)]
    pub parents: Vec<PersonId>,
    #[serde(default)]
    pub children: Vec<PersonId>,
    #[serde(default)]
    pub spouses: Vec<PersonId>,
    #[serde(default)]
    pub siblings: Vec<PersonId>,
}

/// Input document: the person list plus the designated viewer id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyFile {
    pub people: Vec<PersonRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<PersonId>,
}

/// Builds a store from interchange records: inserts everyone first, then
/// unions the declared relations. References to ids absent from the input
/// are dropped silently (the store's no-op failure semantics); a repeated
/// id is a hard input error. Siblings and generations are derived before
/// returning, so the graph is immediately readable.
pub fn graph_from_records(records: &[PersonRecord]) -> Result<FamilyGraph, InterchangeError> {
    let mut graph = FamilyGraph::new();
    for record in records {
        let mut person = Person::new(record.id.clone(), record.name.clone(), record.gender);
        person.member_id = record.member_id.clone();
        person.age = record.age;
        person.birth_order = record.birth_order;
        if !graph.insert_person(person) {
            return Err(InterchangeError::DuplicateId(record.id.clone()));
        }
    }
    for record in records {
        for parent in &record.parents {
            graph.add_relation(parent, &record.id, EdgeKind::ParentChild);
        }
        for child in &record.children {
            graph.add_relation(&record.id, child, EdgeKind::ParentChild);
        }
        for spouse in &record.spouses {
            graph.add_relation(&record.id, spouse, EdgeKind::Spouse);
        }
    }
    graph.rebuild_siblings();
    assign_generations(&mut graph);
    Ok(graph)
}

/// Inverse of [`graph_from_records`], in id order.
pub fn records_from_graph(graph: &FamilyGraph) -> Vec<PersonRecord> {
    graph
        .people
        .values()
        .map(|person| PersonRecord {
            id: person.id.clone(),
            member_id: person.member_id.clone(),
            name: person.name.clone(),
            gender: person.gender,
            age: person.age,
            birth_order: person.birth_order,
            parents: person.parents.iter().cloned().collect(),
            children: person.children.iter().cloned().collect(),
            spouses: person.spouses.iter().cloned().collect(),
            siblings: person.siblings.iter().cloned().collect(),
        })
        .collect()
}
