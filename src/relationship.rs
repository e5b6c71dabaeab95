use std::collections::{BTreeSet, VecDeque};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::graph::{FamilyGraph, Gender, Person, PersonId};

/// Code returned when viewer and target are the same person.
pub const SELF_CODE: &str = "SELF";
/// Code returned when no relation path exists between two valid people.
pub const UNRELATED_CODE: &str = "UNRELATED";
/// Code returned when the viewer or target id is absent from the store.
pub const UNKNOWN_CODE: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Parent,
    Child,
    Spouse,
    Sibling,
}

/// One hop of a relation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationStep {
    pub kind: RelationKind,
    pub from_id: PersonId,
    pub to_id: PersonId,
}

/// How the target relates to the viewer: a compact language-neutral code
/// over the closed alphabet `F M S D H W B Z` with optional `+`/`-`
/// elder/younger suffixes, the generation delta implied by the path, and
/// the path itself. Mapping codes to words is an external lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub relationship_code: String,
    pub generation_diff: i32,
    pub path: Vec<RelationStep>,
}

impl Relationship {
    fn sentinel(code: &str) -> Self {
        Self {
            relationship_code: code.to_string(),
            generation_diff: 0,
            path: Vec::new(),
        }
    }
}

/// The closed set of first-cousin code shapes: a parent step, a sibling
/// step (with or without its own elder/younger mark), then a child step —
/// the children of a cross uncle/aunt. Only these shapes receive the extra
/// endpoint-age suffix.
static COUSIN_SHAPES: Lazy<BTreeSet<String>> = Lazy::new(|| {
    let mut shapes = BTreeSet::new();
    for parent in ["F", "M"] {
        for sibling in ["B", "B+", "B-", "Z", "Z+", "Z-"] {
            for child in ["S", "D"] {
                shapes.insert(format!("{parent}{sibling}{child}"));
            }
        }
    }
    shapes
});

/// Computes how `target` relates to `viewer`.
///
/// Stateless and viewer-parameterized so multiple simultaneous viewers can
/// resolve against the same graph. Degenerate inputs degrade to the
/// sentinel codes; nothing here returns an error.
pub fn resolve(graph: &FamilyGraph, viewer: &str, target: &str) -> Relationship {
    if viewer == target {
        return Relationship::sentinel(SELF_CODE);
    }
    if !graph.contains(viewer) || !graph.contains(target) {
        return Relationship::sentinel(UNKNOWN_CODE);
    }
    let Some(path) = shortest_path(graph, viewer, target) else {
        return Relationship::sentinel(UNRELATED_CODE);
    };
    let relationship_code = compile_code(graph, viewer, target, &path);
    let generation_diff = path
        .iter()
        .map(|step| match step.kind {
            RelationKind::Child => 1,
            RelationKind::Parent => -1,
            RelationKind::Spouse | RelationKind::Sibling => 0,
        })
        .sum();
    Relationship {
        relationship_code,
        generation_diff,
        path,
    }
}

/// Breadth-first search over all four relation kinds, expanding
/// parents -> children -> spouses -> siblings at each node and recording
/// the full step sequence per frontier entry. The frontier guarantees the
/// shortest path in edge count; the fixed expansion order (and the ordered
/// relation sets) breaks length ties deterministically. The visited set
/// terminates even on malformed cyclic graphs.
fn shortest_path(
    graph: &FamilyGraph,
    from: &str,
    to: &str,
) -> Option<Vec<RelationStep>> {
    let mut visited: BTreeSet<PersonId> = BTreeSet::new();
    let mut queue: VecDeque<(PersonId, Vec<RelationStep>)> = VecDeque::new();
    visited.insert(from.to_string());
    queue.push_back((from.to_string(), Vec::new()));
    while let Some((id, path)) = queue.pop_front() {
        if id == to {
            return Some(path);
        }
        let Some(person) = graph.person(&id) else {
            continue;
        };
        for (kind, next) in neighbor_steps(person) {
            if visited.contains(&next) {
                continue;
            }
            visited.insert(next.clone());
            let mut next_path = path.clone();
            next_path.push(RelationStep {
                kind,
                from_id: id.clone(),
                to_id: next.clone(),
            });
            queue.push_back((next, next_path));
        }
    }
    None
}

fn neighbor_steps(person: &Person) -> Vec<(RelationKind, PersonId)> {
    let mut steps = Vec::with_capacity(
        person.parents.len() + person.children.len() + person.spouses.len()
            + person.siblings.len(),
    );
    for id in &person.parents {
        steps.push((RelationKind::Parent, id.clone()));
    }
    for id in &person.children {
        steps.push((RelationKind::Child, id.clone()));
    }
    for id in &person.spouses {
        steps.push((RelationKind::Spouse, id.clone()));
    }
    for id in &person.siblings {
        steps.push((RelationKind::Sibling, id.clone()));
    }
    steps
}

/// Compiles a path into its code: one letter per step keyed by the gender
/// of the person stepped into, sibling steps marked elder/younger, and the
/// first-cousin shapes given the extra endpoint-age mark.
fn compile_code(graph: &FamilyGraph, viewer: &str, target: &str, path: &[RelationStep]) -> String {
    let mut code = String::new();
    for step in path {
        let Some(into) = graph.person(&step.to_id) else {
            continue;
        };
        match step.kind {
            RelationKind::Parent => code.push(gender_letter(into.gender, 'F', 'M')),
            RelationKind::Child => code.push(gender_letter(into.gender, 'S', 'D')),
            RelationKind::Spouse => code.push(gender_letter(into.gender, 'H', 'W')),
            RelationKind::Sibling => {
                code.push(gender_letter(into.gender, 'B', 'Z'));
                if let Some(mark) = sibling_mark(graph.person(&step.from_id), into) {
                    code.push(mark);
                }
            }
        }
    }
    if COUSIN_SHAPES.contains(&code)
        && let (Some(a), Some(b)) = (graph.person(viewer), graph.person(target))
        && let Some(mark) = age_mark(a, b)
    {
        code.push(mark);
    }
    code
}

/// The closed alphabet has no neutral letters, so an unknown gender
/// compiles to the male-form letter of the step kind.
fn gender_letter(gender: Gender, male: char, female: char) -> char {
    match gender {
        Gender::Female => female,
        Gender::Male | Gender::Unknown => male,
    }
}

/// Elder/younger mark for a sibling step: `+` when the person stepped into
/// is the elder. Prefers `birth_order` (lower = elder); falls back to
/// `age` (higher = elder); indeterminate when neither pair is available or
/// the values tie.
fn sibling_mark(from: Option<&Person>, into: &Person) -> Option<char> {
    let from = from?;
    if let (Some(from_order), Some(into_order)) = (from.birth_order, into.birth_order) {
        return match into_order.cmp(&from_order) {
            std::cmp::Ordering::Less => Some('+'),
            std::cmp::Ordering::Greater => Some('-'),
            std::cmp::Ordering::Equal => None,
        };
    }
    if let (Some(from_age), Some(into_age)) = (from.age, into.age) {
        return match into_age.cmp(&from_age) {
            std::cmp::Ordering::Greater => Some('+'),
            std::cmp::Ordering::Less => Some('-'),
            std::cmp::Ordering::Equal => None,
        };
    }
    None
}

/// Elder/younger mark for a cousin code, comparing the two endpoints' own
/// ages only. Cousins are not siblings of a common parent, so birth order
/// does not apply across branches.
fn age_mark(viewer: &Person, target: &Person) -> Option<char> {
    let (viewer_age, target_age) = (viewer.age?, target.age?);
    match target_age.cmp(&viewer_age) {
        std::cmp::Ordering::Greater => Some('+'),
        std::cmp::Ordering::Less => Some('-'),
        std::cmp::Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::assign_generations;
    use crate::graph::{EdgeKind, NewPerson};

    fn person(graph: &mut FamilyGraph, name: &str, gender: Gender) -> PersonId {
        match graph.add_person(NewPerson {
            name: name.to_string(),
            gender,
            ..NewPerson::default()
        }) {
            crate::graph::AddOutcome::Added(id) => id,
            crate::graph::AddOutcome::Duplicate(id) => panic!("unexpected duplicate of {id}"),
        }
    }

    /// Root couple with two children; C1 elder by birth order.
    fn nuclear() -> (FamilyGraph, PersonId, PersonId, PersonId, PersonId) {
        let mut graph = FamilyGraph::new();
        let root = person(&mut graph, "R", Gender::Male);
        let spouse = person(&mut graph, "S", Gender::Female);
        let c1 = person(&mut graph, "C1", Gender::Female);
        let c2 = person(&mut graph, "C2", Gender::Male);
        graph.person_mut(&c1).unwrap().birth_order = Some(1);
        graph.person_mut(&c2).unwrap().birth_order = Some(2);
        graph.add_relation(&root, &spouse, EdgeKind::Spouse);
        for child in [&c1, &c2] {
            graph.add_relation(&root, child, EdgeKind::ParentChild);
            graph.add_relation(&spouse, child, EdgeKind::ParentChild);
        }
        assign_generations(&mut graph);
        (graph, root, spouse, c1, c2)
    }

    #[test]
    fn self_is_self() {
        let (graph, root, ..) = nuclear();
        assert_eq!(resolve(&graph, &root, &root).relationship_code, SELF_CODE);
    }

    #[test]
    fn missing_ids_are_unknown() {
        let (graph, root, ..) = nuclear();
        assert_eq!(
            resolve(&graph, &root, "nope").relationship_code,
            UNKNOWN_CODE
        );
        assert_eq!(
            resolve(&graph, "nope", &root).relationship_code,
            UNKNOWN_CODE
        );
    }

    #[test]
    fn nuclear_family_codes() {
        let (graph, root, spouse, c1, _) = nuclear();
        assert_eq!(resolve(&graph, &root, &c1).relationship_code, "D");
        assert_eq!(resolve(&graph, &c1, &root).relationship_code, "F");
        assert_eq!(resolve(&graph, &spouse, &c1).relationship_code, "D");
        assert_eq!(resolve(&graph, &c1, &spouse).relationship_code, "M");
        assert_eq!(resolve(&graph, &root, &spouse).relationship_code, "W");
        assert_eq!(resolve(&graph, &spouse, &root).relationship_code, "H");
    }

    #[test]
    fn sibling_tie_break_uses_birth_order() {
        let (graph, _, _, c1, c2) = nuclear();
        // C2 is younger (higher birth order), male.
        assert_eq!(resolve(&graph, &c1, &c2).relationship_code, "B-");
        assert_eq!(resolve(&graph, &c2, &c1).relationship_code, "Z+");
    }

    #[test]
    fn sibling_tie_break_falls_back_to_age() {
        let mut graph = FamilyGraph::new();
        let parent = person(&mut graph, "P", Gender::Female);
        let a = person(&mut graph, "A", Gender::Male);
        let b = person(&mut graph, "B", Gender::Male);
        graph.person_mut(&a).unwrap().age = Some(40);
        graph.person_mut(&b).unwrap().age = Some(35);
        graph.add_relation(&parent, &a, EdgeKind::ParentChild);
        graph.add_relation(&parent, &b, EdgeKind::ParentChild);
        assign_generations(&mut graph);
        assert_eq!(resolve(&graph, &a, &b).relationship_code, "B-");
        assert_eq!(resolve(&graph, &b, &a).relationship_code, "B+");
    }

    #[test]
    fn sibling_without_tiebreak_data_has_no_mark() {
        let mut graph = FamilyGraph::new();
        let parent = person(&mut graph, "P", Gender::Male);
        let a = person(&mut graph, "A", Gender::Female);
        let b = person(&mut graph, "B", Gender::Female);
        graph.add_relation(&parent, &a, EdgeKind::ParentChild);
        graph.add_relation(&parent, &b, EdgeKind::ParentChild);
        assign_generations(&mut graph);
        assert_eq!(resolve(&graph, &a, &b).relationship_code, "Z");
    }

    #[test]
    fn uncle_and_cousin_codes() {
        let mut graph = FamilyGraph::new();
        let grandpa = person(&mut graph, "GP", Gender::Male);
        let father = person(&mut graph, "F", Gender::Male);
        let uncle = person(&mut graph, "U", Gender::Male);
        let me = person(&mut graph, "Me", Gender::Male);
        let cousin = person(&mut graph, "C", Gender::Female);
        graph.person_mut(&father).unwrap().birth_order = Some(1);
        graph.person_mut(&uncle).unwrap().birth_order = Some(2);
        graph.person_mut(&me).unwrap().age = Some(20);
        graph.person_mut(&cousin).unwrap().age = Some(25);
        graph.add_relation(&grandpa, &father, EdgeKind::ParentChild);
        graph.add_relation(&grandpa, &uncle, EdgeKind::ParentChild);
        graph.add_relation(&father, &me, EdgeKind::ParentChild);
        graph.add_relation(&uncle, &cousin, EdgeKind::ParentChild);
        assign_generations(&mut graph);

        // Father's younger brother; his daughter is the elder cousin.
        assert_eq!(resolve(&graph, &me, &uncle).relationship_code, "FB-");
        let cousin_rel = resolve(&graph, &me, &cousin);
        assert_eq!(cousin_rel.relationship_code, "FB-D+");
        assert_eq!(cousin_rel.generation_diff, 0);

        // Without endpoint ages the cousin mark is dropped.
        let mut no_ages = graph.clone();
        no_ages.person_mut(&cousin).unwrap().age = None;
        assert_eq!(resolve(&no_ages, &me, &cousin).relationship_code, "FB-D");
    }

    #[test]
    fn grandparent_codes_and_generation_diff() {
        let mut graph = FamilyGraph::new();
        let grandma = person(&mut graph, "GM", Gender::Female);
        let mother = person(&mut graph, "M", Gender::Female);
        let me = person(&mut graph, "Me", Gender::Male);
        graph.add_relation(&grandma, &mother, EdgeKind::ParentChild);
        graph.add_relation(&mother, &me, EdgeKind::ParentChild);
        assign_generations(&mut graph);
        let up = resolve(&graph, &me, &grandma);
        assert_eq!(up.relationship_code, "MM");
        assert_eq!(up.generation_diff, -2);
        let down = resolve(&graph, &grandma, &me);
        assert_eq!(down.relationship_code, "DS");
        assert_eq!(down.generation_diff, 2);
    }

    #[test]
    fn unrelated_people_have_no_path() {
        let mut graph = FamilyGraph::new();
        let a = person(&mut graph, "A", Gender::Male);
        let b = person(&mut graph, "B", Gender::Female);
        assign_generations(&mut graph);
        let relationship = resolve(&graph, &a, &b);
        assert_eq!(relationship.relationship_code, UNRELATED_CODE);
        assert!(relationship.path.is_empty());
    }

    #[test]
    fn unknown_gender_compiles_to_male_form() {
        let mut graph = FamilyGraph::new();
        let parent = person(&mut graph, "P", Gender::Unknown);
        let child = person(&mut graph, "C", Gender::Unknown);
        graph.add_relation(&parent, &child, EdgeKind::ParentChild);
        assign_generations(&mut graph);
        assert_eq!(resolve(&graph, &child, &parent).relationship_code, "F");
        assert_eq!(resolve(&graph, &parent, &child).relationship_code, "S");
    }

    #[test]
    fn malformed_cycle_still_terminates() {
        let mut graph = FamilyGraph::new();
        let a = person(&mut graph, "A", Gender::Male);
        let b = person(&mut graph, "B", Gender::Male);
        // A is their own ancestor through a malformed edit.
        graph.add_relation(&a, &b, EdgeKind::ParentChild);
        if let Some(p) = graph.person_mut(&b) {
            p.children.insert(a.clone());
        }
        if let Some(p) = graph.person_mut(&a) {
            p.parents.insert(b.clone());
        }
        let relationship = resolve(&graph, &a, &b);
        assert_eq!(relationship.path.len(), 1);
    }

    #[test]
    fn path_records_every_step() {
        let (graph, root, _, c1, _) = nuclear();
        let relationship = resolve(&graph, &root, &c1);
        assert_eq!(
            relationship.path,
            vec![RelationStep {
                kind: RelationKind::Child,
                from_id: root,
                to_id: c1,
            }]
        );
    }
}
