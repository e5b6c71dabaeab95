use std::collections::{BTreeSet, VecDeque};

use crate::graph::{FamilyGraph, PersonId};

/// Assigns a consistent integer generation to every person reachable from
/// a root (a person with no recorded parents).
///
/// Breadth-first traversal starting simultaneously from every root at
/// depth 0, following only child edges; a person's generation is the depth
/// at which it is first visited. The BFS frontier guarantees shortest-depth
/// assignment, so first-visit-wins is well defined even with multiple roots
/// or remarriage-introduced cross-links. People unreached by the traversal
/// keep an unset generation.
///
/// Must be re-run after any structural mutation before layout or
/// relationship output is trusted; [`FamilyGraph::apply_edit`] does this
/// automatically.
pub fn assign_generations(graph: &mut FamilyGraph) {
    let roots = graph.roots();
    for person in graph.people.values_mut() {
        person.generation = None;
    }
    let mut queue: VecDeque<(PersonId, i32)> = roots.into_iter().map(|id| (id, 0)).collect();
    while let Some((id, depth)) = queue.pop_front() {
        let Some(person) = graph.people.get_mut(&id) else {
            continue;
        };
        if person.generation.is_some() {
            continue;
        }
        person.generation = Some(depth);
        for child in person.children.clone() {
            queue.push_back((child, depth + 1));
        }
    }
}

/// Re-derives the generations of `start`'s descendants from `start`'s own
/// generation, one step per child edge. Used by the store's eager
/// parent-child update; the full assigner remains the authoritative
/// recompute. The seen-set keeps malformed cycles from looping.
pub(crate) fn propagate_descendants(graph: &mut FamilyGraph, start: &str) {
    let mut seen: BTreeSet<PersonId> = BTreeSet::new();
    let mut queue: VecDeque<PersonId> = VecDeque::from([start.to_string()]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let Some(person) = graph.people.get(&id) else {
            continue;
        };
        let Some(generation) = person.generation else {
            continue;
        };
        for child in person.children.clone() {
            if let Some(child_person) = graph.people.get_mut(&child) {
                child_person.generation = Some(generation + 1);
                queue.push_back(child);
            }
        }
    }
}
