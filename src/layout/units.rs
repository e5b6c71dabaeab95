use std::collections::BTreeMap;

use crate::graph::{FamilyGraph, PersonId};

/// Synthetic layout anchor for one exact parent set. Children fan out from
/// the unit rather than from each parent separately.
#[derive(Debug, Clone)]
pub(super) struct FamilyUnit {
    pub id: String,
    /// Sorted co-parent ids.
    pub parents: Vec<PersonId>,
    /// Children whose parent set is exactly `parents`, sorted.
    pub children: Vec<PersonId>,
}

/// Groups children by their exact parent set. A child with a different
/// exact parent set gets its own distinct unit, even when the sets
/// partially overlap; a single recorded parent still yields a unit so all
/// children hang from anchors uniformly.
pub(super) fn collect_family_units(graph: &FamilyGraph) -> Vec<FamilyUnit> {
    let mut by_parent_set: BTreeMap<Vec<PersonId>, Vec<PersonId>> = BTreeMap::new();
    for person in graph.people.values() {
        if person.parents.is_empty() {
            continue;
        }
        let key: Vec<PersonId> = person.parents.iter().cloned().collect();
        by_parent_set.entry(key).or_default().push(person.id.clone());
    }
    by_parent_set
        .into_iter()
        .map(|(parents, children)| FamilyUnit {
            id: format!("__family_{}__", parents.join("+")),
            parents,
            children,
        })
        .collect()
}

/// Spouse pairs (ordered, deduplicated) that should sit adjacent on their
/// shared rank. Pairs with common children are anchored by a family unit
/// instead; pairs without any are returned here as an explicit adjacency
/// constraint so they still render next to each other.
pub(super) fn spouse_pairs(graph: &FamilyGraph) -> Vec<(PersonId, PersonId)> {
    let mut pairs = Vec::new();
    for person in graph.people.values() {
        for spouse in &person.spouses {
            if person.id.as_str() < spouse.as_str() {
                pairs.push((person.id.clone(), spouse.clone()));
            }
        }
    }
    pairs
}

pub(super) fn have_common_children(graph: &FamilyGraph, a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (graph.person(a), graph.person(b)) else {
        return false;
    };
    a.children.intersection(&b.children).next().is_some()
}
