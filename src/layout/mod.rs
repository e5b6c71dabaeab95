mod ordering;
pub(crate) mod types;
mod units;

pub use types::*;
use ordering::*;
use units::*;

use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::graph::FamilyGraph;

/// Produces a deterministic generational placement: rank = generation,
/// spouses adjacent on their shared rank, and each sibling group fanning
/// out from the synthetic family-unit anchor of its exact parent set.
/// Re-running on an unchanged graph yields bit-identical coordinates.
///
/// Generations must be fresh (see the generation assigner); layout against
/// a stale graph is a caller-ordering error the engine does not detect.
pub fn compute_layout(graph: &FamilyGraph, config: &LayoutConfig) -> Layout {
    if graph.is_empty() {
        return Layout {
            nodes: BTreeMap::new(),
            width: config.margin * 2.0,
            height: config.margin * 2.0,
        };
    }

    let units = collect_family_units(graph);
    let pairs = spouse_pairs(graph);
    // Co-parents are pulled together by the ordering sweeps through their
    // shared unit; childless couples have no unit, so they carry an
    // explicit same-rank adjacency constraint instead.
    let clusters: Vec<(String, String)> = pairs
        .iter()
        .filter(|(a, b)| !have_common_children(graph, a, b))
        .cloned()
        .collect();

    // Person layers sit on even indices, normalized so the eldest
    // generation is layer 0; the units between generation g and g+1 get
    // the odd layer in the gap.
    let min_generation = graph
        .people
        .values()
        .filter_map(|person| person.generation)
        .min()
        .unwrap_or(0);
    let max_generation = graph
        .people
        .values()
        .filter_map(|person| person.generation)
        .max()
        .unwrap_or(0);
    let person_layers = (max_generation - min_generation + 1).max(1) as usize;
    let layer_count = person_layers * 2 - 1;
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); layer_count];
    let person_layer =
        |generation: i32| -> usize { (((generation - min_generation) as usize) * 2).min(layer_count - 1) };

    let mut nodes: BTreeMap<String, LayoutNode> = BTreeMap::new();
    for person in graph.people.values() {
        nodes.insert(
            person.id.clone(),
            LayoutNode {
                id: person.id.clone(),
                kind: NodeKind::Person,
                x: 0.0,
                y: 0.0,
                width: config.node_width,
                height: config.node_height,
            },
        );
        if let Some(generation) = person.generation {
            layers[person_layer(generation)].push(person.id.clone());
        }
    }
    // Cyclic residue unreached by the assigner: park on the top layer
    // after the rooted people, in id order.
    for person in graph.people.values() {
        if person.generation.is_none() {
            layers[0].push(person.id.clone());
        }
    }

    let mut edges: Vec<(String, String)> = Vec::new();
    for unit in &units {
        let parent_generation = unit
            .parents
            .iter()
            .filter_map(|id| graph.person(id).and_then(|p| p.generation))
            .min();
        let child_generation = unit
            .children
            .iter()
            .filter_map(|id| graph.person(id).and_then(|p| p.generation))
            .min();
        let base = parent_generation
            .or_else(|| child_generation.map(|g| g - 1))
            .unwrap_or(min_generation);
        let layer = (person_layer(base) + 1).min(layer_count - 1);
        layers[layer].push(unit.id.clone());
        nodes.insert(
            unit.id.clone(),
            LayoutNode {
                id: unit.id.clone(),
                kind: NodeKind::FamilyUnit,
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            },
        );
        for parent in &unit.parents {
            edges.push((parent.clone(), unit.id.clone()));
        }
        for child in &unit.children {
            edges.push((unit.id.clone(), child.clone()));
        }
    }

    let node_order: HashMap<String, usize> = nodes
        .keys()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();

    order_rank_nodes(&mut layers, &edges, &node_order, &clusters, config.order_passes);

    assign_coordinates(&mut nodes, &layers, &edges, &pairs, config);
    normalize(&mut nodes, config.margin);

    let person_nodes: BTreeMap<String, LayoutNode> = nodes
        .into_iter()
        .filter(|(_, node)| node.kind == NodeKind::Person)
        .collect();
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for node in person_nodes.values() {
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    Layout {
        nodes: person_nodes,
        width: max_x + config.margin,
        height: max_y + config.margin,
    }
}

/// Copies each person node's final center back onto `Person.x`/`y`. The
/// family-unit anchors never leave the layout pass.
pub fn apply_layout(graph: &mut FamilyGraph, layout: &Layout) {
    for node in layout.nodes.values() {
        if let Some(person) = graph.person_mut(&node.id) {
            let (x, y) = node.center();
            person.x = x;
            person.y = y;
        }
    }
}

fn assign_coordinates(
    nodes: &mut BTreeMap<String, LayoutNode>,
    layers: &[Vec<String>],
    edges: &[(String, String)],
    pairs: &[(String, String)],
    config: &LayoutConfig,
) {
    // Main axis: one cursor step per layer with any height. Unit layers
    // are zero-height, so they consume no vertical space.
    let mut cursor = 0.0f32;
    for bucket in layers {
        let mut max_height = 0.0f32;
        for id in bucket {
            if let Some(node) = nodes.get_mut(id) {
                node.y = cursor;
                max_height = max_height.max(node.height);
            }
        }
        if max_height > 0.0 {
            cursor += max_height + config.rank_spacing;
        }
    }

    // Cross axis: initial left-to-right placement in rank order.
    for bucket in layers {
        let mut x = 0.0f32;
        for id in bucket {
            if let Some(node) = nodes.get_mut(id) {
                node.x = x;
                x += node.width + config.node_spacing;
            }
        }
    }

    // Neighbor maps for the alignment sweeps. Spouse pairs count as
    // neighbors in both directions so childless couples track each other.
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    for (from, to) in edges {
        incoming.entry(to.clone()).or_default().push(from.clone());
        outgoing.entry(from.clone()).or_default().push(to.clone());
    }
    for (a, b) in pairs {
        incoming.entry(a.clone()).or_default().push(b.clone());
        incoming.entry(b.clone()).or_default().push(a.clone());
        outgoing.entry(a.clone()).or_default().push(b.clone());
        outgoing.entry(b.clone()).or_default().push(a.clone());
    }

    let mut centers: HashMap<String, f32> = HashMap::new();
    for node in nodes.values() {
        centers.insert(node.id.clone(), node.x + node.width / 2.0);
    }

    for _ in 0..config.alignment_passes.max(1) {
        for bucket in layers {
            align_layer(bucket, &incoming, &mut centers, nodes, config.node_spacing);
        }
        for bucket in layers.iter().rev() {
            align_layer(bucket, &outgoing, &mut centers, nodes, config.node_spacing);
        }
    }
}

/// One alignment sweep over a layer: every node wants the median of its
/// neighbors' centers; rank order is preserved and a minimum separation of
/// half-widths plus spacing is enforced, then the whole layer is shifted
/// so the assigned mean matches the desired mean.
fn align_layer(
    bucket: &[String],
    neighbors: &HashMap<String, Vec<String>>,
    centers: &mut HashMap<String, f32>,
    nodes: &mut BTreeMap<String, LayoutNode>,
    spacing: f32,
) {
    if bucket.is_empty() {
        return;
    }
    let mut desired: Vec<(String, f32, f32)> = Vec::with_capacity(bucket.len());
    for id in bucket {
        let Some(node) = nodes.get(id) else {
            continue;
        };
        let current = centers.get(id).copied().unwrap_or(0.0);
        let target = match neighbors.get(id) {
            Some(list) => {
                let mut values: Vec<f32> = list
                    .iter()
                    .filter_map(|neighbor| centers.get(neighbor).copied())
                    .collect();
                if values.is_empty() {
                    current
                } else {
                    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                    let mid = values.len() / 2;
                    if values.len() % 2 == 1 {
                        values[mid]
                    } else {
                        (values[mid - 1] + values[mid]) * 0.5
                    }
                }
            }
            None => current,
        };
        desired.push((id.clone(), target, node.width / 2.0));
    }
    if desired.is_empty() {
        return;
    }

    let mut assigned: Vec<f32> = Vec::with_capacity(desired.len());
    let mut prev_center = f32::MIN;
    let mut prev_half = 0.0f32;
    for (idx, (_, target, half)) in desired.iter().enumerate() {
        let center = if idx == 0 {
            *target
        } else {
            target.max(prev_center + prev_half + half + spacing)
        };
        assigned.push(center);
        prev_center = center;
        prev_half = *half;
    }

    let desired_mean = desired.iter().map(|(_, t, _)| *t).sum::<f32>() / desired.len() as f32;
    let assigned_mean = assigned.iter().sum::<f32>() / assigned.len() as f32;
    let delta = desired_mean - assigned_mean;
    for ((id, _, half), center) in desired.iter().zip(assigned) {
        let center = center + delta;
        if let Some(node) = nodes.get_mut(id) {
            node.x = center - half;
        }
        centers.insert(id.clone(), center);
    }
}

/// Translates the whole layout so the minimum x and minimum y land on the
/// margin; keeps every coordinate positive for callers that cache them.
fn normalize(nodes: &mut BTreeMap<String, LayoutNode>, margin: f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    for node in nodes.values() {
        if node.kind == NodeKind::Person {
            min_x = min_x.min(node.x);
            min_y = min_y.min(node.y);
        }
    }
    if min_x == f32::MAX {
        return;
    }
    let dx = margin - min_x;
    let dy = margin - min_y;
    for node in nodes.values_mut() {
        node.x += dx;
        node.y += dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::assign_generations;
    use crate::graph::{AddOutcome, EdgeKind, Gender, NewPerson, PersonId};

    fn person(graph: &mut FamilyGraph, name: &str, gender: Gender) -> PersonId {
        match graph.add_person(NewPerson {
            name: name.to_string(),
            gender,
            ..NewPerson::default()
        }) {
            AddOutcome::Added(id) => id,
            AddOutcome::Duplicate(id) => panic!("unexpected duplicate of {id}"),
        }
    }

    fn three_generations() -> FamilyGraph {
        let mut graph = FamilyGraph::new();
        let grandpa = person(&mut graph, "GP", Gender::Male);
        let grandma = person(&mut graph, "GM", Gender::Female);
        let father = person(&mut graph, "F", Gender::Male);
        let mother = person(&mut graph, "M", Gender::Female);
        let uncle = person(&mut graph, "U", Gender::Male);
        let child_a = person(&mut graph, "A", Gender::Female);
        let child_b = person(&mut graph, "B", Gender::Male);
        graph.add_relation(&grandpa, &grandma, EdgeKind::Spouse);
        graph.add_relation(&father, &mother, EdgeKind::Spouse);
        for child in [&father, &uncle] {
            graph.add_relation(&grandpa, child, EdgeKind::ParentChild);
            graph.add_relation(&grandma, child, EdgeKind::ParentChild);
        }
        for child in [&child_a, &child_b] {
            graph.add_relation(&father, child, EdgeKind::ParentChild);
            graph.add_relation(&mother, child, EdgeKind::ParentChild);
        }
        assign_generations(&mut graph);
        graph
    }

    #[test]
    fn children_lie_strictly_below_parents() {
        let graph = three_generations();
        let layout = compute_layout(&graph, &LayoutConfig::default());
        for person in graph.people.values() {
            let node = layout.nodes.get(&person.id).expect("person placed");
            for parent_id in &person.parents {
                let parent_node = layout.nodes.get(parent_id).expect("parent placed");
                assert!(
                    node.y > parent_node.y,
                    "{} should sit below {}",
                    person.id,
                    parent_id
                );
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let graph = three_generations();
        let config = LayoutConfig::default();
        let first = compute_layout(&graph, &config);
        let second = compute_layout(&graph, &config);
        assert_eq!(first.nodes.len(), second.nodes.len());
        for (id, node) in &first.nodes {
            let other = second.nodes.get(id).expect("same node set");
            assert_eq!(node.x.to_bits(), other.x.to_bits(), "{id} x drifted");
            assert_eq!(node.y.to_bits(), other.y.to_bits(), "{id} y drifted");
        }
        assert_eq!(first.width.to_bits(), second.width.to_bits());
        assert_eq!(first.height.to_bits(), second.height.to_bits());
    }

    #[test]
    fn no_two_people_overlap_within_a_rank() {
        let graph = three_generations();
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let nodes: Vec<&LayoutNode> = layout.nodes.values().collect();
        for a in &nodes {
            for b in &nodes {
                if a.id >= b.id || (a.y - b.y).abs() > f32::EPSILON {
                    continue;
                }
                let gap = if a.x < b.x {
                    b.x - (a.x + a.width)
                } else {
                    a.x - (b.x + b.width)
                };
                assert!(gap >= 0.0, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn childless_spouses_sit_adjacent() {
        let mut graph = FamilyGraph::new();
        let a = person(&mut graph, "A", Gender::Male);
        let b = person(&mut graph, "B", Gender::Female);
        graph.add_relation(&a, &b, EdgeKind::Spouse);
        assign_generations(&mut graph);
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let (ax, ay) = layout.nodes.get(&a).expect("a placed").center();
        let (bx, by) = layout.nodes.get(&b).expect("b placed").center();
        assert_eq!(ay, by);
        assert_eq!(
            (ax - bx).abs(),
            config.node_width + config.node_spacing,
            "spouses should sit one slot apart"
        );
    }

    #[test]
    fn normalization_keeps_margin() {
        let graph = three_generations();
        let config = LayoutConfig::default();
        let layout = compute_layout(&graph, &config);
        let min_x = layout
            .nodes
            .values()
            .map(|n| n.x)
            .fold(f32::MAX, f32::min);
        let min_y = layout
            .nodes
            .values()
            .map(|n| n.y)
            .fold(f32::MAX, f32::min);
        assert_eq!(min_x, config.margin);
        assert_eq!(min_y, config.margin);
    }

    #[test]
    fn unit_anchors_never_reach_the_output() {
        let graph = three_generations();
        let layout = compute_layout(&graph, &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), graph.len());
        assert!(layout.nodes.keys().all(|id| !id.starts_with("__family_")));
    }

    #[test]
    fn apply_layout_writes_centers_back() {
        let mut graph = three_generations();
        let layout = compute_layout(&graph, &LayoutConfig::default());
        apply_layout(&mut graph, &layout);
        for (id, node) in &layout.nodes {
            let person = graph.person(id).expect("person exists");
            let (x, y) = node.center();
            assert_eq!(person.x, x);
            assert_eq!(person.y, y);
        }
    }
}
