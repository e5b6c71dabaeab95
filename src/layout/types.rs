use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Person,
    /// Synthetic anchor merging co-parents of shared children. Exists only
    /// while the layout runs; never part of the returned layout.
    FamilyUnit,
}

/// A placed box. `x`/`y` are the top-left corner.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutNode {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Final placement: one node per person, generation strictly increasing
/// downward, origin-normalized to the configured margin.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub nodes: BTreeMap<String, LayoutNode>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    /// Per-person center positions in id order, the record external
    /// callers consume.
    pub fn person_positions(&self) -> Vec<PersonPosition> {
        self.nodes
            .values()
            .map(|node| {
                let (x, y) = node.center();
                PersonPosition {
                    id: node.id.clone(),
                    x,
                    y,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonPosition {
    pub id: String,
    pub x: f32,
    pub y: f32,
}
