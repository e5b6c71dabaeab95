use crate::graph::FamilyGraph;
use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub generation: Option<i32>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout, graph: &FamilyGraph) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                generation: graph.person(&node.id).and_then(|person| person.generation),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout, graph: &FamilyGraph) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
