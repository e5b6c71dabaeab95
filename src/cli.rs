use crate::config::load_config;
use crate::interchange::{FamilyFile, graph_from_records};
use crate::layout::{apply_layout, compute_layout};
use crate::relationship::{Relationship, resolve};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "kintree", version, about = "Family relationship graph engine")]
pub struct Args {
    /// Input family JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// What to emit
    #[arg(short = 'e', long = "emit", value_enum, default_value = "layout")]
    pub emit: Emit,

    /// Viewer id for relationship codes (overrides the input file's)
    #[arg(short = 'v', long = "viewer")]
    pub viewer: Option<String>,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Emit {
    Relationships,
    Layout,
    Stats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelationshipRow {
    id: String,
    #[serde(flatten)]
    relationship: Relationship,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let file: FamilyFile = serde_json::from_str(&input)?;
    let mut graph = graph_from_records(&file.people)?;

    let rendered = match args.emit {
        Emit::Relationships => {
            let viewer = args.viewer.or(file.viewer).ok_or_else(|| {
                anyhow::anyhow!("No viewer id: pass --viewer or set \"viewer\" in the input")
            })?;
            let rows: Vec<RelationshipRow> = graph
                .people
                .keys()
                .map(|id| RelationshipRow {
                    id: id.clone(),
                    relationship: resolve(&graph, &viewer, id),
                })
                .collect();
            serde_json::to_string_pretty(&rows)?
        }
        Emit::Layout => {
            let layout = compute_layout(&graph, &config);
            apply_layout(&mut graph, &layout);
            serde_json::to_string_pretty(&layout.person_positions())?
        }
        Emit::Stats => serde_json::to_string_pretty(&graph.stats())?,
    };

    write_output(&rendered, args.output.as_deref())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::SELF_CODE;

    #[test]
    fn relationship_rows_flatten_the_code() {
        let file: FamilyFile = serde_json::from_str(
            r#"{"people": [{"id": "a", "name": "A", "gender": "male"}], "viewer": "a"}"#,
        )
        .unwrap();
        let graph = graph_from_records(&file.people).unwrap();
        let row = RelationshipRow {
            id: "a".into(),
            relationship: resolve(&graph, "a", "a"),
        };
        let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&row).unwrap()).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["relationshipCode"], SELF_CODE);
    }
}
