//! JSON snapshot of the taxonomy as delivered by the data source.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::{GraphData, NodeStatus, RadiusConfig};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub metric: Option<f32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub strength: Option<f32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphDataset {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, alias = "edges")]
    pub links: Vec<LinkRecord>,
}

pub fn parse_dataset(raw: &str) -> Result<GraphDataset> {
    let dataset: GraphDataset = serde_json::from_str(raw).context("invalid graph JSON")?;
    if dataset.nodes.is_empty() {
        return Err(anyhow!("graph JSON contains no nodes"));
    }
    Ok(dataset)
}

pub fn load_dataset(path: &Path, radius: RadiusConfig) -> Result<GraphData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let dataset = parse_dataset(&raw)
        .with_context(|| format!("failed to parse graph file {}", path.display()))?;
    GraphData::build(dataset, radius)
        .with_context(|| format!("graph file {} is inconsistent", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_dataset_with_edges_alias() {
        let raw = r#"{
            "nodes": [
                {"id": "root", "depth": 0},
                {"id": "shoes", "parent": "root", "metric": 1200, "status": "optimal"}
            ],
            "edges": [{"source": "root", "target": "shoes", "strength": 0.5}]
        }"#;
        let dataset = parse_dataset(raw).expect("valid JSON");
        assert_eq!(dataset.nodes.len(), 2);
        assert_eq!(dataset.links.len(), 1);
        assert_eq!(dataset.nodes[1].status, NodeStatus::Optimal);
    }

    #[test]
    fn rejects_empty_node_list() {
        assert!(parse_dataset(r#"{"nodes": []}"#).is_err());
        assert!(parse_dataset("not json").is_err());
    }
}
