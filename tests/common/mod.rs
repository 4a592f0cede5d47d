#![allow(dead_code)]

use std::sync::Arc;

use taxograph::graph::{GraphData, GraphDataset, LinkRecord, NodeRecord, RadiusConfig};
use taxograph::physics::{BodySpec, LinkSpec};

pub fn node(id: &str) -> NodeRecord {
    NodeRecord {
        id: id.to_owned(),
        ..NodeRecord::default()
    }
}

pub fn child(id: &str, parent: &str) -> NodeRecord {
    NodeRecord {
        parent: Some(parent.to_owned()),
        ..node(id)
    }
}

pub fn link(source: &str, target: &str) -> LinkRecord {
    LinkRecord {
        source: source.to_owned(),
        target: target.to_owned(),
        strength: None,
    }
}

pub fn build(nodes: Vec<NodeRecord>, links: Vec<LinkRecord>) -> Arc<GraphData> {
    let dataset = GraphDataset { nodes, links };
    Arc::new(GraphData::build(dataset, RadiusConfig::default()).expect("fixture graph is valid"))
}

/// Four-way tree of `count` nodes: node `i` hangs under node `(i - 1) / 4`.
pub fn tree(count: usize) -> Arc<GraphData> {
    let nodes = (0..count)
        .map(|index| {
            if index == 0 {
                node("t0")
            } else {
                child(&format!("t{index}"), &format!("t{}", (index - 1) / 4))
            }
        })
        .collect();
    build(nodes, Vec::new())
}

/// Tree whose even nodes carry seed positions on a 50-unit grid.
pub fn seeded_tree(count: usize) -> Arc<GraphData> {
    let nodes = (0..count)
        .map(|index| {
            let mut record = if index == 0 {
                node("t0")
            } else {
                child(&format!("t{index}"), &format!("t{}", (index - 1) / 4))
            };
            if index % 2 == 0 {
                record.x = Some((index % 20) as f32 * 50.0);
                record.y = Some((index / 20) as f32 * 50.0);
            }
            record
        })
        .collect();
    build(nodes, Vec::new())
}

pub fn bodies(graph: &GraphData) -> Vec<BodySpec> {
    graph
        .nodes()
        .iter()
        .map(|node| BodySpec {
            id: node.id,
            depth: node.depth,
            radius: node.radius,
            position: node.seed_position,
        })
        .collect()
}

pub fn links(graph: &GraphData) -> Vec<LinkSpec> {
    graph
        .links()
        .iter()
        .map(|link| LinkSpec {
            source: link.source,
            target: link.target,
            strength: link.strength,
        })
        .collect()
}
