use std::collections::{HashMap, HashSet};

use eframe::egui::vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::util::normalize_log;

use super::{GraphData, GraphDataset, GraphError, GraphLink, GraphNode, NodeId};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            min_radius: 4.0,
            max_radius: 28.0,
        }
    }
}

impl RadiusConfig {
    fn radius_for(self, metric: f32, min_metric: f32, max_metric: f32) -> f32 {
        let min = self.min_radius.max(0.5);
        let max = self.max_radius.max(min);
        (min + normalize_log(metric, min_metric, max_metric) * (max - min)).clamp(min, max)
    }
}

impl GraphData {
    /// Resolves keys to ids, derives depths and radii, and drops links that
    /// cannot be honoured (self-links, unknown endpoints, duplicates).
    ///
    /// Every `parent` reference also yields a link if the dataset did not
    /// already list one.
    pub fn build(dataset: GraphDataset, radius: RadiusConfig) -> Result<Self, GraphError> {
        let GraphDataset {
            nodes: records,
            links: link_records,
        } = dataset;

        let mut index_by_key = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            let key = record.id.trim();
            if key.is_empty() {
                return Err(GraphError::EmptyKey { position });
            }
            if index_by_key
                .insert(key.to_owned(), NodeId::from_index(position))
                .is_some()
            {
                return Err(GraphError::DuplicateKey(key.to_owned()));
            }
        }

        let parents = records
            .iter()
            .map(|record| {
                let parent = record.parent.as_deref()?.trim();
                let resolved = index_by_key.get(parent).copied();
                if resolved.is_none() {
                    warn!(node = %record.id, parent, "parent not present in dataset; treating as root");
                }
                resolved
            })
            .collect::<Vec<_>>();

        let depths = resolve_depths(&records, &parents)?;

        let mut min_metric = f32::INFINITY;
        let mut max_metric = 0.0_f32;
        let metrics = records
            .iter()
            .map(|record| {
                let metric = record.metric.filter(|value| value.is_finite()).unwrap_or(0.0).max(0.0);
                min_metric = min_metric.min(metric);
                max_metric = max_metric.max(metric);
                metric
            })
            .collect::<Vec<_>>();
        if !min_metric.is_finite() {
            min_metric = 0.0;
        }

        let nodes = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let seed_position = match (record.x, record.y) {
                    (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(vec2(x, y)),
                    _ => None,
                };
                let key = record.id.trim().to_owned();
                GraphNode {
                    id: NodeId::from_index(index),
                    label: record.label.unwrap_or_else(|| key.clone()),
                    key,
                    depth: depths[index],
                    parent: parents[index],
                    metric: metrics[index],
                    category: record.category,
                    status: record.status,
                    radius: radius.radius_for(metrics[index], min_metric, max_metric),
                    seed_position,
                }
            })
            .collect::<Vec<_>>();

        let mut seen = HashSet::new();
        let mut links = Vec::with_capacity(link_records.len() + nodes.len());
        for record in link_records {
            let (Some(source), Some(target)) = (
                index_by_key.get(record.source.trim()).copied(),
                index_by_key.get(record.target.trim()).copied(),
            ) else {
                warn!(source = %record.source, target = %record.target, "dropping link with unknown endpoint");
                continue;
            };
            if source == target {
                warn!(node = %record.source, "dropping self-link");
                continue;
            }
            if !seen.insert((source.min(target), source.max(target))) {
                continue;
            }
            let strength = record
                .strength
                .filter(|value| value.is_finite())
                .map(|value| value.clamp(0.0, 1.0));
            links.push(GraphLink {
                source,
                target,
                strength,
            });
        }

        for node in &nodes {
            let Some(parent) = node.parent else {
                continue;
            };
            if parent != node.id && seen.insert((parent.min(node.id), parent.max(node.id))) {
                links.push(GraphLink {
                    source: parent,
                    target: node.id,
                    strength: None,
                });
            }
        }

        let mut incident = vec![Vec::new(); nodes.len()];
        for (index, link) in links.iter().enumerate() {
            incident[link.source.index()].push(index);
            incident[link.target.index()].push(index);
        }

        debug!(nodes = nodes.len(), links = links.len(), "graph built");

        Ok(Self {
            nodes,
            links,
            index_by_key,
            incident,
            max_metric,
        })
    }
}

/// Missing depths are derived from the parent chain; explicit depths that are
/// shallower than their parent's are raised to keep depth non-decreasing.
fn resolve_depths(
    records: &[super::NodeRecord],
    parents: &[Option<NodeId>],
) -> Result<Vec<u32>, GraphError> {
    let count = records.len();
    let mut depths: Vec<Option<u32>> = records.iter().map(|record| record.depth).collect();

    for start in 0..count {
        if depths[start].is_some() {
            continue;
        }

        let mut chain = Vec::new();
        let mut on_chain = HashSet::new();
        let mut cursor = start;
        let base = loop {
            if let Some(depth) = depths[cursor] {
                break depth;
            }
            if !on_chain.insert(cursor) {
                return Err(GraphError::ParentCycle(records[start].id.clone()));
            }
            chain.push(cursor);
            match parents[cursor] {
                Some(parent) => cursor = parent.index(),
                None => {
                    let root = chain.pop().unwrap_or(cursor);
                    depths[root] = Some(0);
                    break 0;
                }
            }
        };

        let mut depth = base;
        for &index in chain.iter().rev() {
            depth += 1;
            depths[index] = Some(depth);
        }
    }

    let mut depths = depths.into_iter().map(|depth| depth.unwrap_or(0)).collect::<Vec<_>>();

    for _ in 0..count {
        let mut changed = false;
        for index in 0..count {
            let Some(parent) = parents[index] else {
                continue;
            };
            let parent_depth = depths[parent.index()];
            if depths[index] < parent_depth {
                warn!(
                    node = %records[index].id,
                    depth = depths[index],
                    parent_depth,
                    "node is shallower than its parent; raising depth"
                );
                depths[index] = parent_depth;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    Ok(depths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LinkRecord, NodeRecord};

    fn node(id: &str, parent: Option<&str>) -> NodeRecord {
        NodeRecord {
            id: id.to_owned(),
            parent: parent.map(str::to_owned),
            ..NodeRecord::default()
        }
    }

    fn link(source: &str, target: &str) -> LinkRecord {
        LinkRecord {
            source: source.to_owned(),
            target: target.to_owned(),
            strength: None,
        }
    }

    #[test]
    fn depths_follow_parent_chain() {
        let dataset = GraphDataset {
            nodes: vec![
                node("shoes/running", Some("shoes")),
                node("root", None),
                node("shoes", Some("root")),
            ],
            links: Vec::new(),
        };
        let graph = GraphData::build(dataset, RadiusConfig::default()).expect("valid graph");
        let depth = |key: &str| graph.node(graph.id_of(key).unwrap()).unwrap().depth;
        assert_eq!(depth("root"), 0);
        assert_eq!(depth("shoes"), 1);
        assert_eq!(depth("shoes/running"), 2);
        // parent references become links
        assert_eq!(graph.links().len(), 2);
    }

    #[test]
    fn self_links_unknown_endpoints_and_duplicates_are_dropped() {
        let dataset = GraphDataset {
            nodes: vec![node("a", None), node("b", None)],
            links: vec![link("a", "a"), link("a", "ghost"), link("a", "b"), link("b", "a")],
        };
        let graph = GraphData::build(dataset, RadiusConfig::default()).expect("valid graph");
        assert_eq!(graph.links().len(), 1);
        let a = graph.id_of("a").unwrap();
        assert_eq!(graph.degree(a), 1);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let dataset = GraphDataset {
            nodes: vec![node("a", None), node("a", None)],
            links: Vec::new(),
        };
        assert_eq!(
            GraphData::build(dataset, RadiusConfig::default()).unwrap_err(),
            GraphError::DuplicateKey("a".to_owned())
        );
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let dataset = GraphDataset {
            nodes: vec![node("a", Some("b")), node("b", Some("a"))],
            links: Vec::new(),
        };
        assert!(matches!(
            GraphData::build(dataset, RadiusConfig::default()),
            Err(GraphError::ParentCycle(_))
        ));
    }

    #[test]
    fn radius_stays_in_configured_range() {
        let mut small = node("small", None);
        small.metric = Some(1.0);
        let mut large = node("large", None);
        large.metric = Some(1_000_000.0);
        let config = RadiusConfig {
            min_radius: 3.0,
            max_radius: 20.0,
        };
        let graph = GraphData::build(
            GraphDataset {
                nodes: vec![small, large],
                links: Vec::new(),
            },
            config,
        )
        .expect("valid graph");
        assert_eq!(graph.nodes()[0].radius, 3.0);
        assert_eq!(graph.nodes()[1].radius, 20.0);
    }
}
