use serde::{Deserialize, Serialize};

use crate::graph::{GraphData, GraphNode, NodeId, NodeStatus};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceWeights {
    pub degree: f32,
    /// Numerator of the `bonus / (depth + 1)` term.
    pub depth_bonus: f32,
    pub depth_bonus_cap: f32,
    /// Weight of the metric normalized against the graph maximum.
    pub metric: f32,
    pub optimal_bonus: f32,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            degree: 2.0,
            depth_bonus: 10.0,
            depth_bonus_cap: 10.0,
            metric: 5.0,
            optimal_bonus: 3.0,
        }
    }
}

pub fn importance(graph: &GraphData, node: &GraphNode, weights: ImportanceWeights) -> f32 {
    let degree = graph.degree(node.id) as f32 * weights.degree;
    let depth = (weights.depth_bonus / (node.depth as f32 + 1.0)).min(weights.depth_bonus_cap);
    let metric = if graph.max_metric() > 0.0 {
        (node.metric / graph.max_metric()) * weights.metric
    } else {
        0.0
    };
    let status = if node.status == NodeStatus::Optimal {
        weights.optimal_bonus
    } else {
        0.0
    };
    let score = degree + depth + metric + status;
    if score.is_finite() { score } else { 0.0 }
}

/// Every node ordered by descending importance; equal scores keep id order.
pub fn rank_nodes(graph: &GraphData, weights: ImportanceWeights) -> Vec<NodeId> {
    let scores = graph
        .nodes()
        .iter()
        .map(|node| importance(graph, node, weights))
        .collect::<Vec<_>>();
    let mut ranking = graph.nodes().iter().map(|node| node.id).collect::<Vec<_>>();
    ranking.sort_by(|a, b| {
        scores[b.index()]
            .total_cmp(&scores[a.index()])
            .then_with(|| a.cmp(b))
    });
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphDataset, LinkRecord, NodeRecord, RadiusConfig};

    fn record(id: &str, depth: u32, metric: f32, status: NodeStatus) -> NodeRecord {
        NodeRecord {
            id: id.to_owned(),
            depth: Some(depth),
            metric: Some(metric),
            status,
            ..NodeRecord::default()
        }
    }

    #[test]
    fn degree_depth_metric_and_status_all_raise_rank() {
        let dataset = GraphDataset {
            nodes: vec![
                record("leaf", 3, 1.0, NodeStatus::Unknown),
                record("hub", 3, 1.0, NodeStatus::Unknown),
                record("a", 3, 1.0, NodeStatus::Unknown),
                record("b", 3, 1.0, NodeStatus::Unknown),
                record("shallow", 0, 1.0, NodeStatus::Unknown),
                record("big", 3, 1000.0, NodeStatus::Unknown),
                record("optimal", 3, 1.0, NodeStatus::Optimal),
            ],
            links: vec![
                LinkRecord {
                    source: "hub".into(),
                    target: "a".into(),
                    strength: None,
                },
                LinkRecord {
                    source: "hub".into(),
                    target: "b".into(),
                    strength: None,
                },
            ],
        };
        let graph = crate::graph::GraphData::build(dataset, RadiusConfig::default()).unwrap();
        let weights = ImportanceWeights::default();
        let score = |key: &str| importance(&graph, graph.node(graph.id_of(key).unwrap()).unwrap(), weights);

        assert!(score("hub") > score("a"));
        assert!(score("a") > score("leaf"));
        assert!(score("shallow") > score("leaf"));
        assert!(score("big") > score("leaf"));
        assert!(score("optimal") > score("leaf"));
    }

    #[test]
    fn ranking_is_deterministic_with_id_tie_break() {
        let dataset = GraphDataset {
            nodes: (0..6)
                .map(|index| record(&format!("n{index}"), 2, 5.0, NodeStatus::Unknown))
                .collect(),
            links: Vec::new(),
        };
        let graph = crate::graph::GraphData::build(dataset, RadiusConfig::default()).unwrap();
        let first = rank_nodes(&graph, ImportanceWeights::default());
        let second = rank_nodes(&graph, ImportanceWeights::default());
        assert_eq!(first, second);
        assert_eq!(first, (0..6).map(NodeId).collect::<Vec<_>>());
    }
}
