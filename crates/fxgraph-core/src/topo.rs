//! Deterministic topological ordering of the node graph.

use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::error::GraphError;
use crate::types::{NodeId, NodeSpec};

/// Order nodes so every node appears after all of its inputs.
///
/// Kahn's algorithm over declaration-order indices, so the tie-break is
/// stable: re-running on an unchanged graph yields the same order.
/// Edges from node ids not present in `nodes` are ignored; evaluation
/// treats them as unconnected inputs.
pub fn topo_order(nodes: &[NodeSpec]) -> Result<Vec<NodeId>, GraphError> {
    let index_of: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut indegree = vec![0usize; nodes.len()];
    let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        for conns in node.inputs.values() {
            for conn in conns {
                if let Some(&src) = index_of.get(conn.node_id.as_str()) {
                    downstream[src].push(i);
                    indegree[i] += 1;
                }
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(i) = queue.pop_front() {
        order.push(nodes[i].id.clone());
        for &next in &downstream[i] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(GraphError::CycleDetected);
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphSpec, InputConnection, NodeKind};

    fn wired(id: &str, kind: NodeKind, input: &str, from: &str) -> NodeSpec {
        let mut node = NodeSpec::new(id, kind);
        node.inputs
            .insert(input.to_string(), vec![InputConnection::new(from, "color")]);
        node
    }

    #[test]
    fn it_should_order_inputs_before_consumers() {
        let spec = GraphSpec {
            nodes: vec![
                wired("canvas", NodeKind::Canvas, "color", "webcam"),
                NodeSpec::new("webcam", NodeKind::Webcam),
            ],
        };
        let order = topo_order(&spec.nodes).expect("acyclic");
        let webcam = order.iter().position(|id| id == "webcam").expect("present");
        let canvas = order.iter().position(|id| id == "canvas").expect("present");
        assert!(webcam < canvas);
    }

    #[test]
    fn it_should_detect_cycles() {
        let spec = GraphSpec {
            nodes: vec![
                wired("a", NodeKind::Blend, "color_a", "b"),
                wired("b", NodeKind::Blend, "color_a", "a"),
            ],
        };
        assert_eq!(topo_order(&spec.nodes), Err(GraphError::CycleDetected));
    }

    #[test]
    fn it_should_ignore_dangling_edges() {
        let spec = GraphSpec {
            nodes: vec![wired("canvas", NodeKind::Canvas, "color", "gone")],
        };
        let order = topo_order(&spec.nodes).expect("acyclic");
        assert_eq!(order, vec!["canvas".to_string()]);
    }
}
