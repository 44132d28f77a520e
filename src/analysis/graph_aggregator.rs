use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::models::graph::{CommunicationEvent, Graph, GraphEdge, GraphNode, GraphOptions};

/// Color for protocols missing from the table
pub const FALLBACK_COLOR: &str = "#DDA0DD";

/// Display color of a protocol class
pub fn protocol_color(protocol: &str) -> &'static str {
    match protocol {
        "TCP" => "#FF6B6B",
        "UDP" => "#4ECDC4",
        "ICMP" => "#45B7D1",
        "ARP" => "#96CEB4",
        "DNS" => "#FECA57",
        "HTTP" => "#FF9FF3",
        "HTTPS" => "#54A0FF",
        _ => FALLBACK_COLOR,
    }
}

/// Most frequent protocol; ties go to the first label in sort order
fn dominant_protocol(protocols: &BTreeMap<String, u64>) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for (label, &count) in protocols {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label.as_str(), count));
        }
    }
    best.map(|(label, _)| label)
}

struct NodeSlot {
    id: String,
    value: u64,
    protocols: BTreeMap<String, u64>,
}

/// Turns communication events into a deduplicated, weighted graph.
///
/// Nodes and edges live in an arena addressed by index; endpoint and pair
/// lookups go through hash maps so each event costs O(1).
pub struct GraphAggregator;

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeSlot>,
    node_index: HashMap<String, usize>,
    edges: HashMap<(usize, usize), u64>,
}

impl Arena {
    fn node(&mut self, id: &str) -> usize {
        if let Some(&index) = self.node_index.get(id) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(NodeSlot {
            id: id.to_string(),
            value: 0,
            protocols: BTreeMap::new(),
        });
        self.node_index.insert(id.to_string(), index);
        index
    }

    fn credit(&mut self, index: usize, weight: u64, protocol: Option<&str>) {
        let slot = &mut self.nodes[index];
        slot.value = slot.value.saturating_add(weight);
        if let Some(protocol) = protocol {
            *slot.protocols.entry(protocol.to_string()).or_insert(0) += 1;
        }
    }
}

impl GraphAggregator {
    /// Build the graph for `events`. Output is sorted by node id and by
    /// edge endpoints, so any permutation of the same events gives the
    /// same graph.
    pub fn build<'a, I>(events: I, options: &GraphOptions) -> Graph
    where
        I: IntoIterator<Item = &'a CommunicationEvent>,
    {
        let mut arena = Arena::default();
        let mut event_count = 0usize;

        for event in events {
            event_count += 1;

            let (from, to) = if options.directed || event.endpoint_a <= event.endpoint_b {
                (&event.endpoint_a, &event.endpoint_b)
            } else {
                (&event.endpoint_b, &event.endpoint_a)
            };

            let from = arena.node(from);
            let to = arena.node(to);
            let protocol = event.protocol_tag.as_deref();

            arena.credit(from, event.weight, protocol);
            // A self-loop credits its single node once
            if to != from {
                arena.credit(to, event.weight, protocol);
            }

            let edge = arena.edges.entry((from, to)).or_insert(0);
            *edge = edge.saturating_add(event.weight);
        }

        let mut edges: Vec<GraphEdge> = arena
            .edges
            .iter()
            .map(|(&(from, to), &value)| GraphEdge {
                from: arena.nodes[from].id.clone(),
                to: arena.nodes[to].id.clone(),
                value,
                width: options.edge_scale.apply(value),
            })
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        let mut nodes: Vec<GraphNode> = arena
            .nodes
            .into_iter()
            .map(|slot| {
                let color = options.protocol_aware.then(|| {
                    dominant_protocol(&slot.protocols)
                        .map(protocol_color)
                        .unwrap_or(FALLBACK_COLOR)
                        .to_string()
                });
                GraphNode {
                    label: slot.id.clone(),
                    size: options.node_scale.apply(slot.value),
                    value: slot.value,
                    protocol_stats: options.protocol_aware.then_some(slot.protocols),
                    color,
                    id: slot.id,
                }
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            "Built graph from {} events: {} nodes, {} edges",
            event_count,
            nodes.len(),
            edges.len()
        );

        Graph { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_colors() {
        assert_eq!(protocol_color("TCP"), "#FF6B6B");
        assert_eq!(protocol_color("HTTPS"), "#54A0FF");
        assert_eq!(protocol_color("tcp"), FALLBACK_COLOR);
        assert_eq!(protocol_color("SCTP"), FALLBACK_COLOR);
    }

    #[test]
    fn test_dominant_protocol_tie_break() {
        let mut counts = BTreeMap::new();
        counts.insert("UDP".to_string(), 2);
        counts.insert("TCP".to_string(), 2);
        counts.insert("ARP".to_string(), 1);
        assert_eq!(dominant_protocol(&counts), Some("TCP"));
        assert_eq!(dominant_protocol(&BTreeMap::new()), None);
    }

    #[test]
    fn test_self_loop_counts_once() {
        let events = vec![CommunicationEvent::new("a", "a", 5)];
        let graph = GraphAggregator::build(&events, &GraphOptions::hosts());
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].value, 5);
        assert_eq!(graph.edge("a", "a").unwrap().value, 5);
    }

    #[test]
    fn test_plain_graph_has_no_protocol_fields() {
        let events = vec![CommunicationEvent::new("a", "b", 1).with_protocol("TCP")];
        let graph = GraphAggregator::build(&events, &GraphOptions::macs());
        assert!(graph.nodes.iter().all(|n| n.color.is_none() && n.protocol_stats.is_none()));
    }
}
