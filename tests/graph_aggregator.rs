use sharkview::analysis::graph_aggregator::FALLBACK_COLOR;
use sharkview::models::graph::{EndpointKind, Scale, WeightMode};
use sharkview::{CommunicationEvent, GraphAggregator, GraphOptions, PacketRecord};

fn events() -> Vec<CommunicationEvent> {
    vec![
        CommunicationEvent::new("10.0.0.1", "10.0.0.2", 3).with_protocol("TCP"),
        CommunicationEvent::new("10.0.0.2", "10.0.0.1", 4).with_protocol("TCP"),
        CommunicationEvent::new("10.0.0.1", "10.0.0.3", 2).with_protocol("UDP"),
        CommunicationEvent::new("10.0.0.3", "10.0.0.4", 9).with_protocol("SCTP"),
        CommunicationEvent::new("10.0.0.4", "10.0.0.3", 1).with_protocol("ARP"),
    ]
}

/// Every permutation of `items`, by Heap's algorithm
fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    fn heap<T: Clone>(k: usize, items: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        heap(k - 1, items, out);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
            heap(k - 1, items, out);
        }
    }

    let mut items = items.to_vec();
    let mut out = Vec::new();
    let len = items.len();
    heap(len, &mut items, &mut out);
    out
}

#[test]
fn repeated_pair_accumulates_into_one_edge() {
    let events = vec![
        CommunicationEvent::new("a", "b", 3),
        CommunicationEvent::new("a", "b", 4),
    ];
    let graph = GraphAggregator::build(&events, &GraphOptions::hosts());

    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].value, 7);
    assert_eq!(graph.node("a").unwrap().value, 7);
    assert_eq!(graph.node("b").unwrap().value, 7);
}

#[test]
fn undirected_graph_merges_reverse_pairs() {
    let graph = GraphAggregator::build(&events(), &GraphOptions::hosts());

    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);
    assert_eq!(graph.edge("10.0.0.1", "10.0.0.2").unwrap().value, 7);
    assert_eq!(graph.edge("10.0.0.3", "10.0.0.4").unwrap().value, 10);
    assert!(graph.edge("10.0.0.2", "10.0.0.1").is_none());
    assert_eq!(graph.node("10.0.0.1").unwrap().value, 9);
}

#[test]
fn directed_graph_keeps_reverse_pairs_apart() {
    let graph = GraphAggregator::build(&events(), &GraphOptions::protocol_aware());

    assert_eq!(graph.edges.len(), 5);
    assert_eq!(graph.edge("10.0.0.1", "10.0.0.2").unwrap().value, 3);
    assert_eq!(graph.edge("10.0.0.2", "10.0.0.1").unwrap().value, 4);
    // Node totals do not depend on direction
    assert_eq!(graph.node("10.0.0.1").unwrap().value, 9);
}

#[test]
fn result_is_independent_of_event_order() {
    for options in [GraphOptions::hosts(), GraphOptions::protocol_aware()] {
        let expected = GraphAggregator::build(&events(), &options);
        for permutation in permutations(&events()) {
            assert_eq!(GraphAggregator::build(&permutation, &options), expected);
        }
    }
}

#[test]
fn derived_scales_stay_in_range() {
    let options = GraphOptions::protocol_aware();
    let events = vec![
        CommunicationEvent::new("big", "small", 1_000_000),
        CommunicationEvent::new("tiny", "small", 0),
    ];
    let graph = GraphAggregator::build(&events, &options);

    assert_eq!(graph.node("big").unwrap().size, 50.0);
    assert_eq!(graph.node("tiny").unwrap().size, 10.0);
    assert_eq!(graph.edge("big", "small").unwrap().width, 10.0);
    assert_eq!(graph.edge("tiny", "small").unwrap().width, 1.0);

    for node in &graph.nodes {
        assert!((10.0..=50.0).contains(&node.size));
    }
}

#[test]
fn linear_region_of_scale() {
    let options = GraphOptions {
        directed: false,
        protocol_aware: false,
        node_scale: Scale::new(10.0, 10.0, 50.0).unwrap(),
        edge_scale: Scale::new(5.0, 1.0, 10.0).unwrap(),
    };
    let graph = GraphAggregator::build(&[CommunicationEvent::new("a", "b", 300)], &options);
    assert_eq!(graph.node("a").unwrap().size, 30.0);
    assert_eq!(graph.edges[0].width, 10.0);

    let graph = GraphAggregator::build(&[CommunicationEvent::new("a", "b", 30)], &options);
    assert_eq!(graph.edges[0].width, 6.0);
}

#[test]
fn protocol_breakdown_and_colors() {
    let graph = GraphAggregator::build(&events(), &GraphOptions::protocol_aware());

    let first = graph.node("10.0.0.1").unwrap();
    let stats = first.protocol_stats.as_ref().unwrap();
    assert_eq!(stats["TCP"], 2);
    assert_eq!(stats["UDP"], 1);
    assert_eq!(first.color.as_deref(), Some("#FF6B6B"));

    // ARP (1) vs SCTP (1) vs UDP (1): tie resolved by label order
    let third = graph.node("10.0.0.3").unwrap();
    assert_eq!(third.color.as_deref(), Some("#96CEB4"));

    // Only SCTP and ARP seen, one each; ARP sorts first
    let fourth = graph.node("10.0.0.4").unwrap();
    assert_eq!(fourth.color.as_deref(), Some("#96CEB4"));
}

#[test]
fn untagged_events_get_fallback_color() {
    let events = vec![CommunicationEvent::new("a", "b", 1)];
    let graph = GraphAggregator::build(&events, &GraphOptions::protocol_aware());
    assert!(graph
        .nodes
        .iter()
        .all(|n| n.color.as_deref() == Some(FALLBACK_COLOR)));
}

#[test]
fn events_from_packets() {
    let record: PacketRecord = serde_json::from_value(serde_json::json!({
        "number": 1,
        "timestamp": "2024-05-10 12:00:00",
        "length": 1500,
        "source_mac": "AA:BB:CC:DD:EE:FF",
        "destination_mac": "11:22:33:44:55:66",
        "source_ip": null,
        "destination_ip": null,
        "protocol": "ARP",
        "ports": []
    }))
    .unwrap();

    assert!(CommunicationEvent::from_record(&record, EndpointKind::Host, WeightMode::Packets).is_none());

    let event = CommunicationEvent::from_record(&record, EndpointKind::Mac, WeightMode::Bytes).unwrap();
    assert_eq!(event.endpoint_a, "aa:bb:cc:dd:ee:ff");
    assert_eq!(event.weight, 1500);
    assert_eq!(event.protocol_tag.as_deref(), Some("ARP"));
}

#[test]
fn empty_input_gives_empty_graph() {
    let graph = GraphAggregator::build(&Vec::<CommunicationEvent>::new(), &GraphOptions::macs());
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
}
