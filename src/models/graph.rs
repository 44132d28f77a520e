use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::packet::PacketRecord;
use crate::utils::error::{AppError, AppResult};

/// Which endpoint identifiers a communication graph is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Network addresses
    Host,
    /// Hardware addresses
    Mac,
}

/// What a single packet contributes to an event's weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightMode {
    Packets,
    Bytes,
}

/// One observed exchange between two endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationEvent {
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub weight: u64,
    #[serde(default)]
    pub protocol_tag: Option<String>,
}

impl CommunicationEvent {
    pub fn new(endpoint_a: impl Into<String>, endpoint_b: impl Into<String>, weight: u64) -> Self {
        Self {
            endpoint_a: endpoint_a.into(),
            endpoint_b: endpoint_b.into(),
            weight,
            protocol_tag: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol_tag = Some(protocol.into());
        self
    }

    /// Derive an event from a packet, or `None` when either endpoint is missing
    pub fn from_record(record: &PacketRecord, kind: EndpointKind, mode: WeightMode) -> Option<Self> {
        let (a, b) = match kind {
            EndpointKind::Host => (record.source_ip.as_ref()?, record.destination_ip.as_ref()?),
            EndpointKind::Mac => (record.source_mac.as_ref()?, record.destination_mac.as_ref()?),
        };

        // Hardware addresses are case-insensitive identifiers
        let (a, b) = match kind {
            EndpointKind::Mac => (a.to_lowercase(), b.to_lowercase()),
            EndpointKind::Host => (a.clone(), b.clone()),
        };

        let weight = match mode {
            WeightMode::Packets => 1,
            WeightMode::Bytes => record.length,
        };

        Some(Self::new(a, b, weight).with_protocol(record.protocol.clone()))
    }
}

/// Linear scale clamped into an inclusive display range. Deserialized
/// scales are validated the same way as `Scale::new`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScaleFields")]
pub struct Scale {
    divisor: f64,
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct ScaleFields {
    divisor: f64,
    min: f64,
    max: f64,
}

impl TryFrom<ScaleFields> for Scale {
    type Error = AppError;

    fn try_from(fields: ScaleFields) -> AppResult<Self> {
        Scale::new(fields.divisor, fields.min, fields.max)
    }
}

impl Scale {
    pub fn new(divisor: f64, min: f64, max: f64) -> AppResult<Self> {
        if !(divisor.is_finite() && divisor > 0.0) {
            return Err(AppError::ConfigError(format!(
                "scale divisor must be positive, got {}",
                divisor
            )));
        }
        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(AppError::ConfigError(format!(
                "scale range [{}, {}] is empty",
                min, max
            )));
        }
        Ok(Self { divisor, min, max })
    }

    const fn fixed(divisor: f64, min: f64, max: f64) -> Self {
        Self { divisor, min, max }
    }

    /// `value / divisor` clamped to `[min, max]`
    pub fn apply(&self, value: u64) -> f64 {
        (value as f64 / self.divisor).clamp(self.min, self.max)
    }
}

/// How a graph is built and scaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Keep `(A, B)` and `(B, A)` as separate edges
    pub directed: bool,
    /// Accumulate protocol breakdowns and assign protocol colors
    pub protocol_aware: bool,
    pub node_scale: Scale,
    pub edge_scale: Scale,
}

impl GraphOptions {
    /// Undirected host-to-host graph
    pub fn hosts() -> Self {
        Self {
            directed: false,
            protocol_aware: false,
            node_scale: Scale::fixed(1.0, 10.0, 30.0),
            edge_scale: Scale::fixed(1.0, 1.0, 10.0),
        }
    }

    /// Undirected device-to-device graph
    pub fn macs() -> Self {
        Self::hosts()
    }

    /// Directed, colored device graph rendered with arrowheads
    pub fn protocol_aware() -> Self {
        Self {
            directed: true,
            protocol_aware: true,
            node_scale: Scale::fixed(10.0, 10.0, 50.0),
            edge_scale: Scale::fixed(5.0, 1.0, 10.0),
        }
    }
}

/// One unique endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Sum of incident event weights
    pub value: u64,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_stats: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One unique endpoint pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Sum of event weights between the pair
    pub value: u64,
    pub width: f64,
}

/// Nodes and edges handed to the rendering layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
    }
}
