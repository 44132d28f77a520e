use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::graph::Graph;
use crate::utils::error::AppError;

/// Packets per port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortCount {
    pub port: u16,
    pub count: u64,
}

/// Packets per hardware address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacCount {
    pub mac: String,
    pub count: u64,
}

/// Labelled buckets (time or size histograms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buckets {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadStats {
    pub avg: f64,
    pub max: u64,
    pub min: u64,
    #[serde(alias = "total_payload_bytes")]
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSeries {
    pub time_labels: Vec<String>,
    pub bytes_per_second: Vec<f64>,
    pub packets_per_second: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLoad {
    pub total_bytes: u64,
    pub header_overhead: u64,
    #[serde(alias = "payload_efficiency")]
    pub payload_efficiency_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub ip: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub city: Option<String>,
    pub packet_count: u64,
}

/// Pre-aggregated statistics shown around the packet table.
///
/// Every panel is optional: a panel missing from the input, or one that
/// fails to parse, is left out and the rest of the dashboard still renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<PortCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macs: Option<Vec<MacCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendors: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_buckets: Option<Buckets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_buckets: Option<Buckets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_payload: Option<BTreeMap<String, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_load: Option<NetworkLoad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_graph: Option<Graph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_graph: Option<Graph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_graph: Option<Graph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Vec<GeoLocation>>,

    /// Panels that were present but could not be parsed
    pub omitted: Vec<String>,
}

impl Dashboard {
    /// Parse each panel of a `{panel_name: data}` object independently
    pub fn from_panels(panels: &serde_json::Value) -> Self {
        let mut dashboard = Dashboard::default();

        let Some(object) = panels.as_object() else {
            if !panels.is_null() {
                warn!("Dashboard panels are not an object, skipping all panels");
                dashboard.omitted.push("dashboard".to_string());
            }
            return dashboard;
        };

        let mut omitted = Vec::new();
        dashboard.protocols = parse_panel(object, "protocols", &mut omitted);
        dashboard.ports = parse_panel(object, "ports", &mut omitted);
        dashboard.macs = parse_panel(object, "macs", &mut omitted);
        dashboard.vendors = parse_panel(object, "vendors", &mut omitted);
        dashboard.time_buckets = parse_panel(object, "time_buckets", &mut omitted);
        dashboard.size_buckets = parse_panel(object, "size_buckets", &mut omitted);
        dashboard.payload = parse_panel(object, "payload", &mut omitted);
        dashboard.throughput = parse_panel(object, "throughput", &mut omitted);
        dashboard.protocol_payload = parse_panel(object, "protocol_payload", &mut omitted);
        dashboard.network_load = parse_panel(object, "network_load", &mut omitted);
        dashboard.host_graph = parse_panel(object, "host_graph", &mut omitted);
        dashboard.mac_graph = parse_panel(object, "mac_graph", &mut omitted);
        dashboard.protocol_graph = parse_panel(object, "protocol_graph", &mut omitted);
        dashboard.geo = parse_panel(object, "geo", &mut omitted);

        dashboard.omitted = omitted;
        dashboard
    }
}

fn parse_panel<T: DeserializeOwned>(
    panels: &serde_json::Map<String, serde_json::Value>,
    name: &str,
    omitted: &mut Vec<String>,
) -> Option<T> {
    let value = panels.get(name)?;
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            omitted.push(name.to_string());
            let err = AppError::MalformedInput {
                panel: name.to_string(),
                reason: e.to_string(),
            };
            warn!("{}; panel omitted", err);
            None
        }
    }
}
