use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::models::packet::PacketRecord;

/// Number of entries kept in the top-address and top-port lists
pub const TOP_LIMIT: usize = 10;

/// A value and how many packets referenced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked<T> {
    pub key: T,
    pub count: u64,
}

/// Headline statistics of one capture
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureSummary {
    /// Total number of packets in the capture
    pub total_packets: usize,

    /// Total bytes across all packets
    pub total_bytes: u64,

    /// Packets per protocol
    pub protocols: BTreeMap<String, u64>,

    /// Most referenced network addresses, source and destination both counted
    pub top_ips: Vec<Ranked<String>>,

    /// Most referenced ports, source and destination both counted
    pub top_ports: Vec<Ranked<u16>>,
}

fn top<T: Ord + Clone>(counts: HashMap<T, u64>) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = counts
        .into_iter()
        .map(|(key, count)| Ranked { key, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(TOP_LIMIT);
    ranked
}

fn bump<T: Eq + Hash>(counts: &mut HashMap<T, u64>, key: T) {
    *counts.entry(key).or_insert(0) += 1;
}

impl CaptureSummary {
    pub fn from_records(records: &[PacketRecord]) -> Self {
        let mut protocols = BTreeMap::new();
        let mut ips = HashMap::new();
        let mut ports = HashMap::new();
        let mut total_bytes = 0u64;

        for record in records {
            total_bytes = total_bytes.saturating_add(record.length);
            *protocols.entry(record.protocol.clone()).or_insert(0) += 1;

            for ip in [&record.source_ip, &record.destination_ip].into_iter().flatten() {
                bump(&mut ips, ip.clone());
            }
            for &port in &record.ports {
                bump(&mut ports, port);
            }
        }

        Self {
            total_packets: records.len(),
            total_bytes,
            protocols,
            top_ips: top(ips),
            top_ports: top(ports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(src: &str, dst: &str, protocol: &str, ports: Vec<u16>, length: u64) -> PacketRecord {
        PacketRecord {
            number: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            length,
            source_mac: None,
            destination_mac: None,
            source_ip: Some(src.to_string()),
            destination_ip: Some(dst.to_string()),
            protocol: protocol.to_string(),
            ports,
        }
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            record("10.0.0.1", "10.0.0.2", "TCP", vec![1000, 80], 100),
            record("10.0.0.2", "10.0.0.1", "TCP", vec![80, 1000], 200),
            record("10.0.0.1", "10.0.0.3", "UDP", vec![5353, 53], 50),
        ];
        let summary = CaptureSummary::from_records(&records);

        assert_eq!(summary.total_packets, 3);
        assert_eq!(summary.total_bytes, 350);
        assert_eq!(summary.protocols["TCP"], 2);
        assert_eq!(
            summary.top_ips[0],
            Ranked {
                key: "10.0.0.1".to_string(),
                count: 3
            }
        );
        // 80 and 1000 tie at 2; lower port first
        assert_eq!(summary.top_ports[0].key, 80);
        assert_eq!(summary.top_ports[1].key, 1000);
    }

    #[test]
    fn test_top_is_truncated() {
        let records: Vec<PacketRecord> = (0..15)
            .map(|i| record(&format!("10.0.1.{}", i), "10.0.0.254", "UDP", vec![], 1))
            .collect();
        let summary = CaptureSummary::from_records(&records);
        assert_eq!(summary.top_ips.len(), TOP_LIMIT);
        assert_eq!(summary.top_ips[0].key, "10.0.0.254");
    }
}
