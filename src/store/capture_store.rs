use dashmap::DashMap;
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::models::packet::PacketRecord;
use crate::models::stats::Dashboard;
use crate::utils::error::{AppError, AppResult};

/// A decoded capture loaded into memory
#[derive(Debug, Clone)]
pub struct Capture {
    /// Identifier used in URLs and sent to the report service
    pub id: String,

    /// Packets in capture order
    pub packets: Vec<PacketRecord>,

    /// Pre-aggregated dashboard panels
    pub dashboard: Dashboard,

    /// File the capture was loaded from, served back as-is on request
    pub source: Option<PathBuf>,
}

/// Listing entry for a loaded capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureInfo {
    pub id: String,
    pub packet_count: usize,
}

/// One page of a filtered packet table
#[derive(Debug, Clone, Serialize)]
pub struct PacketPage {
    pub packets: Vec<PacketRecord>,
    /// Number of packets matching the predicate across all pages
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Read-only store of loaded captures.
///
/// Filtering never installs state here: each query receives its predicate
/// as an argument and nothing outlives the call.
#[derive(Default)]
pub struct CaptureStore {
    captures: DashMap<String, Arc<Capture>>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capture, replacing any previous one with the same id
    pub fn insert(&self, capture: Capture) {
        self.captures.insert(capture.id.clone(), Arc::new(capture));
    }

    /// Loaded captures sorted by id
    pub fn list(&self) -> Vec<CaptureInfo> {
        let mut captures: Vec<CaptureInfo> = self
            .captures
            .iter()
            .map(|entry| CaptureInfo {
                id: entry.key().clone(),
                packet_count: entry.value().packets.len(),
            })
            .collect();
        captures.sort_by(|a, b| a.id.cmp(&b.id));
        captures
    }

    pub fn get(&self, id: &str) -> AppResult<Arc<Capture>> {
        self.captures
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::CaptureNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Page through the packets of a capture that satisfy `predicate`
    pub fn query<F>(&self, id: &str, predicate: F, offset: usize, limit: usize) -> AppResult<PacketPage>
    where
        F: Fn(&PacketRecord) -> bool,
    {
        let capture = self.get(id)?;

        let mut total = 0usize;
        let mut packets = Vec::with_capacity(limit.min(capture.packets.len()));
        for record in capture.packets.iter().filter(|record| predicate(record)) {
            if total >= offset && packets.len() < limit {
                packets.push(record.clone());
            }
            total += 1;
        }

        debug!(
            "Query on {}: {} matches, returning {} (offset: {}, limit: {})",
            id,
            total,
            packets.len(),
            offset,
            limit
        );

        Ok(PacketPage {
            packets,
            total,
            offset,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn capture(id: &str, lengths: &[u64]) -> Capture {
        let packets = lengths
            .iter()
            .enumerate()
            .map(|(i, &length)| PacketRecord {
                number: i as u64 + 1,
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, i as u32)
                    .unwrap(),
                length,
                source_mac: None,
                destination_mac: None,
                source_ip: None,
                destination_ip: None,
                protocol: "UDP".to_string(),
                ports: vec![],
            })
            .collect();
        Capture {
            id: id.to_string(),
            packets,
            dashboard: Dashboard::default(),
            source: None,
        }
    }

    #[test]
    fn test_query_pages_matches() {
        let store = CaptureStore::new();
        store.insert(capture("x.json", &[10, 200, 300, 20, 400]));

        let page = store.query("x.json", |r| r.length >= 100, 1, 1).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.packets.len(), 1);
        assert_eq!(page.packets[0].length, 300);
    }

    #[test]
    fn test_queries_do_not_leak_predicates() {
        let store = CaptureStore::new();
        store.insert(capture("x.json", &[10, 200]));

        let narrowed = store.query("x.json", |r| r.length > 100, 0, 10).unwrap();
        let unfiltered = store.query("x.json", |_| true, 0, 10).unwrap();
        assert_eq!(narrowed.total, 1);
        assert_eq!(unfiltered.total, 2);
    }

    #[test]
    fn test_unknown_capture() {
        let store = CaptureStore::new();
        assert!(matches!(store.get("nope"), Err(AppError::CaptureNotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_sorted() {
        let store = CaptureStore::new();
        store.insert(capture("b.json", &[1]));
        store.insert(capture("a.json", &[1, 2]));
        let ids: Vec<_> = store.list().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["a.json", "b.json"]);
        assert_eq!(store.len(), 2);
    }
}
