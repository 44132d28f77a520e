use log::{info, warn};
use std::fs;
use std::path::Path;

use crate::models::packet::{DecodedPacket, PacketRecord};
use crate::models::stats::Dashboard;
use crate::store::capture_store::Capture;
use crate::utils::error::{AppError, AppResult};

/// Build a capture from a decoded capture document.
///
/// The document is either an array of decoded packets or an object with a
/// `packets` array and an optional `dashboard` panel object. Individual
/// packets that cannot be decoded are skipped.
pub fn parse_capture(id: &str, document: serde_json::Value) -> AppResult<Capture> {
    let malformed = |reason: String| AppError::MalformedInput {
        panel: id.to_string(),
        reason,
    };

    let (packets, panels) = match document {
        serde_json::Value::Array(packets) => (packets, serde_json::Value::Null),
        serde_json::Value::Object(mut object) => {
            if let Some(error) = object.get("error") {
                return Err(malformed(format!("decoder reported an error: {}", error)));
            }
            let packets = match object.remove("packets") {
                Some(serde_json::Value::Array(packets)) => packets,
                Some(_) => return Err(malformed("'packets' is not an array".to_string())),
                None => return Err(malformed("no 'packets' array".to_string())),
            };
            let panels = object.remove("dashboard").unwrap_or(serde_json::Value::Null);
            (packets, panels)
        }
        _ => return Err(malformed("expected an array or object".to_string())),
    };

    let total = packets.len();
    let records: Vec<PacketRecord> = packets
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value::<DecodedPacket>(value)
                .map_err(AppError::from)
                .and_then(PacketRecord::try_from)
                .map_err(|e| warn!("Skipping packet in {}: {}", id, e))
                .ok()
        })
        .collect();

    if records.len() < total {
        warn!(
            "Capture {}: {} of {} packets could not be decoded",
            id,
            total - records.len(),
            total
        );
    }

    Ok(Capture {
        id: id.to_string(),
        packets: records,
        dashboard: Dashboard::from_panels(&panels),
        source: None,
    })
}

/// Load one capture file; its file name becomes the capture id
pub fn load_capture_file(path: &Path) -> AppResult<Capture> {
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::ConfigError(format!("{} is not a file", path.display())))?;

    let content = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    let mut capture = parse_capture(&id, document)?;
    capture.source = Some(path.to_path_buf());
    Ok(capture)
}

/// Load every `*.json` capture in `dir`, skipping files that fail
pub fn load_capture_dir(dir: &Path) -> AppResult<Vec<Capture>> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    let mut captures = Vec::with_capacity(paths.len());
    for path in paths {
        match load_capture_file(&path) {
            Ok(capture) => {
                info!(
                    "Loaded capture {} ({} packets)",
                    capture.id,
                    capture.packets.len()
                );
                captures.push(capture);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(captures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_document() {
        let capture = parse_capture(
            "a.json",
            json!([
                {"packet_number": 1, "time": "2024-03-01 10:00:00", "length": 60,
                 "ip": {"src": "10.0.0.1", "dst": "10.0.0.2", "proto": 17, "ttl": 64},
                 "udp": {"sport": 5353, "dport": 53, "len": 40}},
                {"packet_number": 2, "time": "garbage", "length": 60},
                {"unexpected": true}
            ]),
        )
        .unwrap();

        assert_eq!(capture.packets.len(), 1);
        assert_eq!(capture.packets[0].protocol, "UDP");
        assert!(capture.dashboard.omitted.is_empty());
    }

    #[test]
    fn test_object_document_with_dashboard() {
        let capture = parse_capture(
            "b.json",
            json!({
                "packets": [],
                "dashboard": {"vendors": {"Intel": 3}, "geo": "not a list"}
            }),
        )
        .unwrap();

        assert_eq!(capture.dashboard.vendors.as_ref().unwrap()["Intel"], 3);
        assert_eq!(capture.dashboard.omitted, vec!["geo".to_string()]);
    }

    #[test]
    fn test_decoder_error_document() {
        let result = parse_capture("c.json", json!({"error": "bad pcap"}));
        assert!(matches!(result, Err(AppError::MalformedInput { .. })));
    }

    #[test]
    fn test_loaded_capture_remembers_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        fs::write(&path, "[]").unwrap();

        let capture = load_capture_file(&path).unwrap();
        assert_eq!(capture.id, "d.json");
        assert_eq!(capture.source.as_deref(), Some(path.as_path()));
        assert!(parse_capture("d.json", json!([])).unwrap().source.is_none());
    }
}
