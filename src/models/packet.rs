use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// Ethertype carried by ARP frames
const ETHERTYPE_ARP: u64 = 0x0806;

/// IP protocol number for ICMP
const IP_PROTO_ICMP: u64 = 1;

/// One decoded packet as shown in the packet table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Position of the packet in the capture (1-based)
    pub number: u64,

    /// Capture time of the packet
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    /// Length of the packet in bytes
    pub length: u64,

    /// Layer 2 source (MAC address)
    pub source_mac: Option<String>,

    /// Layer 2 destination (MAC address)
    pub destination_mac: Option<String>,

    /// Source network address
    pub source_ip: Option<String>,

    /// Destination network address
    pub destination_ip: Option<String>,

    /// Protocol label (e.g., TCP, UDP, ICMP, ARP)
    pub protocol: String,

    /// Ports associated with the packet, source first
    #[serde(default)]
    pub ports: Vec<u16>,
}

impl PacketRecord {
    /// Ports rendered the way the packet table shows them
    pub fn ports_display(&self) -> String {
        self.ports
            .iter()
            .map(|port| port.to_string())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// Every displayed column joined into one line, used by the quick search
    pub fn row_text(&self) -> String {
        [
            self.number.to_string(),
            timestamp_format::render(&self.timestamp),
            self.source_mac.clone().unwrap_or_default(),
            self.destination_mac.clone().unwrap_or_default(),
            self.source_ip.clone().unwrap_or_default(),
            self.destination_ip.clone().unwrap_or_default(),
            self.protocol.clone(),
            self.ports_display(),
            self.length.to_string(),
        ]
        .join(" ")
    }
}

/// Parse a capture or filter-form time value.
///
/// Accepts the decoder's `YYYY-MM-DD HH:MM:SS[.ffffff]` form, the ISO `T`
/// form, minute precision (as sent by datetime inputs) and bare dates.
/// Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Serde adapter for capture timestamps
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn render(timestamp: &NaiveDateTime) -> String {
        timestamp.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&render(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp '{}'", raw)))
    }
}

/// Ethernet layer of a decoded packet
#[derive(Debug, Clone, Deserialize)]
pub struct EthernetLayer {
    pub src: Option<String>,
    pub dst: Option<String>,
    /// Ethertype, numeric or textual depending on the decoder
    #[serde(rename = "type", default)]
    pub ether_type: Option<serde_json::Value>,
    #[serde(default)]
    pub src_vendor: Option<String>,
    #[serde(default)]
    pub dst_vendor: Option<String>,
}

/// IP layer of a decoded packet
#[derive(Debug, Clone, Deserialize)]
pub struct IpLayer {
    pub src: String,
    pub dst: String,
    #[serde(default)]
    pub proto: Option<u64>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

/// Transport layer ports (TCP or UDP) of a decoded packet
#[derive(Debug, Clone, Deserialize)]
pub struct TransportLayer {
    pub sport: u16,
    pub dport: u16,
}

/// A packet as written by the capture decoder, with one object per layer
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedPacket {
    pub packet_number: u64,
    pub time: String,
    pub length: u64,
    #[serde(default)]
    pub ethernet: Option<EthernetLayer>,
    #[serde(default)]
    pub ip: Option<IpLayer>,
    #[serde(default)]
    pub tcp: Option<TransportLayer>,
    #[serde(default)]
    pub udp: Option<TransportLayer>,
}

impl DecodedPacket {
    fn protocol_label(&self) -> &'static str {
        if self.tcp.is_some() {
            return "TCP";
        }
        if self.udp.is_some() {
            return "UDP";
        }
        if let Some(ip) = &self.ip {
            if ip.proto == Some(IP_PROTO_ICMP) {
                return "ICMP";
            }
            return "Other";
        }

        let ether_type = self
            .ethernet
            .as_ref()
            .and_then(|eth| eth.ether_type.as_ref())
            .and_then(|value| match value {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => {
                    let s = s.trim();
                    s.strip_prefix("0x")
                        .map(|hex| u64::from_str_radix(hex, 16).ok())
                        .unwrap_or_else(|| s.parse().ok())
                }
                _ => None,
            });

        match ether_type {
            Some(ETHERTYPE_ARP) => "ARP",
            _ => "Other",
        }
    }
}

impl TryFrom<DecodedPacket> for PacketRecord {
    type Error = AppError;

    fn try_from(packet: DecodedPacket) -> AppResult<Self> {
        let timestamp = parse_timestamp(&packet.time).ok_or_else(|| AppError::MalformedInput {
            panel: "packets".to_string(),
            reason: format!(
                "packet {} has unrecognized time '{}'",
                packet.packet_number, packet.time
            ),
        })?;

        let protocol = packet.protocol_label().to_string();
        let ports = packet
            .tcp
            .as_ref()
            .or(packet.udp.as_ref())
            .map(|layer| vec![layer.sport, layer.dport])
            .unwrap_or_default();

        let (source_mac, destination_mac) = match packet.ethernet {
            Some(eth) => (eth.src, eth.dst),
            None => (None, None),
        };
        let (source_ip, destination_ip) = match packet.ip {
            Some(ip) => (Some(ip.src), Some(ip.dst)),
            None => (None, None),
        };

        Ok(PacketRecord {
            number: packet.packet_number,
            timestamp,
            length: packet.length,
            source_mac,
            destination_mac,
            source_ip,
            destination_ip,
            protocol,
            ports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> PacketRecord {
        let packet: DecodedPacket = serde_json::from_value(value).unwrap();
        PacketRecord::try_from(packet).unwrap()
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01 10:15:30.123456").is_some());
        assert!(parse_timestamp("2024-03-01T10:15:30").is_some());
        assert!(parse_timestamp("2024-03-01T10:15").is_some());
        assert_eq!(
            parse_timestamp("2024-03-01"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_tcp_packet_flattening() {
        let record = decode(json!({
            "packet_number": 7,
            "time": "2024-03-01 10:15:30.5",
            "length": 74,
            "ethernet": {"src": "AA:BB:CC:00:00:01", "dst": "aa:bb:cc:00:00:02", "type": 2048},
            "ip": {"src": "10.0.0.1", "dst": "10.0.0.2", "proto": 6, "ttl": 64},
            "tcp": {"sport": 51000, "dport": 443, "flags": "S", "seq": 1, "ack": 0}
        }));

        assert_eq!(record.protocol, "TCP");
        assert_eq!(record.ports, vec![51000, 443]);
        assert_eq!(record.ports_display(), "51000 → 443");
        assert_eq!(record.source_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.source_mac.as_deref(), Some("AA:BB:CC:00:00:01"));
    }

    #[test]
    fn test_non_transport_labels() {
        let icmp = decode(json!({
            "packet_number": 1, "time": "2024-03-01 10:00:00", "length": 98,
            "ip": {"src": "10.0.0.1", "dst": "10.0.0.9", "proto": 1, "ttl": 64}
        }));
        assert_eq!(icmp.protocol, "ICMP");
        assert!(icmp.ports.is_empty());

        let arp = decode(json!({
            "packet_number": 2, "time": "2024-03-01 10:00:01", "length": 42,
            "ethernet": {"src": "aa:aa:aa:aa:aa:aa", "dst": "ff:ff:ff:ff:ff:ff", "type": "0x0806"}
        }));
        assert_eq!(arp.protocol, "ARP");
        assert!(arp.source_ip.is_none());
    }

    #[test]
    fn test_bad_time_is_malformed() {
        let packet: DecodedPacket = serde_json::from_value(json!({
            "packet_number": 3, "time": "not a time", "length": 60
        }))
        .unwrap();
        assert!(matches!(
            PacketRecord::try_from(packet),
            Err(AppError::MalformedInput { .. })
        ));
    }
}
