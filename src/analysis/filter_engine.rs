use crate::models::filter::FilterCriteria;
use crate::models::packet::PacketRecord;

/// Evaluates packet records against analyst filter criteria.
///
/// Stateless: the same engine serves live table filtering and export
/// payload preparation, and every call depends only on its arguments.
pub struct FilterEngine;

/// Case-insensitive containment; an unset criterion always holds.
/// `needle` is already lowercased by `FilterCriteria`.
fn contains(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack
            .map(|value| value.to_lowercase().contains(needle))
            .unwrap_or(false),
    }
}

impl FilterEngine {
    /// True when the record satisfies every criterion that is set
    pub fn matches(record: &PacketRecord, criteria: &FilterCriteria) -> bool {
        if !contains(record.source_mac.as_deref(), criteria.source_mac()) {
            return false;
        }
        if !contains(record.destination_mac.as_deref(), criteria.destination_mac()) {
            return false;
        }
        if !contains(record.source_ip.as_deref(), criteria.source_ip()) {
            return false;
        }
        if !contains(record.destination_ip.as_deref(), criteria.destination_ip()) {
            return false;
        }
        if let Some(protocol) = criteria.protocol() {
            if record.protocol != protocol {
                return false;
            }
        }
        if criteria.port().is_some() && !contains(Some(record.ports_display().as_str()), criteria.port()) {
            return false;
        }

        let (min_length, max_length) = criteria.length_range();
        if record.length < min_length || record.length > max_length {
            return false;
        }

        let (start, end) = criteria.time_range();
        start <= record.timestamp && record.timestamp <= end
    }

    /// Records matching `criteria`, in input order
    pub fn filter_all<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<PacketRecord>
    where
        I: IntoIterator<Item = &'a PacketRecord>,
    {
        records
            .into_iter()
            .filter(|record| Self::matches(record, criteria))
            .cloned()
            .collect()
    }

    /// A predicate bound to `criteria`, to hand to a table query for one call
    pub fn predicate(criteria: &FilterCriteria) -> impl Fn(&PacketRecord) -> bool + '_ {
        move |record| Self::matches(record, criteria)
    }

    /// Free-text search over every displayed column; blank terms match all
    pub fn search(record: &PacketRecord, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || record.row_text().to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::FilterForm;
    use chrono::NaiveDate;

    fn record(length: u64, protocol: &str) -> PacketRecord {
        PacketRecord {
            number: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            length,
            source_mac: Some("AA:BB:CC:DD:EE:01".to_string()),
            destination_mac: Some("aa:bb:cc:dd:ee:02".to_string()),
            source_ip: Some("192.168.1.10".to_string()),
            destination_ip: Some("10.0.0.1".to_string()),
            protocol: protocol.to_string(),
            ports: vec![51515, 8080],
        }
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let criteria = FilterCriteria::new();
        assert!(FilterEngine::matches(&record(0, "TCP"), &criteria));
        assert!(FilterEngine::matches(&record(u64::MAX, "weird"), &criteria));
    }

    #[test]
    fn test_substring_case_insensitive() {
        let r = record(60, "TCP");
        assert!(FilterEngine::matches(&r, &FilterCriteria::new().with_source_mac("cc:dd:EE")));
        assert!(FilterEngine::matches(&r, &FilterCriteria::new().with_destination_ip("0.0")));
        assert!(!FilterEngine::matches(&r, &FilterCriteria::new().with_source_ip("172.16")));
    }

    #[test]
    fn test_protocol_is_exact_and_case_sensitive() {
        let r = record(60, "TCP");
        assert!(FilterEngine::matches(&r, &FilterCriteria::new().with_protocol("TCP")));
        assert!(!FilterEngine::matches(&r, &FilterCriteria::new().with_protocol("tcp")));
        assert!(!FilterEngine::matches(&r, &FilterCriteria::new().with_protocol("TC")));
    }

    #[test]
    fn test_port_substring() {
        let r = record(60, "TCP");
        assert!(FilterEngine::matches(&r, &FilterCriteria::new().with_port("80")));
        assert!(!FilterEngine::matches(&r, &FilterCriteria::new().with_port("443")));

        let mut no_ports = r.clone();
        no_ports.ports.clear();
        assert!(!FilterEngine::matches(&no_ports, &FilterCriteria::new().with_port("80")));
    }

    #[test]
    fn test_missing_address_fails_set_criterion() {
        let mut r = record(60, "ARP");
        r.source_ip = None;
        assert!(!FilterEngine::matches(&r, &FilterCriteria::new().with_source_ip("1")));
        assert!(FilterEngine::matches(&r, &FilterCriteria::new()));
    }

    #[test]
    fn test_unparsable_min_keeps_small_records() {
        let form = FilterForm {
            length_min: "abc".to_string(),
            ..Default::default()
        };
        let criteria = FilterCriteria::from(form);
        assert!(FilterEngine::matches(&record(0, "TCP"), &criteria));
        assert!(FilterEngine::matches(&record(1, "TCP"), &criteria));
    }

    #[test]
    fn test_search() {
        let r = record(60, "UDP");
        assert!(FilterEngine::search(&r, "  "));
        assert!(FilterEngine::search(&r, "udp"));
        assert!(FilterEngine::search(&r, "8080"));
        assert!(!FilterEngine::search(&r, "icmp"));
    }
}
