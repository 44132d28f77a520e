use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::packet::{parse_timestamp, timestamp_format};

/// Filter form as the analyst fills it in, and as the report service
/// expects it on the wire: every field is a string, empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterForm {
    #[serde(deserialize_with = "lenient_string")]
    pub src_mac: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dst_mac: String,
    #[serde(deserialize_with = "lenient_string")]
    pub src_ip: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dst_ip: String,
    #[serde(deserialize_with = "lenient_string")]
    pub protocol: String,
    #[serde(deserialize_with = "lenient_string")]
    pub port: String,
    #[serde(deserialize_with = "lenient_string")]
    pub length_min: String,
    #[serde(deserialize_with = "lenient_string")]
    pub length_max: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time_start: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time_end: String,
}

/// Accept strings, numbers and null for a form field
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Parsed, immutable filter criteria. Every field is optional and an
/// absent field imposes no constraint.
///
/// Text criteria are matched lowercased and trimmed; the protocol is kept
/// verbatim because it matches case-sensitively. Numeric and time bounds
/// that fail to parse are absent, never zero.
///
/// The form the criteria were parsed from is kept as entered and is what
/// gets serialized, so the report service sees the analyst's own values.
/// Equality compares the parsed constraints only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "FilterForm", into = "FilterForm")]
pub struct FilterCriteria {
    source_mac: Option<String>,
    destination_mac: Option<String>,
    source_ip: Option<String>,
    destination_ip: Option<String>,
    protocol: Option<String>,
    port: Option<String>,
    length_min: Option<u64>,
    length_max: Option<u64>,
    time_start: Option<NaiveDateTime>,
    time_end: Option<NaiveDateTime>,
    form: FilterForm,
}

fn text_criterion(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_lowercase())
    }
}

/// Any finite number, integral or not; everything else is absent
fn numeric_bound(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

impl FilterCriteria {
    /// Criteria that match every record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_mac(mut self, value: &str) -> Self {
        self.source_mac = text_criterion(value);
        self.form.src_mac = value.to_string();
        self
    }

    pub fn with_destination_mac(mut self, value: &str) -> Self {
        self.destination_mac = text_criterion(value);
        self.form.dst_mac = value.to_string();
        self
    }

    pub fn with_source_ip(mut self, value: &str) -> Self {
        self.source_ip = text_criterion(value);
        self.form.src_ip = value.to_string();
        self
    }

    pub fn with_destination_ip(mut self, value: &str) -> Self {
        self.destination_ip = text_criterion(value);
        self.form.dst_ip = value.to_string();
        self
    }

    pub fn with_protocol(mut self, value: &str) -> Self {
        let trimmed = value.trim();
        self.protocol = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.form.protocol = value.to_string();
        self
    }

    pub fn with_port(mut self, value: &str) -> Self {
        self.port = text_criterion(value);
        self.form.port = value.to_string();
        self
    }

    pub fn with_length_min(mut self, value: Option<u64>) -> Self {
        self.length_min = value;
        self.form.length_min = value.map(|n| n.to_string()).unwrap_or_default();
        self
    }

    pub fn with_length_max(mut self, value: Option<u64>) -> Self {
        self.length_max = value;
        self.form.length_max = value.map(|n| n.to_string()).unwrap_or_default();
        self
    }

    pub fn with_time_start(mut self, value: Option<NaiveDateTime>) -> Self {
        self.time_start = value;
        self.form.time_start = value
            .map(|t| timestamp_format::render(&t))
            .unwrap_or_default();
        self
    }

    pub fn with_time_end(mut self, value: Option<NaiveDateTime>) -> Self {
        self.time_end = value;
        self.form.time_end = value
            .map(|t| timestamp_format::render(&t))
            .unwrap_or_default();
        self
    }

    pub fn source_mac(&self) -> Option<&str> {
        self.source_mac.as_deref()
    }

    pub fn destination_mac(&self) -> Option<&str> {
        self.destination_mac.as_deref()
    }

    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    pub fn destination_ip(&self) -> Option<&str> {
        self.destination_ip.as_deref()
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Inclusive length bounds, unset ends widened to the full `u64` range.
    /// An inverted pair (`min > max`) matches nothing.
    pub fn length_range(&self) -> (u64, u64) {
        (
            self.length_min.unwrap_or(u64::MIN),
            self.length_max.unwrap_or(u64::MAX),
        )
    }

    /// Inclusive time bounds, unset ends widened to the full range
    pub fn time_range(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.time_start.unwrap_or(NaiveDateTime::MIN),
            self.time_end.unwrap_or(NaiveDateTime::MAX),
        )
    }

    /// The form as entered, sent to the report service
    pub fn form(&self) -> &FilterForm {
        &self.form
    }

    /// True when no field constrains anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn constraints(
        &self,
    ) -> (
        [Option<&str>; 6],
        (Option<u64>, Option<u64>),
        (Option<NaiveDateTime>, Option<NaiveDateTime>),
    ) {
        (
            [
                self.source_mac(),
                self.destination_mac(),
                self.source_ip(),
                self.destination_ip(),
                self.protocol(),
                self.port(),
            ],
            (self.length_min, self.length_max),
            (self.time_start, self.time_end),
        )
    }
}

impl PartialEq for FilterCriteria {
    fn eq(&self, other: &Self) -> bool {
        self.constraints() == other.constraints()
    }
}

impl Eq for FilterCriteria {}

impl From<FilterForm> for FilterCriteria {
    fn from(form: FilterForm) -> Self {
        let mut criteria = FilterCriteria::new()
            .with_source_mac(&form.src_mac)
            .with_destination_mac(&form.dst_mac)
            .with_source_ip(&form.src_ip)
            .with_destination_ip(&form.dst_ip)
            .with_protocol(&form.protocol)
            .with_port(&form.port)
            .with_time_start(parse_timestamp(&form.time_start))
            .with_time_end(parse_timestamp(&form.time_end));

        // Fractional bounds round inward; the cast saturates into u64
        criteria.length_min = numeric_bound(&form.length_min).map(|n| n.ceil().max(0.0) as u64);
        criteria.length_max = match numeric_bound(&form.length_max).map(f64::floor) {
            // No length is negative: invert the range so nothing matches
            Some(n) if n < 0.0 => {
                criteria.length_min = Some(criteria.length_min.unwrap_or(0).max(1));
                Some(0)
            }
            bound => bound.map(|n| n as u64),
        };

        criteria.form = form;
        criteria
    }
}

impl From<FilterCriteria> for FilterForm {
    fn from(criteria: FilterCriteria) -> Self {
        criteria.form
    }
}
