//! Points and their line protocol encoding

use std::collections::BTreeMap;

use daq_core::{FieldValue, Timestamp};

use crate::{DbError, DbResult};

/// A single point to write. Null fields are left out of the encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub time: Option<Timestamp>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            time: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn time(mut self, time: Timestamp) -> Self {
        self.time = Some(time);
        self
    }

    pub fn to_line_protocol(&self) -> DbResult<String> {
        let fields: Vec<String> = self
            .fields
            .iter()
            .filter_map(|(k, v)| encode_field(v).map(|v| format!("{}={}", escape_key(k), v)))
            .collect();
        if fields.is_empty() {
            return Err(DbError::EmptyPoint(self.measurement.clone()));
        }

        let mut line = escape_measurement(&self.measurement);
        for (k, v) in &self.tags {
            line.push(',');
            line.push_str(&escape_key(k));
            line.push('=');
            line.push_str(&escape_key(v));
        }
        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(time) = self.time {
            let ns = time
                .timestamp_nanos_opt()
                .ok_or_else(|| DbError::TimestampRange(time.to_rfc3339()))?;
            line.push(' ');
            line.push_str(&ns.to_string());
        }
        Ok(line)
    }
}

fn encode_field(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Float(f) if f.is_finite() => Some(f.to_string()),
        FieldValue::Float(_) | FieldValue::Null => None,
        FieldValue::Integer(i) => Some(format!("{}i", i)),
        FieldValue::Boolean(b) => Some(b.to_string()),
        FieldValue::String(s) => Some(format!(
            "\"{}\"",
            s.replace('\\', "\\\\").replace('"', "\\\"")
        )),
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::parse_time;

    #[test]
    fn test_line_protocol() {
        let point = Point::new("zone temp")
            .tag("room", "101,A")
            .field("value", 21.5)
            .field("count", 3i64)
            .field("ok", true)
            .field("note", "say \"hi\"")
            .field("missing", FieldValue::Null)
            .time(parse_time("2019-01-01T00:00:00Z").unwrap());

        insta::assert_snapshot!(
            point.to_line_protocol().unwrap(),
            @r#"zone\ temp,room=101\,A count=3i,note="say \"hi\"",ok=true,value=21.5 1546300800000000000"#
        );
    }

    #[test]
    fn test_whole_float_stays_float() {
        let line = Point::new("m").field("v", 21.0).to_line_protocol().unwrap();
        assert_eq!(line, "m v=21");
    }

    #[test]
    fn test_all_null_fields_rejected() {
        let point = Point::new("m")
            .field("a", FieldValue::Null)
            .field("b", f64::NAN);
        assert!(matches!(
            point.to_line_protocol(),
            Err(DbError::EmptyPoint(m)) if m == "m"
        ));
    }
}
