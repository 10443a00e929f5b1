//! Value and result types as returned by the InfluxDB query endpoint

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{parse_time, CoreError, CoreResult, Frame};

/// Timestamp type (UTC)
pub type Timestamp = DateTime<Utc>;

/// A single field value. InfluxDB encodes whole floats without a
/// fractional part, so callers should prefer [`FieldValue::as_f64`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            FieldValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Nulls and NaN floats both count as missing data.
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// One result series (a measurement, optionally grouped by tags)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Series {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub values: Vec<Vec<FieldValue>>,
}

impl Series {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Column name -> value for a single row
    pub fn row_map(&self, row: usize) -> Option<BTreeMap<String, FieldValue>> {
        let values = self.values.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        )
    }

    /// Convert into a frame indexed by the `time` column. Every other
    /// column is kept in its original order.
    pub fn into_frame(self) -> CoreResult<Frame> {
        let time_idx = self
            .column_index("time")
            .ok_or_else(|| CoreError::MissingTimeColumn(self.name.clone()))?;

        let columns: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != time_idx)
            .map(|(_, c)| c.clone())
            .collect();

        let mut frame = Frame::new(columns);
        for mut row in self.values {
            if time_idx >= row.len() {
                return Err(CoreError::RowLength {
                    expected: self.columns.len(),
                    got: row.len(),
                });
            }
            let time = match row.remove(time_idx) {
                FieldValue::String(s) => parse_time(&s)?,
                FieldValue::Integer(ns) => Utc.timestamp_nanos(ns),
                other => return Err(CoreError::InvalidTime(format!("{:?}", other))),
            };
            frame.push_row(time, row)?;
        }
        Ok(frame)
    }
}

/// Result of a single statement within a query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<Series>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Full body of a `/query` response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    #[serde(default)]
    pub results: Vec<StatementResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// First error reported by the server, top-level or per statement
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.results.iter().find_map(|r| r.error.as_deref()))
    }

    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.results.iter().flat_map(|r| r.series.iter())
    }

    /// First series whose name matches the measurement
    pub fn find(&self, measurement: &str) -> Option<&Series> {
        self.series().find(|s| s.name == measurement)
    }

    pub fn into_series(self) -> impl Iterator<Item = Series> {
        self.results.into_iter().flat_map(|r| r.series.into_iter())
    }

    pub fn is_empty(&self) -> bool {
        self.series().next().is_none()
    }
}
