//! Time-indexed table of field values

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{CoreError, CoreResult, FieldValue, Timestamp};

/// Row-oriented frame: one timestamp per row, one value per column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    index: Vec<Timestamp>,
    rows: Vec<Vec<FieldValue>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn push_row(&mut self, time: Timestamp, row: Vec<FieldValue>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowLength {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.index.push(time);
        self.rows.push(row);
        Ok(())
    }

    /// Set a single cell, adding the column and/or row as needed.
    /// New cells are filled with `Null`.
    pub fn insert(&mut self, time: Timestamp, column: &str, value: FieldValue) {
        let col = match self.column_position(column) {
            Some(c) => c,
            None => {
                self.columns.push(column.to_string());
                for row in self.rows.iter_mut() {
                    row.push(FieldValue::Null);
                }
                self.columns.len() - 1
            }
        };
        let row = match self.index.iter().position(|t| *t == time) {
            Some(r) => r,
            None => {
                self.index.push(time);
                self.rows.push(vec![FieldValue::Null; self.columns.len()]);
                self.index.len() - 1
            }
        };
        self.rows[row][col] = value;
    }

    pub fn get(&self, time: &Timestamp, column: &str) -> Option<&FieldValue> {
        let col = self.column_position(column)?;
        let row = self.index.iter().position(|t| t == time)?;
        self.rows[row].get(col)
    }

    /// (timestamp, value) pairs of one column in index order
    pub fn column(&self, column: &str) -> Option<Vec<(Timestamp, &FieldValue)>> {
        let col = self.column_position(column)?;
        Some(
            self.index
                .iter()
                .zip(self.rows.iter())
                .map(|(t, row)| (*t, &row[col]))
                .collect(),
        )
    }

    /// Like [`Frame::column`] with null cells dropped
    pub fn column_non_null(&self, column: &str) -> Option<Vec<(Timestamp, &FieldValue)>> {
        self.column(column)
            .map(|points| points.into_iter().filter(|(_, v)| !v.is_null()).collect())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_position(from) {
            Some(col) => {
                self.columns[col] = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn sort_index(&mut self) {
        let mut pairs: Vec<(Timestamp, Vec<FieldValue>)> = self
            .index
            .drain(..)
            .zip(self.rows.drain(..))
            .collect();
        pairs.sort_by_key(|(t, _)| *t);
        for (t, row) in pairs {
            self.index.push(t);
            self.rows.push(row);
        }
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Spacing between consecutive index entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRate {
    /// Most common spacing in seconds
    pub seconds: i64,
    /// Number of distinct spacings seen
    pub distinct: usize,
}

/// Detect the most likely sample rate of an index. Returns `None` when
/// fewer than two timestamps are available. Ties go to the shorter spacing.
pub fn detect_sample_rate(index: &[Timestamp]) -> Option<SampleRate> {
    if index.len() < 2 {
        return None;
    }
    let mut sorted = index.to_vec();
    sorted.sort();

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for pair in sorted.windows(2) {
        let step: Duration = pair[1] - pair[0];
        *counts.entry(step.num_seconds()).or_insert(0) += 1;
    }

    let (seconds, _) = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(s, c)| (*s, *c))?;

    Some(SampleRate {
        seconds,
        distinct: counts.len(),
    })
}
