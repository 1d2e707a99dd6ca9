//! Tabular chart data returned by every statistic.

use crate::error::StatsError;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use strum_macros::Display;

/// Type of the values in a table column
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
}

/// A column descriptor: label and value type.
///
/// Serialised as a two element array, e.g. `["Total", "number"]`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Column(pub String, pub ColumnType);

impl Column {
    /// A column holding strings.
    pub fn string(label: impl Into<String>) -> Self {
        Column(label.into(), ColumnType::String)
    }

    /// A column holding numbers.
    pub fn number(label: impl Into<String>) -> Self {
        Column(label.into(), ColumnType::Number)
    }

    /// Column label
    pub fn label(&self) -> &str {
        &self.0
    }
}

/// A single value in a table or query result
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
}

/// One row of cells.
pub type Row = Vec<Cell>;

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric value of the cell, parsing strings where possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) => Some(*value),
            Cell::Str(value) => value.trim().parse().ok(),
        }
    }

    /// Numeric value of the cell, with null and non-numeric values counting as zero.
    pub fn to_f64_or_zero(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    /// Whether the cell holds a non-zero number or a non-empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Cell::Null => false,
            Cell::Int(value) => *value != 0,
            Cell::Float(value) => *value != 0.0,
            Cell::Str(value) => !value.is_empty(),
        }
    }

    /// Total ordering used when sorting rows.
    ///
    /// Nulls sort first, numbers compare by value regardless of representation and strings sort
    /// after numbers.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                Cell::Null => 0,
                Cell::Int(_) | Cell::Float(_) => 1,
                Cell::Str(_) => 2,
            }
        }
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Str(a), Cell::Str(b)) => a.cmp(b),
            (Cell::Int(_) | Cell::Float(_), Cell::Int(_) | Cell::Float(_)) => {
                self.to_f64_or_zero().total_cmp(&other.to_f64_or_zero())
            }
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(value) => write!(f, "{}", value),
            Cell::Float(value) => write!(f, "{}", value),
            Cell::Str(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Str(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Str(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// Chart data: column descriptors and rows
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Table {
    /// Column descriptors
    pub table_description: Vec<Column>,
    /// Rows, each with one cell per column
    pub table_data: Vec<Row>,
}

impl Table {
    /// Return an empty table with the given columns.
    pub fn new(description: Vec<Column>) -> Self {
        Table {
            table_description: description,
            table_data: vec![],
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.table_description.len()
    }

    /// Append a row, checking it has one cell per column.
    pub fn push(&mut self, row: Row) -> Result<(), StatsError> {
        if row.len() != self.width() {
            return Err(StatsError::ColumnCount {
                expected: self.width(),
                found: row.len(),
            });
        }
        self.table_data.push(row);
        Ok(())
    }

    /// Append several rows.
    pub fn extend<I: IntoIterator<Item = Row>>(&mut self, rows: I) -> Result<(), StatsError> {
        for row in rows {
            self.push(row)?;
        }
        Ok(())
    }

    /// Append a row of nulls.
    pub fn push_null_row(&mut self) {
        self.table_data.push(vec![Cell::Null; self.width()]);
    }

    /// Append a row of nulls if the table has no rows.
    pub fn or_null_row(mut self) -> Self {
        if self.table_data.is_empty() {
            self.push_null_row();
        }
        self
    }
}

/// Sort rows in descending order of the cell at `index` and keep the first `limit`.
pub fn top_rows(mut rows: Vec<Row>, index: usize, limit: usize) -> Vec<Row> {
    rows.sort_by(|a, b| match (a.get(index), b.get(index)) {
        (Some(a), Some(b)) => b.total_cmp(a),
        _ => Ordering::Equal,
    });
    rows.truncate(limit);
    rows
}
