//! Domain models for the graph engine.
//!
//! - [`Cell`] - one raw value, either numeric or text
//! - [`Series`] - ordered cells of one column from one source
//! - [`Dataset`] - every loaded column of one source, keyed by name
//!
//! Series are immutable once built. Operations always produce new series.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{GraphError, GraphResult};

// =============================================================================
// Cell
// =============================================================================

/// A single cell, as read from a record file or produced by an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value (results of operations are always numeric).
    Number(f64),
    /// Raw text as read from the source.
    Text(String),
}

impl Cell {
    /// Coerce the cell to a float.
    ///
    /// Text is trimmed and parsed with standard `.`-decimal syntax.
    pub fn to_number(&self) -> GraphResult<f64> {
        match self {
            Cell::Number(n) => Ok(*n),
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| GraphError::NonNumericValue(s.clone())),
        }
    }

    /// Render the cell as an axis label.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// =============================================================================
// Series
// =============================================================================

/// Positionally indexed values of one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    cells: Vec<Cell>,
}

impl Series {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Build a numeric series.
    pub fn from_numbers(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            cells: values.into_iter().map(Cell::Number).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Coerce every cell, failing on the first non-numeric one.
    pub fn to_numbers(&self) -> GraphResult<Vec<f64>> {
        self.cells.iter().map(Cell::to_number).collect()
    }

    /// Every cell rendered as an axis label.
    pub fn labels(&self) -> Vec<String> {
        self.cells.iter().map(Cell::label).collect()
    }
}

impl FromIterator<Cell> for Series {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// All loaded columns of a single source.
///
/// Every series in a dataset has the same length.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Where the data came from (usually a file path).
    origin: String,
    /// Column names in header order.
    names: Vec<String>,
    columns: HashMap<String, Series>,
    row_count: usize,
}

impl Dataset {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Add a column. The first column fixes the row count of the dataset.
    ///
    /// Re-inserting an existing name replaces its series.
    pub fn insert(&mut self, name: impl Into<String>, series: Series) -> GraphResult<()> {
        let name = name.into();
        if self.names.is_empty() {
            self.row_count = series.len();
        } else if series.len() != self.row_count {
            return Err(GraphError::MismatchedLengths {
                column: name,
                expected: self.row_count,
                got: series.len(),
            });
        }

        if !self.columns.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.columns.insert(name, series);
        Ok(())
    }

    /// Builder-style [`Dataset::insert`].
    pub fn with_column(mut self, name: impl Into<String>, series: Series) -> GraphResult<Self> {
        self.insert(name, series)?;
        Ok(self)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Column names in header order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Like [`Dataset::get`] but reports a missing column.
    pub fn column(&self, name: &str) -> GraphResult<&Series> {
        self.get(name)
            .ok_or_else(|| GraphError::ColumnNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.names.len()
    }
}
