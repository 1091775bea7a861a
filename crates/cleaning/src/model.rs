use std::fmt;

use chrono::{Duration, NaiveDate};
use ordered_float::OrderedFloat;
use serde::{Serialize, Serializer};

use crate::error::CleanError;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Missing,
    Date(NaiveDate),
    Text(String),
    Number(f64),
    /// Signed day-granularity span, e.g. the derived shipping time.
    Duration(#[serde(serialize_with = "serialize_days")] Duration),
}

pub(crate) fn serialize_days<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_days())
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// `Missing`, or a NaN number. Blank text only counts after normalisation.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Like [`is_missing`](Self::is_missing) but also treats blank or
    /// whitespace-only text as missing.
    pub fn is_missing_like(&self) -> bool {
        match self {
            CellValue::Text(s) => s.trim().is_empty(),
            other => other.is_missing(),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            CellValue::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "<NA>"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(n) if n.is_nan() => write!(f, "<NA>"),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Duration(d) => write!(f, "{} days", d.num_days()),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping keys
// ---------------------------------------------------------------------------

/// Hashable, totally ordered projection of a [`CellValue`].
///
/// All missing cells (including NaN numbers) collapse into one `Missing` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKey {
    Missing,
    Date(NaiveDate),
    Text(String),
    Number(OrderedFloat<f64>),
    /// Whole seconds.
    Duration(i64),
}

impl From<&CellValue> for CellKey {
    fn from(v: &CellValue) -> Self {
        match v {
            v if v.is_missing() => CellKey::Missing,
            CellValue::Date(d) => CellKey::Date(*d),
            CellValue::Text(s) => CellKey::Text(s.clone()),
            CellValue::Number(n) => CellKey::Number(OrderedFloat(*n)),
            CellValue::Duration(d) => CellKey::Duration(d.num_seconds()),
            CellValue::Missing => CellKey::Missing,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Missing => write!(f, "<NA>"),
            CellKey::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellKey::Text(s) => write!(f, "{s}"),
            CellKey::Number(n) => write!(f, "{}", CellValue::Number(n.0)),
            CellKey::Duration(secs) => write!(f, "{} days", secs / 86_400),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Ordered rows under a fixed set of named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build from column names and rows. Short rows are padded with `Missing`,
    /// long rows are cut to the column count.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Self {
        let mut ds = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            ds.push_row(row);
        }
        ds
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, CleanError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CleanError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn column_indices(&self, names: &[String]) -> Result<Vec<usize>, CleanError> {
        names.iter().map(|n| self.column_index(n)).collect()
    }

    /// Index of `name`, appending an all-missing column if it does not exist.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Ok(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Missing);
        }
        self.columns.len() - 1
    }

    /// Cell at a position.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.len()` or `col >= self.columns().len()`.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        &self.rows[row][col]
    }

    /// Overwrite the cell at a position.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.len()` or `col >= self.columns().len()`.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        self.rows[row][col] = value;
    }

    /// Cell by column name. An unknown column is an error.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.len()`.
    pub fn value(&self, row: usize, column: &str) -> Result<&CellValue, CleanError> {
        let col = self.column_index(column)?;
        Ok(self.cell(row, col))
    }

    /// Typed date accessor. `Ok(None)` for a missing cell, `TypeMismatch`
    /// for anything that is neither missing nor a date.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range position, like [`Dataset::cell`].
    pub fn date(&self, row: usize, col: usize) -> Result<Option<NaiveDate>, CleanError> {
        match self.cell(row, col) {
            CellValue::Date(d) => Ok(Some(*d)),
            v if v.is_missing() => Ok(None),
            _ => Err(CleanError::TypeMismatch {
                column: self.columns[col].clone(),
                row,
                expected: "date",
            }),
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<CellValue>] {
        &mut self.rows
    }
}
