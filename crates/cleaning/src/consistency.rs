//! Cross-row consistency of columns that should repeat within a key group
//! (customer name across the rows of one order, and so on).

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::CleanError;
use crate::model::{CellKey, CellValue, Dataset};

/// Result of [`check_consistency`].
///
/// `AllConsistent` is distinct from an `Inconsistent` report with no groups,
/// which is never produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsistencyOutcome {
    AllConsistent,
    Inconsistent(ConsistencyReport),
}

impl ConsistencyOutcome {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::AllConsistent)
    }

    /// Keys of the inconsistent groups; empty when all consistent.
    pub fn inconsistent_keys(&self) -> BTreeSet<CellKey> {
        match self {
            Self::AllConsistent => BTreeSet::new(),
            Self::Inconsistent(report) => report.keys(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub key_column: String,
    /// Dataset column names, used as the header when rendering rows.
    pub columns: Vec<String>,
    pub groups: Vec<InconsistentGroup>,
}

impl ConsistencyReport {
    pub fn keys(&self) -> BTreeSet<CellKey> {
        self.groups.iter().map(|g| g.key.clone()).collect()
    }
}

/// One key whose rows disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InconsistentGroup {
    pub key: CellKey,
    /// Disagreeing columns, in the order they were requested.
    pub columns: Vec<String>,
    /// Row positions in the dataset.
    pub rows: Vec<usize>,
    /// Full copies of those rows.
    pub cells: Vec<Vec<CellValue>>,
}

/// Group rows by `key_column` and report groups where any of `check_columns`
/// holds more than one distinct non-missing value.
///
/// Missing keys form one group of their own and are checked like any other.
pub fn check_consistency(
    dataset: &Dataset,
    key_column: &str,
    check_columns: &[String],
) -> Result<ConsistencyOutcome, CleanError> {
    let key_idx = dataset.column_index(key_column)?;
    let check_idx = dataset.column_indices(check_columns)?;

    let mut groups: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
    for (row, cells) in dataset.rows().iter().enumerate() {
        groups.entry(CellKey::from(&cells[key_idx])).or_default().push(row);
    }

    let mut inconsistent = Vec::new();
    for (key, rows) in groups {
        let bad: Vec<String> = check_idx
            .iter()
            .zip(check_columns)
            .filter(|(col, _)| distinct_present(dataset, &rows, **col) > 1)
            .map(|(_, name)| name.clone())
            .collect();

        if bad.is_empty() {
            continue;
        }

        log::warn!("{key_column} {key}: inconsistent in {}", bad.join(", "));
        let cells = rows.iter().map(|&r| dataset.rows()[r].clone()).collect();
        inconsistent.push(InconsistentGroup {
            key,
            columns: bad,
            rows,
            cells,
        });
    }

    if inconsistent.is_empty() {
        log::info!("all {key_column} groups consistent across {}", check_columns.join(", "));
        return Ok(ConsistencyOutcome::AllConsistent);
    }

    Ok(ConsistencyOutcome::Inconsistent(ConsistencyReport {
        key_column: key_column.to_string(),
        columns: dataset.columns().to_vec(),
        groups: inconsistent,
    }))
}

fn distinct_present(dataset: &Dataset, rows: &[usize], col: usize) -> usize {
    rows.iter()
        .map(|&r| dataset.cell(r, col))
        .filter(|v| !v.is_missing())
        .map(CellKey::from)
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

impl fmt::Display for ConsistencyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllConsistent => {
                writeln!(f, "All orders are consistent across the specified columns.")
            }
            Self::Inconsistent(report) => write!(f, "{report}"),
        }
    }
}

impl fmt::Display for ConsistencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Found {} inconsistent orders:", self.groups.len())?;
        writeln!(f)?;
        for group in &self.groups {
            writeln!(f, "Order {} - inconsistent in: {}", group.key, group.columns.join(", "))?;
            writeln!(f)?;
            writeln!(f, "{}", self.columns.join(" | "))?;
            for row in &group.cells {
                let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                writeln!(f, "{}", line.join(" | "))?;
            }
            writeln!(f, "{}", "-".repeat(80))?;
        }
        Ok(())
    }
}
