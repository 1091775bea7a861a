//! Fill blank cells from columns that determine them (city from postcode and
//! country, for example).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CleanError;
use crate::model::{CellKey, CellValue, Dataset};

/// A relative tuple seen with more than one target value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingConflict {
    pub key: Vec<CellKey>,
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub target_column: String,
    /// Rows that received a value.
    pub filled: Vec<usize>,
    /// Fillable rows whose relative tuple has no source row.
    pub unmatched: Vec<usize>,
    /// Fillable rows whose relative tuple is conflicted. Left blank.
    pub conflicted: Vec<usize>,
    pub conflicts: Vec<MappingConflict>,
}

/// Lookup from relative tuple to target value, built from source rows.
struct RelativeLookup {
    values: HashMap<Vec<CellKey>, CellValue>,
    conflicts: Vec<MappingConflict>,
}

impl RelativeLookup {
    fn build(
        dataset: &Dataset,
        sources: impl Iterator<Item = usize>,
        target_idx: usize,
        relative_idx: &[usize],
    ) -> Self {
        let mut seen: HashMap<Vec<CellKey>, Vec<CellValue>> = HashMap::new();
        let mut order: Vec<Vec<CellKey>> = Vec::new();

        for row in sources {
            let key = tuple(dataset, row, relative_idx);
            let value = dataset.cell(row, target_idx);
            let entry = seen.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            if !entry.iter().any(|v| CellKey::from(v) == CellKey::from(value)) {
                entry.push(value.clone());
            }
        }

        let mut values = HashMap::with_capacity(seen.len());
        let mut conflicts = Vec::new();
        for key in order {
            let Some(mut candidates) = seen.remove(&key) else {
                continue;
            };
            if candidates.len() == 1 {
                values.insert(key, candidates.remove(0));
            } else {
                conflicts.push(MappingConflict {
                    key,
                    values: candidates,
                });
            }
        }

        Self { values, conflicts }
    }
}

fn tuple(dataset: &Dataset, row: usize, cols: &[usize]) -> Vec<CellKey> {
    cols.iter().map(|&c| CellKey::from(dataset.cell(row, c))).collect()
}

/// Fill missing `target_column` cells in rows where every relative column is
/// present, using the value seen alongside the same relative tuple in rows
/// where the target is present.
///
/// Rows with the target already set, or with any relative missing, are never
/// touched. A tuple mapping to more than one value is reported as a conflict
/// and not used.
pub fn fill_from_relatives(
    dataset: &mut Dataset,
    target_column: &str,
    relative_columns: &[String],
) -> Result<FillReport, CleanError> {
    if relative_columns.is_empty() {
        return Err(CleanError::ConfigValidation(format!(
            "fill '{target_column}': at least one relative column is required"
        )));
    }
    if relative_columns.iter().any(|c| c == target_column) {
        return Err(CleanError::ConfigValidation(format!(
            "fill '{target_column}': target cannot be one of its relative columns"
        )));
    }

    let target_idx = dataset.column_index(target_column)?;
    let relative_idx = dataset.column_indices(relative_columns)?;

    let mut report = FillReport {
        target_column: target_column.to_string(),
        ..FillReport::default()
    };

    let relatives_present =
        |row: &Vec<CellValue>| relative_idx.iter().all(|&c| !row[c].is_missing());

    let mut fillable = Vec::new();
    let mut sources = Vec::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        if !relatives_present(row) {
            continue;
        }
        if row[target_idx].is_missing() {
            fillable.push(i);
        } else {
            sources.push(i);
        }
    }

    if fillable.is_empty() {
        return Ok(report);
    }

    let lookup = RelativeLookup::build(dataset, sources.into_iter(), target_idx, &relative_idx);
    for conflict in &lookup.conflicts {
        log::warn!(
            "fill '{target_column}': {} distinct values for one relative tuple; not used",
            conflict.values.len()
        );
    }
    let conflicted_keys: HashSet<&Vec<CellKey>> = lookup.conflicts.iter().map(|c| &c.key).collect();

    let mut updates = Vec::new();
    for row in fillable {
        let key = tuple(dataset, row, &relative_idx);
        match lookup.values.get(&key) {
            Some(value) => updates.push((row, value.clone())),
            None if conflicted_keys.contains(&key) => report.conflicted.push(row),
            None => report.unmatched.push(row),
        }
    }

    let rows = dataset.rows_mut();
    for (row, value) in updates {
        rows[row][target_idx] = value;
        report.filled.push(row);
    }

    log::debug!(
        "fill '{target_column}': {} filled, {} unmatched, {} conflicted",
        report.filled.len(),
        report.unmatched.len(),
        report.conflicted.len()
    );

    report.conflicts = lookup.conflicts;
    Ok(report)
}
