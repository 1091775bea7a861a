use serde::Serialize;

use crate::error::CleanError;
use crate::model::{CellValue, Dataset};

/// Rows with a gap in one column, identified by their id-column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCells {
    pub column: String,
    pub row_ids: Vec<CellValue>,
}

/// Turn blank/whitespace text and NaN numbers into `Missing`.
/// Returns the number of cells changed.
pub fn normalise_missing(dataset: &mut Dataset) -> usize {
    let mut changed = 0;
    for row in dataset.rows_mut() {
        for cell in row.iter_mut() {
            if cell.is_missing_like() && *cell != CellValue::Missing {
                *cell = CellValue::Missing;
                changed += 1;
            }
        }
    }
    changed
}

/// For every column except `id_column`, list the ids of rows where the cell
/// is missing-like. Columns without gaps are left out; order follows the
/// dataset's columns.
pub fn summarise_missing(
    dataset: &Dataset,
    id_column: &str,
) -> Result<Vec<MissingCells>, CleanError> {
    let id_idx = dataset.column_index(id_column)?;

    let mut summary = Vec::new();
    for (col, name) in dataset.columns().iter().enumerate() {
        if col == id_idx {
            continue;
        }
        let row_ids: Vec<CellValue> = dataset
            .rows()
            .iter()
            .filter(|row| row[col].is_missing_like())
            .map(|row| row[id_idx].clone())
            .collect();
        if !row_ids.is_empty() {
            summary.push(MissingCells {
                column: name.clone(),
                row_ids,
            });
        }
    }

    Ok(summary)
}
