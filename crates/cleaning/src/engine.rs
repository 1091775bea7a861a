use serde::Serialize;

use crate::config::CleaningConfig;
use crate::consistency::{check_consistency, ConsistencyOutcome};
use crate::dates::{reconcile_dates, ReconcileReport};
use crate::error::CleanError;
use crate::fill::{fill_from_relatives, FillReport};
use crate::missing::{normalise_missing, summarise_missing, MissingCells};
use crate::model::Dataset;

#[derive(Debug, Clone, Serialize)]
pub struct CleaningMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    pub meta: CleaningMeta,
    /// Blank/NaN cells rewritten to missing before any pass ran.
    pub normalised_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<MissingCells>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<ReconcileReport>,
    pub consistency: Vec<ConsistencyOutcome>,
    pub fills: Vec<FillReport>,
}

impl CleaningReport {
    /// Unresolved or still-too-long dates, inconsistent groups, or conflicting
    /// fill mappings.
    pub fn needs_review(&self) -> bool {
        self.dates.as_ref().is_some_and(|d| !d.is_clean())
            || self.consistency.iter().any(|c| !c.is_consistent())
            || self.fills.iter().any(|f| !f.conflicts.is_empty())
    }
}

/// Run every configured pass over `dataset` in place.
///
/// Order: normalise missing, summarise missing, reconcile dates, consistency
/// checks, relative fills. Every referenced column is checked before the
/// dataset is touched.
pub fn run(config: &CleaningConfig, dataset: &mut Dataset) -> Result<CleaningReport, CleanError> {
    check_columns(config, dataset)?;

    let normalised_cells = normalise_missing(dataset);

    let missing = match config.missing {
        Some(ref m) => Some(summarise_missing(dataset, &m.id_column)?),
        None => None,
    };

    let dates = match config.dates {
        Some(ref d) => Some(reconcile_dates(dataset, &d.columns)?),
        None => None,
    };

    let mut consistency = Vec::with_capacity(config.consistency.len());
    for check in &config.consistency {
        consistency.push(check_consistency(dataset, &check.key_column, &check.check_columns)?);
    }

    let mut fills = Vec::with_capacity(config.fill.len());
    for rule in &config.fill {
        fills.push(fill_from_relatives(dataset, &rule.target_column, &rule.relative_columns)?);
    }

    log::info!(
        "cleaning '{}': {} rows, {} date fixes, {} consistency checks, {} fills",
        config.name,
        dataset.len(),
        dates.as_ref().map_or(0, |d| d.fixed.len()),
        consistency.len(),
        fills.iter().map(|f| f.filled.len()).sum::<usize>()
    );

    Ok(CleaningReport {
        meta: CleaningMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        normalised_cells,
        missing,
        dates,
        consistency,
        fills,
    })
}

fn check_columns(config: &CleaningConfig, dataset: &Dataset) -> Result<(), CleanError> {
    if let Some(ref m) = config.missing {
        dataset.column_index(&m.id_column)?;
    }
    if let Some(ref d) = config.dates {
        dataset.column_index(&d.columns.order)?;
        dataset.column_index(&d.columns.ship)?;
    }
    for check in &config.consistency {
        dataset.column_index(&check.key_column)?;
        dataset.column_indices(&check.check_columns)?;
    }
    for rule in &config.fill {
        dataset.column_index(&rule.target_column)?;
        dataset.column_indices(&rule.relative_columns)?;
    }
    Ok(())
}
