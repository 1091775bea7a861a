//! Order/ship date reconciliation.
//!
//! Rows whose shipping time is negative or longer than the threshold are
//! treated as data-entry errors. Each is re-read up to five ways (dates
//! swapped, day and month transposed on either or both) and the reading with
//! the smallest non-negative shipping time is committed.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CleanError;
use crate::model::{serialize_days, CellValue, Dataset};

pub const DEFAULT_THRESHOLD_DAYS: i64 = 15;

/// Column names and threshold for one reconciliation pass.
#[derive(Debug, Clone, Deserialize)]
pub struct DateColumns {
    #[serde(rename = "order_column", default = "default_order_column")]
    pub order: String,
    #[serde(rename = "ship_column", default = "default_ship_column")]
    pub ship: String,
    #[serde(rename = "derived_column", default = "default_derived_column")]
    pub derived: String,
    #[serde(default = "default_threshold_days")]
    pub threshold_days: i64,
}

fn default_order_column() -> String {
    "Order Date".into()
}

fn default_ship_column() -> String {
    "Ship Date".into()
}

fn default_derived_column() -> String {
    "Time Till Shipping".into()
}

fn default_threshold_days() -> i64 {
    DEFAULT_THRESHOLD_DAYS
}

impl Default for DateColumns {
    fn default() -> Self {
        Self {
            order: default_order_column(),
            ship: default_ship_column(),
            derived: default_derived_column(),
            threshold_days: DEFAULT_THRESHOLD_DAYS,
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// One way of re-reading an (order, ship) pair.
///
/// Variant order is the tie-break order: on equal durations the smaller
/// variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFix {
    /// Dates kept as entered.
    None,
    /// Order and ship dates exchanged.
    Swap,
    /// Day and month transposed on the order date.
    Order,
    /// Day and month transposed on the ship date.
    Ship,
    /// Day and month transposed on both dates.
    Both,
}

impl DateFix {
    pub const ALL: [DateFix; 5] = [
        DateFix::None,
        DateFix::Swap,
        DateFix::Order,
        DateFix::Ship,
        DateFix::Both,
    ];

    /// The (order, ship) pair this fix produces, or `None` when a needed
    /// day/month transposition is impossible.
    pub fn apply(self, order: NaiveDate, ship: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            DateFix::None => Some((order, ship)),
            DateFix::Swap => Some((ship, order)),
            DateFix::Order => Some((swap_day_month(order)?, ship)),
            DateFix::Ship => Some((order, swap_day_month(ship)?)),
            DateFix::Both => Some((swap_day_month(order)?, swap_day_month(ship)?)),
        }
    }
}

impl std::fmt::Display for DateFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Swap => write!(f, "swap"),
            Self::Order => write!(f, "order"),
            Self::Ship => write!(f, "ship"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Read the day-of-month as the month and the month as the day, keeping the
/// year. Fails only when the day is not a valid month number (> 12).
pub fn swap_day_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.day() > 12 {
        return None;
    }
    NaiveDate::from_ymd_opt(date.year(), date.day(), date.month())
}

/// The winning re-reading for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub fix: DateFix,
    pub order: NaiveDate,
    pub ship: NaiveDate,
    pub duration: Duration,
}

/// Pick the candidate with the smallest non-negative shipping time.
///
/// Candidates are evaluated in [`DateFix::ALL`] order and a later one only
/// replaces the current pick when strictly shorter. `None` when every
/// candidate is negative.
pub fn best_fix(order: NaiveDate, ship: NaiveDate) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for fix in DateFix::ALL {
        let Some((o, s)) = fix.apply(order, ship) else {
            continue;
        };
        let duration = s - o;
        if duration < Duration::zero() {
            continue;
        }
        if best.map_or(true, |b| duration < b.duration) {
            best = Some(Candidate {
                fix,
                order: o,
                ship: s,
                duration,
            });
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Dataset pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFix {
    pub row: usize,
    pub fix: DateFix,
    #[serde(serialize_with = "serialize_days")]
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Rows selected for fixing (out of threshold, both dates present).
    pub examined: usize,
    /// Rows whose dates were rewritten. `DateFix::None` never appears here.
    pub fixed: Vec<RowFix>,
    /// Rows with no non-negative candidate. Left untouched; need manual review.
    pub unresolved: Vec<usize>,
    /// Rows whose best reading is still longer than the threshold. Another
    /// pass may re-read them differently, so they need manual review.
    pub over_threshold: Vec<usize>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.over_threshold.is_empty()
    }
}

/// Recompute the derived shipping time for every row, then fix the rows that
/// fall outside `[0, threshold_days]`.
///
/// A second pass changes nothing only for rows whose result landed inside
/// `[0, threshold_days]`. Rows whose best reading still exceeds the threshold
/// are listed in [`ReconcileReport::over_threshold`]; running again selects
/// them and may re-read the already rewritten dates.
pub fn reconcile_dates(
    dataset: &mut Dataset,
    columns: &DateColumns,
) -> Result<ReconcileReport, CleanError> {
    let order_idx = dataset.column_index(&columns.order)?;
    let ship_idx = dataset.column_index(&columns.ship)?;
    let threshold = Duration::days(columns.threshold_days);

    // Read every pair first so a type error leaves the dataset unmodified.
    let mut pairs = Vec::with_capacity(dataset.len());
    for row in 0..dataset.len() {
        pairs.push((dataset.date(row, order_idx)?, dataset.date(row, ship_idx)?));
    }
    let derived_idx = dataset.ensure_column(&columns.derived);

    let mut report = ReconcileReport::default();

    for (row, pair) in pairs.into_iter().enumerate() {
        let (Some(order), Some(ship)) = pair else {
            dataset.set(row, derived_idx, CellValue::Missing);
            continue;
        };

        let duration = ship - order;
        dataset.set(row, derived_idx, CellValue::Duration(duration));

        if duration >= Duration::zero() && duration <= threshold {
            continue;
        }
        report.examined += 1;

        match best_fix(order, ship) {
            Some(c) => {
                if c.fix != DateFix::None {
                    dataset.set(row, order_idx, CellValue::Date(c.order));
                    dataset.set(row, ship_idx, CellValue::Date(c.ship));
                    dataset.set(row, derived_idx, CellValue::Duration(c.duration));
                    report.fixed.push(RowFix {
                        row,
                        fix: c.fix,
                        duration: c.duration,
                    });
                }
                log::debug!("row {row}: date fix '{}' -> {} days", c.fix, c.duration.num_days());
                if c.duration > threshold {
                    log::warn!(
                        "row {row}: best reading '{}' is still {} days; left for review",
                        c.fix,
                        c.duration.num_days()
                    );
                    report.over_threshold.push(row);
                }
            }
            None => {
                log::warn!(
                    "row {row}: no non-negative reading of order {order} / ship {ship}; left for review"
                );
                report.unresolved.push(row);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%d/%m/%Y").unwrap()
    }

    fn dataset(pairs: &[(&str, &str)]) -> Dataset {
        Dataset::from_rows(
            &["Order Date", "Ship Date"],
            pairs
                .iter()
                .map(|(o, s)| vec![d(o).into(), d(s).into()])
                .collect(),
        )
    }

    fn derived(ds: &Dataset, row: usize) -> i64 {
        ds.value(row, "Time Till Shipping")
            .unwrap()
            .as_duration()
            .unwrap()
            .num_days()
    }

    #[test]
    fn swap_day_month_rules() {
        assert_eq!(swap_day_month(d("01/11/2020")), Some(d("11/01/2020")));
        assert_eq!(swap_day_month(d("12/04/2020")), Some(d("04/12/2020")));
        assert_eq!(swap_day_month(d("13/04/2020")), None);
        assert_eq!(swap_day_month(d("05/05/2021")), Some(d("05/05/2021")));
    }

    #[test]
    fn swapped_dates_are_fixed() {
        let mut ds = dataset(&[("20/01/2020", "19/01/2020")]);
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(derived(&ds, 0), 1);
        assert_eq!(report.fixed[0].fix, DateFix::Swap);
        assert_eq!(ds.value(0, "Order Date").unwrap(), &CellValue::Date(d("19/01/2020")));
    }

    #[test]
    fn transposed_order_date_is_fixed() {
        let mut ds = dataset(&[("01/11/2020", "12/01/2020")]);
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(derived(&ds, 0), 1);
        assert_eq!(report.fixed[0].fix, DateFix::Order);
        assert_eq!(ds.value(0, "Order Date").unwrap(), &CellValue::Date(d("11/01/2020")));
    }

    #[test]
    fn transposed_ship_date_is_fixed() {
        // SHIP and BOTH both give 1 day; SHIP is listed first.
        let mut ds = dataset(&[("01/01/2020", "01/02/2020")]);
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(derived(&ds, 0), 1);
        assert_eq!(report.fixed[0].fix, DateFix::Ship);
    }

    #[test]
    fn both_dates_transposed() {
        let mut ds = dataset(&[("12/01/2020", "12/04/2020")]);
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(derived(&ds, 0), 3);
        assert_eq!(report.fixed[0].fix, DateFix::Both);
    }

    #[test]
    fn in_threshold_row_untouched() {
        let mut ds = dataset(&[("01/01/2020", "15/01/2020")]);
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(derived(&ds, 0), 14);
        assert_eq!(report.examined, 0);
        assert!(report.fixed.is_empty());
    }

    #[test]
    fn none_wins_when_nothing_shorter() {
        // 20 days, no transposition possible (both days > 12), swap is negative.
        let c = best_fix(d("13/01/2020"), d("02/02/2020")).unwrap();
        assert_eq!(c.fix, DateFix::None);
        assert_eq!(c.duration.num_days(), 20);
    }

    #[test]
    fn tie_keeps_earlier_candidate() {
        // Same date: NONE and SWAP both give 0, NONE wins.
        let c = best_fix(d("05/03/2020"), d("05/03/2020")).unwrap();
        assert_eq!(c.fix, DateFix::None);
        assert_eq!(c.duration, Duration::zero());
    }

    #[test]
    fn best_fix_is_minimal_over_all_candidates() {
        let order = d("03/10/2020");
        let ship = d("07/02/2020");
        let chosen = best_fix(order, ship).unwrap();
        let min = DateFix::ALL
            .iter()
            .filter_map(|f| f.apply(order, ship))
            .map(|(o, s)| s - o)
            .filter(|dur| *dur >= Duration::zero())
            .min()
            .unwrap();
        assert_eq!(chosen.duration, min);
    }

    #[test]
    fn swap_always_rescues_a_negative_pair() {
        // NONE and SWAP are always valid and have opposite signs, so a
        // selected row with both dates present is never unresolved.
        let c = best_fix(d("28/12/2020"), d("14/01/2020"));
        assert!(c.is_some());
    }

    #[test]
    fn missing_dates_left_alone() {
        let mut ds = Dataset::from_rows(
            &["Order Date", "Ship Date"],
            vec![vec![d("20/01/2020").into(), CellValue::Missing]],
        );
        let report = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(report.examined, 0);
        assert!(ds.value(0, "Time Till Shipping").unwrap().is_missing());
        assert_eq!(ds.value(0, "Order Date").unwrap(), &CellValue::Date(d("20/01/2020")));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut ds = dataset(&[
            ("20/01/2020", "19/01/2020"),
            ("01/11/2020", "12/01/2020"),
            ("12/01/2020", "12/04/2020"),
            ("01/01/2020", "10/01/2020"),
        ]);
        reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        let once = ds.clone();
        let second = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(second.examined, 0);
        assert_eq!(ds, once);
    }

    #[test]
    fn over_threshold_result_is_flagged_and_refixed_next_pass() {
        // Only SWAP is non-negative (31 days), which is still over 15.
        let mut ds = dataset(&[("01/02/2020", "01/01/2020")]);
        let first = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(first.fixed[0].fix, DateFix::Swap);
        assert_eq!(derived(&ds, 0), 31);
        assert_eq!(first.over_threshold, vec![0]);
        assert!(!first.is_clean());

        // The swapped pair now offers a ship-date transposition of 1 day.
        let second = reconcile_dates(&mut ds, &DateColumns::default()).unwrap();
        assert_eq!(second.examined, 1);
        assert_eq!(second.fixed[0].fix, DateFix::Ship);
        assert!(second.over_threshold.is_empty());
        assert_eq!(ds.value(0, "Order Date").unwrap(), &CellValue::Date(d("01/01/2020")));
        assert_eq!(ds.value(0, "Ship Date").unwrap(), &CellValue::Date(d("02/01/2020")));
        assert_eq!(derived(&ds, 0), 1);
    }

    #[test]
    fn custom_threshold_and_columns() {
        let mut ds = Dataset::from_rows(
            &["placed", "sent"],
            vec![vec![d("01/01/2020").into(), d("15/01/2020").into()]],
        );
        let cols = DateColumns {
            order: "placed".into(),
            ship: "sent".into(),
            derived: "lag".into(),
            threshold_days: 7,
        };
        let report = reconcile_dates(&mut ds, &cols).unwrap();
        assert_eq!(report.examined, 1);
        // 01/01 -> 01/01 transposed is unchanged, 15/01 cannot transpose,
        // swap is negative: NONE is still the best reading.
        assert!(report.fixed.is_empty());
        assert_eq!(report.over_threshold, vec![0]);
        assert_eq!(ds.value(0, "lag").unwrap().as_duration(), Some(Duration::days(14)));
    }

    #[test]
    fn missing_column_fails_fast() {
        let mut ds = Dataset::from_rows(&["Order Date"], vec![]);
        let err = reconcile_dates(&mut ds, &DateColumns::default()).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn { ref column } if column == "Ship Date"));
    }

    #[test]
    fn non_date_cell_is_type_mismatch() {
        let mut ds = Dataset::from_rows(
            &["Order Date", "Ship Date"],
            vec![vec!["yesterday".into(), d("01/01/2020").into()]],
        );
        let err = reconcile_dates(&mut ds, &DateColumns::default()).unwrap_err();
        assert!(matches!(err, CleanError::TypeMismatch { row: 0, .. }));
    }
}
