//! `workbench-cleaning` — order/shipment data cleaning.
//!
//! Pure engine crate: receives an in-memory [`Dataset`], fixes implausible
//! order/ship date pairs, audits and fills columns that should agree across
//! related rows, and returns structured reports. No file IO and no console
//! output; diagnostics go through the `log` facade.

pub mod config;
pub mod consistency;
pub mod dates;
pub mod engine;
pub mod error;
pub mod fill;
pub mod load;
pub mod missing;
pub mod model;

pub use config::CleaningConfig;
pub use consistency::{check_consistency, ConsistencyOutcome};
pub use dates::{reconcile_dates, DateColumns, DateFix};
pub use engine::run;
pub use error::CleanError;
pub use fill::fill_from_relatives;
pub use load::load_csv;
pub use model::{CellKey, CellValue, Dataset};
