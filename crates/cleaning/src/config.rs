use serde::Deserialize;

use crate::dates::DateColumns;
use crate::error::CleanError;
use crate::load::{CsvOptions, DEFAULT_DATE_FORMAT};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CleaningConfig {
    pub name: String,
    /// Columns loaded as text regardless of content (postcodes, codes).
    #[serde(default)]
    pub text_columns: Vec<String>,
    #[serde(default)]
    pub dates: Option<DatesConfig>,
    #[serde(default)]
    pub missing: Option<MissingConfig>,
    #[serde(default)]
    pub consistency: Vec<ConsistencyCheck>,
    #[serde(default)]
    pub fill: Vec<FillRule>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Date reconciliation pass. Column names and threshold default to the
/// order/ship layout of a typical order export.
#[derive(Debug, Clone, Deserialize)]
pub struct DatesConfig {
    #[serde(flatten)]
    pub columns: DateColumns,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissingConfig {
    #[serde(default = "default_id_column")]
    pub id_column: String,
}

fn default_id_column() -> String {
    "Row ID".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsistencyCheck {
    pub key_column: String,
    pub check_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillRule {
    pub target_column: String,
    pub relative_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CleaningConfig {
    pub fn from_toml(input: &str) -> Result<Self, CleanError> {
        let config: CleaningConfig =
            toml::from_str(input).map_err(|e| CleanError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CleanError> {
        if let Some(ref dates) = self.dates {
            let c = &dates.columns;
            let names = [
                ("order_column", &c.order),
                ("ship_column", &c.ship),
                ("derived_column", &c.derived),
            ];
            for (field, value) in names {
                if value.trim().is_empty() {
                    return Err(CleanError::ConfigValidation(format!("dates.{field} is empty")));
                }
            }
            if c.order == c.ship {
                return Err(CleanError::ConfigValidation(
                    "dates: order and ship columns must differ".into(),
                ));
            }
            if c.derived == c.order || c.derived == c.ship {
                return Err(CleanError::ConfigValidation(
                    "dates: derived column cannot overwrite a date column".into(),
                ));
            }
            if c.threshold_days < 0 {
                return Err(CleanError::ConfigValidation(format!(
                    "dates.threshold_days must be >= 0, got {}",
                    c.threshold_days
                )));
            }
        }

        if let Some(ref dates) = self.dates {
            let c = &dates.columns;
            if let Some(col) = self.text_columns.iter().find(|t| **t == c.order || **t == c.ship) {
                return Err(CleanError::ConfigValidation(format!(
                    "text_columns: '{col}' is a date column"
                )));
            }
        }

        if let Some(ref missing) = self.missing {
            if missing.id_column.trim().is_empty() {
                return Err(CleanError::ConfigValidation("missing.id_column is empty".into()));
            }
        }

        for (i, check) in self.consistency.iter().enumerate() {
            if check.key_column.trim().is_empty() {
                return Err(CleanError::ConfigValidation(format!(
                    "consistency[{i}]: key_column is empty"
                )));
            }
            if check.check_columns.is_empty() {
                return Err(CleanError::ConfigValidation(format!(
                    "consistency[{i}]: check_columns must not be empty"
                )));
            }
        }

        for (i, rule) in self.fill.iter().enumerate() {
            if rule.relative_columns.is_empty() {
                return Err(CleanError::ConfigValidation(format!(
                    "fill[{i}]: relative_columns must not be empty"
                )));
            }
            if rule.relative_columns.contains(&rule.target_column) {
                return Err(CleanError::ConfigValidation(format!(
                    "fill[{i}]: target '{}' cannot be one of its relative columns",
                    rule.target_column
                )));
            }
        }

        Ok(())
    }

    /// CSV typing implied by this config: the date columns, day-first by
    /// default, plus any forced text columns.
    pub fn csv_options(&self) -> CsvOptions {
        let mut options = match self.dates {
            Some(ref dates) => CsvOptions {
                date_columns: vec![dates.columns.order.clone(), dates.columns.ship.clone()],
                date_format: dates.date_format.clone(),
                ..CsvOptions::default()
            },
            None => CsvOptions::default(),
        };
        options.text_columns = self.text_columns.clone();
        options
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
