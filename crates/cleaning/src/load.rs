use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::CleanError;
use crate::model::{CellValue, Dataset};

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// How to type the cells of CSV text.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvOptions {
    /// Columns parsed as dates with `date_format`.
    #[serde(default)]
    pub date_columns: Vec<String>,
    /// Columns kept as text even when a cell looks numeric.
    #[serde(default)]
    pub text_columns: Vec<String>,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.into()
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            date_columns: Vec::new(),
            text_columns: Vec::new(),
            date_format: default_date_format(),
        }
    }
}

/// Parse CSV text with a header row into a [`Dataset`].
///
/// Blank cells become `Missing`. Date columns must parse with the configured
/// format. Text columns are never typed. Other cells become numbers when they
/// parse as one, text otherwise; a zero-padded value such as `01234` stays
/// text so codes keep their leading zeros.
pub fn load_csv(data: &str, options: &CsvOptions) -> Result<Dataset, CleanError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let is_date: Vec<bool> = headers
        .iter()
        .map(|h| options.date_columns.iter().any(|d| d == h))
        .collect();
    let is_text: Vec<bool> = headers
        .iter()
        .map(|h| options.text_columns.iter().any(|t| t == h))
        .collect();
    for wanted in options.date_columns.iter().chain(&options.text_columns) {
        if !headers.contains(wanted) {
            return Err(CleanError::MissingColumn {
                column: wanted.clone(),
            });
        }
    }

    let mut dataset = Dataset::new(headers.clone());
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut cells = Vec::with_capacity(headers.len());
        for (col, raw) in record.iter().enumerate().take(headers.len()) {
            let cell = if is_date[col] {
                parse_date(raw, &options.date_format).map_err(|_| CleanError::DateParse {
                    column: headers[col].clone(),
                    row,
                    value: raw.to_string(),
                })?
            } else if is_text[col] {
                parse_text(raw)
            } else {
                parse_cell(raw)
            };
            cells.push(cell);
        }
        dataset.push_row(cells);
    }

    Ok(dataset)
}

fn parse_date(raw: &str, format: &str) -> Result<CellValue, chrono::ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CellValue::Missing);
    }
    NaiveDate::parse_from_str(trimmed, format).map(CellValue::Date)
}

fn parse_text(raw: &str) -> CellValue {
    if raw.trim().is_empty() {
        CellValue::Missing
    } else {
        CellValue::Text(raw.to_string())
    }
}

fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Missing;
    }
    if has_leading_zero(trimmed) {
        return CellValue::Text(raw.to_string());
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

/// `0` followed by another digit: `007`, `01234`. Not `0` or `0.5`.
fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s).as_bytes();
    digits.len() > 1 && digits[0] == b'0' && digits[1].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CsvOptions {
        CsvOptions {
            date_columns: vec!["Order Date".into(), "Ship Date".into()],
            ..CsvOptions::default()
        }
    }

    #[test]
    fn load_typed_cells() {
        let csv = "\
Row ID,Order Date,Ship Date,City,Postal Code
1,20/01/2020,19/01/2020,Hull,HU1
2,01/11/2020,,,YO1
";
        let ds = load_csv(csv, &options()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(0, "Row ID").unwrap(), &CellValue::Number(1.0));
        assert_eq!(
            ds.value(0, "Order Date").unwrap(),
            &CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 20).unwrap())
        );
        assert_eq!(ds.value(1, "Ship Date").unwrap(), &CellValue::Missing);
        assert_eq!(ds.value(1, "City").unwrap(), &CellValue::Missing);
        assert_eq!(ds.value(1, "Postal Code").unwrap(), &CellValue::text("YO1"));
    }

    #[test]
    fn bad_date_reports_position() {
        let csv = "Order Date,Ship Date\n2020-01-20,19/01/2020\n";
        let err = load_csv(csv, &options()).unwrap_err();
        match err {
            CleanError::DateParse { column, row, value } => {
                assert_eq!(column, "Order Date");
                assert_eq!(row, 0);
                assert_eq!(value, "2020-01-20");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_date_column_fails_fast() {
        let csv = "Order Date\n20/01/2020\n";
        let err = load_csv(csv, &options()).unwrap_err();
        assert!(err.to_string().contains("Ship Date"));
    }

    #[test]
    fn zero_padded_codes_stay_text() {
        let csv = "Postal Code,Qty,Discount\n01234,0,0.5\n";
        let ds = load_csv(csv, &CsvOptions::default()).unwrap();
        assert_eq!(ds.value(0, "Postal Code").unwrap(), &CellValue::text("01234"));
        assert_eq!(ds.value(0, "Qty").unwrap(), &CellValue::Number(0.0));
        assert_eq!(ds.value(0, "Discount").unwrap(), &CellValue::Number(0.5));
    }

    #[test]
    fn text_columns_are_never_numbers() {
        let csv = "Postal Code,Row ID\n10115,1\n,2\n";
        let opts = CsvOptions {
            text_columns: vec!["Postal Code".into()],
            ..CsvOptions::default()
        };
        let ds = load_csv(csv, &opts).unwrap();
        assert_eq!(ds.value(0, "Postal Code").unwrap(), &CellValue::text("10115"));
        assert_eq!(ds.value(1, "Postal Code").unwrap(), &CellValue::Missing);
        assert_eq!(ds.value(0, "Row ID").unwrap(), &CellValue::Number(1.0));
    }

    #[test]
    fn unknown_text_column_fails_fast() {
        let opts = CsvOptions {
            text_columns: vec!["Zip".into()],
            ..CsvOptions::default()
        };
        let err = load_csv("City\nHull\n", &opts).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn { ref column } if column == "Zip"));
    }

    #[test]
    fn short_records_are_padded() {
        let csv = "a,b,c\nx\n";
        let ds = load_csv(csv, &CsvOptions::default()).unwrap();
        assert!(ds.value(0, "c").unwrap().is_missing());
    }
}
