use std::fmt;

#[derive(Debug)]
pub enum CleanError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column list, target among relatives, etc.).
    ConfigValidation(String),
    /// A required column is absent from the dataset.
    MissingColumn { column: String },
    /// A non-missing cell does not hold the type the operation needs.
    TypeMismatch { column: String, row: usize, expected: &'static str },
    /// Date parse error while loading.
    DateParse { column: String, row: usize, value: String },
    /// CSV reader error.
    Csv(String),
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::TypeMismatch { column, row, expected } => {
                write!(f, "column '{column}', row {row}: expected {expected}")
            }
            Self::DateParse { column, row, value } => {
                write!(f, "column '{column}', row {row}: cannot parse date '{value}'")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for CleanError {}

impl From<csv::Error> for CleanError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
