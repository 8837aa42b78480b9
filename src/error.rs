// 🚨 Error Taxonomy
// Every ingestion failure, from a single bad cell up to a rejected upload

use thiserror::Error;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Flat classification of ingestion failures, independent of which layer
/// produced them. Callers use this to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedBankType,
    UnknownBankType,
    MissingHeader,
    MissingRequiredColumns,
    RowTooShort,
    DateParseFailure,
    EmptyAmount,
    MalformedAmount,
    MalformedCsv,
}

// ============================================================================
// FIELD-LEVEL ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount string {raw:?}")]
    Empty { raw: String },

    #[error("malformed amount {raw:?}")]
    Malformed { raw: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("no date format registered for bank {0:?}")]
    UnknownBank(String),

    /// `source` is `None` when chrono accepted the text but it is not written
    /// in the bank's exact form (unpadded day, short year)
    #[error("parsing date {raw:?} for {bank}")]
    Parse {
        raw: String,
        bank: String,
        #[source]
        source: Option<chrono::ParseError>,
    },
}

/// Failure while normalizing one raw row
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error(transparent)]
    Date(#[from] DateError),

    #[error("parsing {field} amount")]
    Amount {
        field: &'static str,
        #[source]
        source: AmountError,
    },
}

impl RowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RowError::Date(DateError::UnknownBank(_)) => ErrorKind::UnknownBankType,
            RowError::Date(DateError::Parse { .. }) => ErrorKind::DateParseFailure,
            RowError::Amount { source: AmountError::Empty { .. }, .. } => ErrorKind::EmptyAmount,
            RowError::Amount { source: AmountError::Malformed { .. }, .. } => {
                ErrorKind::MalformedAmount
            }
        }
    }
}

// ============================================================================
// PARSE ERROR (structural + row-level)
// ============================================================================

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported bank type {0:?}")]
    UnsupportedBankType(String),

    /// Bank passed the registry but has no date format: a configuration defect
    #[error("unknown bank type {0:?}")]
    UnknownBankType(String),

    #[error("{bank}: no header row found")]
    MissingHeader { bank: &'static str },

    #[error("{bank}: required column(s) not found in CSV headers: {}", .missing.join(", "))]
    MissingRequiredColumns {
        bank: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("{bank}: row {row} has {found} fields, expected at least {expected}")]
    RowTooShort {
        bank: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{bank}: row {row}")]
    Row {
        bank: String,
        row: usize,
        #[source]
        source: RowError,
    },

    #[error("{bank}: reading CSV")]
    Csv {
        bank: &'static str,
        #[source]
        source: csv::Error,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::UnsupportedBankType(_) => ErrorKind::UnsupportedBankType,
            ParseError::UnknownBankType(_) => ErrorKind::UnknownBankType,
            ParseError::MissingHeader { .. } => ErrorKind::MissingHeader,
            ParseError::MissingRequiredColumns { .. } => ErrorKind::MissingRequiredColumns,
            ParseError::RowTooShort { .. } => ErrorKind::RowTooShort,
            ParseError::Row { source, .. } => source.kind(),
            ParseError::Csv { .. } => ErrorKind::MalformedCsv,
        }
    }

    /// 1-based data row the failure belongs to, when it is row-level
    pub fn row(&self) -> Option<usize> {
        match self {
            ParseError::RowTooShort { row, .. } | ParseError::Row { row, .. } => Some(*row),
            _ => None,
        }
    }
}

// ============================================================================
// IMPORT ERROR (service boundary)
// ============================================================================

/// Outcome classes of an upload, mirroring how a caller should respond
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid bank type")]
    InvalidBankType(#[source] ParseError),

    #[error("parse failure")]
    ParseFailure(#[source] ParseError),

    #[error("database failure")]
    Storage(#[source] anyhow::Error),
}

impl ImportError {
    /// HTTP status the upload endpoint answers with
    pub fn status_code(&self) -> u16 {
        match self {
            ImportError::InvalidBankType(_) => 400,
            ImportError::ParseFailure(_) => 422,
            ImportError::Storage(_) => 500,
        }
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            ImportError::InvalidBankType(e) | ImportError::ParseFailure(e) => Some(e),
            ImportError::Storage(_) => None,
        }
    }
}

/// Render an error and all of its causes as `outer: inner: root`
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        parts.push(cause.to_string());
        current = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_failure() -> ParseError {
        let source = chrono::NaiveDate::parse_from_str("invalid date", "%d/%m/%Y").unwrap_err();
        ParseError::Row {
            bank: "amex".to_string(),
            row: 3,
            source: RowError::Date(DateError::Parse {
                raw: "invalid date".to_string(),
                bank: "amex".to_string(),
                source: Some(source),
            }),
        }
    }

    #[test]
    fn test_missing_columns_message_lists_every_column() {
        let err = ParseError::MissingRequiredColumns {
            bank: "nationwide",
            missing: vec!["Paid out", "Paid in"],
        };
        assert_eq!(
            err.to_string(),
            "nationwide: required column(s) not found in CSV headers: Paid out, Paid in"
        );
        assert_eq!(err.kind(), ErrorKind::MissingRequiredColumns);
        assert_eq!(err.row(), None);
    }

    #[test]
    fn test_row_error_kind_follows_cause() {
        let err = date_failure();
        assert_eq!(err.kind(), ErrorKind::DateParseFailure);
        assert_eq!(err.row(), Some(3));

        let err = ParseError::Row {
            bank: "amex".to_string(),
            row: 1,
            source: RowError::Amount {
                field: "Amount",
                source: AmountError::Empty { raw: "£".to_string() },
            },
        };
        assert_eq!(err.kind(), ErrorKind::EmptyAmount);
    }

    #[test]
    fn test_error_chain_keeps_raw_value_and_cause() {
        let chain = error_chain(&date_failure());
        assert!(chain.starts_with("amex: row 3: parsing date \"invalid date\" for amex: "));
    }

    #[test]
    fn test_import_error_status_codes() {
        let invalid = ImportError::InvalidBankType(ParseError::UnsupportedBankType("hsbc".into()));
        let parse = ImportError::ParseFailure(date_failure());
        let storage = ImportError::Storage(anyhow::anyhow!("disk full"));

        assert_eq!(invalid.status_code(), 400);
        assert_eq!(parse.status_code(), 422);
        assert_eq!(storage.status_code(), 500);
        assert!(storage.parse_error().is_none());
        assert_eq!(
            parse.parse_error().map(ParseError::kind),
            Some(ErrorKind::DateParseFailure)
        );
        assert_eq!(error_chain(&storage), "database failure: disk full");
    }
}
