// 🏗️ Parser Framework
// Bank-specific CSV layouts -> bank-agnostic raw rows

pub mod amex;
pub mod nationwide;

use crate::error::ParseError;
use csv::ByteRecord;
use serde::{Deserialize, Serialize};
use std::io::Read;

pub use amex::AmexParser;
pub use nationwide::NationwideParser;

// ============================================================================
// CORE TYPES
// ============================================================================

/// BankType - every statement export the registry knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BankType {
    Amex,
    Nationwide,
}

impl BankType {
    pub const ALL: [BankType; 2] = [BankType::Amex, BankType::Nationwide];

    /// Lowercase identifier used by callers and stored on transactions
    pub fn id(&self) -> &'static str {
        match self {
            BankType::Amex => amex::BANK,
            BankType::Nationwide => nationwide::BANK,
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            BankType::Amex => amex::NAME,
            BankType::Nationwide => nationwide::NAME,
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            BankType::Amex => amex::CURRENCY,
            BankType::Nationwide => nationwide::CURRENCY,
        }
    }

    /// chrono format string of the export's date column
    pub fn date_format(&self) -> &'static str {
        match self {
            BankType::Amex => amex::DATE_FORMAT,
            BankType::Nationwide => nationwide::DATE_FORMAT,
        }
    }

    /// Case-insensitive lookup by identifier
    pub fn from_id(id: &str) -> Option<BankType> {
        let id = id.to_lowercase();
        BankType::ALL.into_iter().find(|bank| bank.id() == id)
    }
}

/// Amount cell(s) exactly as the export wrote them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawAmount {
    /// One signed amount column
    Signed(String),
    /// Separate money-out / money-in columns; empty cells are `None`
    Split {
        paid_out: Option<String>,
        paid_in: Option<String>,
    },
}

/// TransactionRow - output of `BankParser::parse`, before any format parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// 1-based data row (header and preamble excluded)
    pub row: usize,
    /// Physical line in the CSV, for diagnostics
    pub line: u64,
    pub date: String,
    pub description: String,
    pub amount: RawAmount,
    pub bank: String,
    pub category: Option<String>,
}

impl TransactionRow {
    pub fn new(
        row: usize,
        date: String,
        description: String,
        amount: RawAmount,
        bank: &str,
    ) -> Self {
        TransactionRow {
            row,
            line: 0,
            date,
            description,
            amount,
            bank: bank.to_string(),
            category: None,
        }
    }

    /// Builder pattern: record the source line
    pub fn at_line(mut self, line: u64) -> Self {
        self.line = line;
        self
    }

    /// Builder pattern: add optional category
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// BankParser - one implementation per export layout.
///
/// Parsers only locate and extract fields; dates and amounts stay raw strings
/// until `mapper::map_rows` normalizes them. Any structural problem fails the
/// whole stream, no partial output is returned.
pub trait BankParser: Send + Sync {
    /// Read the whole CSV stream and return its data rows in source order
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TransactionRow>, ParseError>;

    /// Get the bank this parser handles
    fn bank_type(&self) -> BankType;
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Get the parser for a bank identifier (case-insensitive)
///
/// # Example:
/// ```
/// use statement_ingest::parser::{get_parser, BankType};
///
/// let parser = get_parser("AMEX").unwrap();
/// assert_eq!(parser.bank_type(), BankType::Amex);
/// assert!(get_parser("unknown").is_err());
/// ```
pub fn get_parser(bank_type: &str) -> Result<Box<dyn BankParser>, ParseError> {
    let bank = BankType::from_id(bank_type)
        .ok_or_else(|| ParseError::UnsupportedBankType(bank_type.to_string()))?;

    Ok(match bank {
        BankType::Amex => Box::new(AmexParser::new()),
        BankType::Nationwide => Box::new(NationwideParser::new()),
    })
}

/// Identifiers accepted by `get_parser`
pub fn supported_banks() -> Vec<&'static str> {
    BankType::ALL.iter().map(BankType::id).collect()
}

// ============================================================================
// SHARED CSV HELPERS
// ============================================================================

/// Exports vary in field count between preamble and data, so rows are flexible
/// and headers are located by the parsers themselves.
pub(crate) fn csv_reader(input: &mut dyn Read) -> csv::Reader<&mut dyn Read> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// Decode one CSV field: UTF-8 when valid, otherwise Latin-1 byte-for-byte.
///
/// Statement exports mix encodings (a bare `0xA3` pound sign next to UTF-8
/// text), so undecodable bytes are never an error.
pub fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Decode a header row; a UTF-8 byte-order mark on the first cell is dropped
pub(crate) fn decode_header(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = decode_field(field);
            if i == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name
            }
        })
        .collect()
}

/// Index of the first header exactly equal to `name`
pub fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

/// Locate every required column, reporting all missing names at once
pub(crate) fn require_columns<const N: usize>(
    bank: &'static str,
    headers: &[String],
    names: [&'static str; N],
) -> Result<[usize; N], ParseError> {
    let found = names.map(|name| find_column(headers, name));

    let missing: Vec<&'static str> = names
        .iter()
        .zip(found.iter())
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingRequiredColumns { bank, missing });
    }

    Ok(found.map(Option::unwrap_or_default))
}

/// Fail with `RowTooShort` unless every index in `columns` exists in the record
pub(crate) fn check_width(
    bank: &'static str,
    row: usize,
    record: &ByteRecord,
    columns: &[usize],
) -> Result<(), ParseError> {
    let expected = columns.iter().max().map_or(0, |max| max + 1);
    if record.len() < expected {
        return Err(ParseError::RowTooShort {
            bank,
            row,
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

pub(crate) fn record_line(record: &ByteRecord) -> u64 {
    record.position().map_or(0, |pos| pos.line())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bank_type_ids_and_names() {
        assert_eq!(BankType::Amex.id(), "amex");
        assert_eq!(BankType::Nationwide.id(), "nationwide");
        assert_eq!(BankType::Amex.name(), "American Express");
        assert_eq!(BankType::Nationwide.name(), "Nationwide");
        assert_eq!(BankType::Amex.currency(), "GBP");
    }

    #[test]
    fn test_get_parser_is_case_insensitive() {
        for id in ["amex", "AMEX", "Amex"] {
            assert_eq!(get_parser(id).unwrap().bank_type(), BankType::Amex);
        }
        assert_eq!(
            get_parser("NationWide").unwrap().bank_type(),
            BankType::Nationwide
        );
    }

    #[test]
    fn test_get_parser_unsupported() {
        for id in ["unknown", "", "amex "] {
            let err = get_parser(id).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::UnsupportedBankType);
        }
    }

    #[test]
    fn test_registry_covers_every_bank() {
        assert_eq!(supported_banks(), vec!["amex", "nationwide"]);
        for bank in BankType::ALL {
            assert_eq!(get_parser(bank.id()).unwrap().bank_type(), bank);
        }
    }

    #[test]
    fn test_find_column_first_match_wins() {
        let h = headers(&["Date", "Amount", "Date"]);
        assert_eq!(find_column(&h, "Date"), Some(0));
        assert_eq!(find_column(&h, "Amount"), Some(1));
        assert_eq!(find_column(&h, "amount"), None);
        assert_eq!(find_column(&h, "Category"), None);
    }

    #[test]
    fn test_require_columns_reports_all_missing() {
        let h = headers(&["Date", "Description"]);
        match require_columns("nationwide", &h, ["Date", "Paid out", "Paid in"]) {
            Err(ParseError::MissingRequiredColumns { bank, missing }) => {
                assert_eq!(bank, "nationwide");
                assert_eq!(missing, vec!["Paid out", "Paid in"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }

        let found = require_columns("amex", &h, ["Description", "Date"]).unwrap();
        assert_eq!(found, [1, 0]);
    }

    #[test]
    fn test_decode_field_falls_back_to_latin1() {
        assert_eq!(decode_field("£5.00".as_bytes()), "£5.00");
        assert_eq!(decode_field(b"\xa35.00"), "£5.00");
        assert_eq!(decode_field(b"Caf\xe9"), "Café");
    }

    #[test]
    fn test_decode_header_strips_bom() {
        let record = ByteRecord::from(vec!["\u{feff}Date", "Description"]);
        assert_eq!(decode_header(&record), headers(&["Date", "Description"]));
    }

    #[test]
    fn test_check_width() {
        let record = ByteRecord::from(vec!["a", "b", "c"]);
        assert!(check_width("amex", 1, &record, &[0, 2]).is_ok());
        match check_width("amex", 7, &record, &[1, 4]) {
            Err(ParseError::RowTooShort { row, expected, found, .. }) => {
                assert_eq!((row, expected, found), (7, 5, 3));
            }
            other => panic!("expected RowTooShort, got {:?}", other),
        }
    }

    #[test]
    fn test_transaction_row_builder() {
        let row = TransactionRow::new(
            2,
            "15/01/2026".to_string(),
            "TEST".to_string(),
            RawAmount::Signed("-25.50".to_string()),
            "amex",
        )
        .at_line(3)
        .with_category(Some("Shopping".to_string()));

        assert_eq!(row.row, 2);
        assert_eq!(row.line, 3);
        assert_eq!(row.bank, "amex");
        assert_eq!(row.category, Some("Shopping".to_string()));
    }
}
