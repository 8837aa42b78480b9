// 📅 Date Parser
// Per-bank date formats -> calendar dates

use crate::error::DateError;
use crate::parser::BankType;
use chrono::NaiveDate;

/// chrono format string used by `bank`'s export, if the bank is known
pub fn date_format(bank: &str) -> Option<&'static str> {
    BankType::from_id(bank).map(|bank| bank.date_format())
}

/// Parse a raw date cell using the format registered for `bank`.
///
/// The cell must be written exactly as the bank writes it: zero-padded day
/// and month, four-digit year, no surrounding whitespace.
pub fn parse_date(raw: &str, bank: &str) -> Result<NaiveDate, DateError> {
    let format = date_format(bank).ok_or_else(|| DateError::UnknownBank(bank.to_string()))?;
    parse_date_with(raw, bank, format)
}

pub(crate) fn parse_date_with(raw: &str, bank: &str, format: &str) -> Result<NaiveDate, DateError> {
    let failure = |source: Option<chrono::ParseError>| DateError::Parse {
        raw: raw.to_string(),
        bank: bank.to_string(),
        source,
    };

    let date = NaiveDate::parse_from_str(raw, format).map_err(|e| failure(Some(e)))?;

    // chrono accepts unpadded fields and years of any width; only the canonical form is valid
    if date.format(format).to_string() != raw {
        return Err(failure(None));
    }

    Ok(date)
}
