// 🏦 Nationwide Building Society CSV export
//
// "Account Name:","FlexDirect ****12345"
// "Account Balance:","£1,234.56"
// "Available Balance: ","£1,234.56"
// (blank line)
// "Date","Transaction type","Description","Paid out","Paid in","Balance"
//
// Money out and money in live in separate columns; exactly one is filled per row.

use super::{
    check_width, csv_reader, decode_field, decode_header, record_line, require_columns,
    BankParser, BankType, RawAmount, TransactionRow,
};
use crate::error::ParseError;
use csv::ByteRecord;
use std::io::Read;

pub const BANK: &str = "nationwide";
pub const NAME: &str = "Nationwide";
pub const CURRENCY: &str = "GBP";
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Account name, balance and available balance rows before the header
const PREAMBLE_ROWS: usize = 3;

#[derive(Debug, Default, Clone, Copy)]
pub struct NationwideParser;

impl NationwideParser {
    pub fn new() -> Self {
        NationwideParser
    }
}

impl BankParser for NationwideParser {
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TransactionRow>, ParseError> {
        let mut records = csv_reader(input).into_byte_records();
        let csv_error = |source: csv::Error| ParseError::Csv { bank: BANK, source };

        for _ in 0..PREAMBLE_ROWS {
            match records.next() {
                Some(result) => {
                    result.map_err(csv_error)?;
                }
                None => return Err(ParseError::MissingHeader { bank: BANK }),
            }
        }

        // The number of blank lines before the header varies between exports
        let header = loop {
            match records.next() {
                Some(result) => {
                    let record = result.map_err(csv_error)?;
                    if !first_field_blank(&record) {
                        break record;
                    }
                }
                None => return Err(ParseError::MissingHeader { bank: BANK }),
            }
        };
        let headers = decode_header(&header);

        let [date_idx, description_idx, paid_out_idx, paid_in_idx] = require_columns(
            BANK,
            &headers,
            ["Date", "Description", "Paid out", "Paid in"],
        )?;

        let mut rows = Vec::new();
        for (i, result) in records.enumerate() {
            let row = i + 1;
            let record = result.map_err(csv_error)?;
            check_width(
                BANK,
                row,
                &record,
                &[date_idx, description_idx, paid_out_idx, paid_in_idx],
            )?;

            let amount = RawAmount::Split {
                paid_out: non_blank(decode_field(&record[paid_out_idx])),
                paid_in: non_blank(decode_field(&record[paid_in_idx])),
            };

            let tx = TransactionRow::new(
                row,
                decode_field(&record[date_idx]),
                decode_field(&record[description_idx]),
                amount,
                BANK,
            )
            .at_line(record_line(&record));

            rows.push(tx);
        }

        Ok(rows)
    }

    fn bank_type(&self) -> BankType {
        BankType::Nationwide
    }
}

fn first_field_blank(record: &ByteRecord) -> bool {
    record
        .get(0)
        .map_or(true, |field| field.iter().all(u8::is_ascii_whitespace))
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
