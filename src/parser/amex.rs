// 💳 American Express (UK) CSV export
//
// Date,Description,Card Member,Account #,Amount,Extended Details,
// Appears On Your Statement As,Address,Town/City,Postcode,Country,Reference,Category
//
// Amounts are already signed, categories are optional.

use super::{
    check_width, csv_reader, decode_field, decode_header, find_column, record_line,
    require_columns, BankParser, BankType, RawAmount, TransactionRow,
};
use crate::error::ParseError;
use std::io::Read;

pub const BANK: &str = "amex";
pub const NAME: &str = "American Express";
pub const CURRENCY: &str = "GBP";
pub const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Default, Clone, Copy)]
pub struct AmexParser;

impl AmexParser {
    pub fn new() -> Self {
        AmexParser
    }
}

impl BankParser for AmexParser {
    fn parse(&self, input: &mut dyn Read) -> Result<Vec<TransactionRow>, ParseError> {
        let mut records = csv_reader(input).into_byte_records();

        let header = match records.next() {
            Some(result) => result.map_err(|source| ParseError::Csv { bank: BANK, source })?,
            None => return Err(ParseError::MissingHeader { bank: BANK }),
        };
        let headers = decode_header(&header);

        let [date_idx, description_idx, amount_idx] =
            require_columns(BANK, &headers, ["Date", "Description", "Amount"])?;
        let category_idx = find_column(&headers, "Category");

        let mut rows = Vec::new();
        for (i, result) in records.enumerate() {
            let row = i + 1;
            let record = result.map_err(|source| ParseError::Csv { bank: BANK, source })?;
            check_width(BANK, row, &record, &[date_idx, description_idx, amount_idx])?;

            let category = category_idx
                .and_then(|idx| record.get(idx))
                .map(|field| decode_field(field).trim().to_string())
                .filter(|category| !category.is_empty());

            let tx = TransactionRow::new(
                row,
                decode_field(&record[date_idx]),
                decode_field(&record[description_idx]),
                RawAmount::Signed(decode_field(&record[amount_idx])),
                BANK,
            )
            .at_line(record_line(&record))
            .with_category(category);

            rows.push(tx);
        }

        Ok(rows)
    }

    fn bank_type(&self) -> BankType {
        BankType::Amex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const HEADER: &str = "Date,Description,Card Member,Account #,Amount,Extended Details,Appears On Your Statement As,Address,Town/City,Postcode,Country,Reference,Category\n";

    fn parse(csv: &[u8]) -> Result<Vec<TransactionRow>, ParseError> {
        let mut input = csv;
        AmexParser::new().parse(&mut input)
    }

    #[test]
    fn test_amex_parser_parse_sample() {
        let rows = parse(include_bytes!("../../testdata/amex_sample.csv")).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].date, "15/01/2026");
        assert_eq!(rows[0].description, "TEST RESTAURANT LONDON");
        assert_eq!(rows[0].amount, RawAmount::Signed("-25.50".to_string()));
        assert_eq!(rows[0].bank, "amex");
        assert_eq!(rows[0].category.as_deref(), Some("Entertainment-Restaurants"));

        assert_eq!(rows[1].description, "PAYMENT RECEIVED - THANK YOU");
        assert_eq!(rows[1].category, None);

        assert_eq!(rows[2].category.as_deref(), Some("Entertainment-Bars & Cafés"));
        assert_eq!(rows[3].amount, RawAmount::Signed("-1,045.20".to_string()));
    }

    #[test]
    fn test_amex_parser_without_category_column() {
        let csv = b"Date,Description,Amount\n15/01/2026,TEST,-1.00\n16/01/2026,OTHER,2.00\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.category.is_none()));
    }

    #[test]
    fn test_amex_parser_category_trimmed_and_short_rows_tolerated() {
        // Category is optional, so a row ending before it is fine
        let csv = b"Date,Description,Amount,Category\n15/01/2026,A,-1.00,  Travel  \n16/01/2026,B,-2.00,   \n17/01/2026,C,-3.00\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows[0].category.as_deref(), Some("Travel"));
        assert_eq!(rows[1].category, None);
        assert_eq!(rows[2].category, None);
    }

    #[test]
    fn test_amex_parser_missing_columns() {
        let err = parse(b"Date,Description\n15/01/2026,TEST\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredColumns);
        assert!(err.to_string().contains("Amount"));
    }

    #[test]
    fn test_amex_parser_header_match_is_case_sensitive() {
        let err = parse(b"date,description,amount\n15/01/2026,TEST,1.00\n").unwrap_err();
        match err {
            ParseError::MissingRequiredColumns { missing, .. } => {
                assert_eq!(missing, vec!["Date", "Description", "Amount"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_amex_parser_row_too_short() {
        let csv = format!("{HEADER}15/01/2026,TEST,MR TEST,-12345,-25.50\n16/01/2026,SHORT,MR TEST\n");
        let err = parse(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowTooShort);
        assert_eq!(err.row(), Some(2));
    }

    #[test]
    fn test_amex_parser_empty_stream() {
        let err = parse(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingHeader);
    }

    #[test]
    fn test_amex_parser_header_only() {
        assert!(parse(HEADER.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_amex_parser_latin1_category() {
        let mut csv = HEADER.as_bytes().to_vec();
        csv.extend_from_slice(b"17/01/2026,CAFE,MR TEST,-12345,-4.75,,,,,,,AT1,Bars & Caf\xe9s\n");
        let rows = parse(&csv).unwrap();
        assert_eq!(rows[0].category.as_deref(), Some("Bars & Cafés"));
    }
}
