// 🔄 Mapper
// TransactionRow (raw strings) -> Transaction (typed, signed, dated)

use crate::amount::parse_amount;
use crate::dates::parse_date_with;
use crate::error::{ParseError, RowError};
use crate::parser::{BankType, RawAmount, TransactionRow};
use crate::transaction::{Money, Transaction};

/// Normalize every row parsed for `bank_type`.
///
/// All or nothing: the first bad row fails the whole batch and its 1-based
/// position in `rows` is reported. Each output transaction carries the bank
/// identifier of its source row.
pub fn map_rows(rows: &[TransactionRow], bank_type: &str) -> Result<Vec<Transaction>, ParseError> {
    let bank = BankType::from_id(bank_type)
        .ok_or_else(|| ParseError::UnknownBankType(bank_type.to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            map_row(row, bank).map_err(|source| ParseError::Row {
                bank: bank.id().to_string(),
                row: i + 1,
                source,
            })
        })
        .collect()
}

fn map_row(row: &TransactionRow, bank: BankType) -> Result<Transaction, RowError> {
    let date = parse_date_with(&row.date, bank.id(), bank.date_format())?;
    let minor_units = resolve_amount(&row.amount)?;

    Ok(Transaction {
        date,
        description: row.description.clone(),
        amount: Money::new(minor_units, bank.currency()),
        bank: row.bank.clone(),
        category: row.category.clone().filter(|c| !c.is_empty()),
    })
}

/// Signed minor units for a raw amount; money out is negative.
///
/// With split columns a populated "Paid out" takes precedence over "Paid in",
/// and a row with neither is a zero-value transaction.
fn resolve_amount(amount: &RawAmount) -> Result<i64, RowError> {
    let parse = |field: &'static str, raw: &str| {
        parse_amount(raw).map_err(|source| RowError::Amount { field, source })
    };

    match amount {
        RawAmount::Signed(raw) => parse("Amount", raw),
        RawAmount::Split {
            paid_out: Some(raw),
            ..
        } => parse("Paid out", raw).map(|v| -v),
        RawAmount::Split {
            paid_out: None,
            paid_in: Some(raw),
        } => parse("Paid in", raw),
        RawAmount::Split {
            paid_out: None,
            paid_in: None,
        } => Ok(0),
    }
}
