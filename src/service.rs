// 📥 Upload Service
// Parser + Mapper + storage, with failures classified for the caller

use crate::error::{ImportError, ParseError};
use crate::mapper::map_rows;
use crate::parser::get_parser;
use crate::transaction::Transaction;
use std::io::Read;

/// Destination for normalized transactions (database, in-memory buffer, ...)
pub trait TransactionSink {
    /// Persist the whole batch atomically and return how many were stored
    fn store(&mut self, transactions: &[Transaction]) -> anyhow::Result<usize>;
}

impl TransactionSink for Vec<Transaction> {
    fn store(&mut self, transactions: &[Transaction]) -> anyhow::Result<usize> {
        self.extend_from_slice(transactions);
        Ok(transactions.len())
    }
}

/// Read a full statement export for `bank_type` into normalized transactions.
///
/// Identical input always produces identical output; nothing is stored.
pub fn parse_statement(
    input: &mut dyn Read,
    bank_type: &str,
) -> Result<Vec<Transaction>, ParseError> {
    let parser = get_parser(bank_type)?;
    let rows = parser.parse(input)?;
    map_rows(&rows, parser.bank_type().id())
}

/// Parse a statement and hand the result to `sink`.
///
/// Either every transaction in the file reaches the sink or none do.
pub fn upload_transactions<S: TransactionSink + ?Sized>(
    sink: &mut S,
    bank_type: &str,
    input: &mut dyn Read,
) -> Result<usize, ImportError> {
    let transactions = parse_statement(input, bank_type).map_err(|err| match err {
        ParseError::UnsupportedBankType(_) => ImportError::InvalidBankType(err),
        other => ImportError::ParseFailure(other),
    })?;

    tracing::debug!(bank = bank_type, parsed = transactions.len(), "statement parsed");

    let stored = sink.store(&transactions).map_err(ImportError::Storage)?;

    tracing::info!(bank = bank_type, stored, "statement imported");
    Ok(stored)
}
