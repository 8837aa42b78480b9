// Statement Ingest - Core Library
// Bank CSV exports -> normalized transactions, for the CLI, API server and tests

pub mod amount;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod service;
pub mod transaction;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use amount::parse_amount;
pub use dates::{date_format, parse_date};
pub use db::{
    count_transactions, get_all_transactions, get_transactions_by_bank, insert_transactions,
    open_database, setup_database, SqliteSink, StoredTransaction,
};
pub use error::{AmountError, DateError, ErrorKind, ImportError, ParseError, RowError};
pub use mapper::map_rows;
pub use parser::{
    get_parser, supported_banks, AmexParser, BankParser, BankType, NationwideParser, RawAmount,
    TransactionRow,
};
pub use service::{parse_statement, upload_transactions, TransactionSink};
pub use transaction::{Money, Transaction};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
