use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use statement_ingest::config::{setup_logging, DEFAULT_DATABASE_PATH, DEFAULT_LOG_LEVEL};
use statement_ingest::{
    count_transactions, get_all_transactions, get_transactions_by_bank, open_database,
    parse_statement, upload_transactions, BankType, SqliteSink, StoredTransaction, Transaction,
};

#[derive(Debug, Parser)]
#[command(name = "finances", version, about = "Import bank statement CSV exports")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "FINANCES_DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    db: PathBuf,

    #[arg(long, global = true, env = "FINANCES_LOG", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a statement export and store its transactions
    Import {
        /// Bank identifier (see `finances banks`)
        #[arg(long)]
        bank: String,

        file: PathBuf,

        /// Parse and print without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show stored transactions, newest first
    List {
        #[arg(long)]
        bank: Option<String>,
    },
    /// List supported banks
    Banks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    match cli.command {
        Command::Import {
            bank,
            file,
            dry_run: true,
        } => run_dry_run(&bank, &file),
        Command::Import { bank, file, .. } => {
            let mut conn = open_database(&cli.db)?;
            run_import(&mut conn, &bank, &file)?;
            Ok(())
        }
        Command::List { bank } => {
            let conn = open_database(&cli.db)?;
            run_list(&conn, bank.as_deref())
        }
        Command::Banks => {
            run_banks();
            Ok(())
        }
    }
}

fn open_statement(file: &Path) -> Result<BufReader<File>> {
    let handle =
        File::open(file).with_context(|| format!("Failed to open statement {}", file.display()))?;
    Ok(BufReader::new(handle))
}

fn run_import(conn: &mut Connection, bank: &str, file: &Path) -> Result<usize> {
    println!("📂 Importing {} ({})", file.display(), bank);

    let mut reader = open_statement(file)?;
    let stored = upload_transactions(&mut SqliteSink::new(conn), bank, &mut reader)
        .with_context(|| format!("Import of {} failed", file.display()))?;

    let total = count_transactions(conn)?;
    println!("✓ Inserted: {} transactions", stored);
    println!("✓ Database contains {} transactions", total);

    Ok(stored)
}

fn run_dry_run(bank: &str, file: &Path) -> Result<()> {
    let mut reader = open_statement(file)?;
    let transactions = parse_statement(&mut reader, bank)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    for tx in &transactions {
        println!("{}", format_transaction(tx));
    }
    println!("\n✓ Parsed {} transactions (dry run, nothing stored)", transactions.len());

    Ok(())
}

fn run_list(conn: &Connection, bank: Option<&str>) -> Result<()> {
    let stored: Vec<StoredTransaction> = match bank {
        Some(bank) => get_transactions_by_bank(conn, bank)?,
        None => get_all_transactions(conn)?,
    };

    for row in &stored {
        println!("{}", format_transaction(&row.transaction));
    }
    println!("\n{} transactions", stored.len());

    Ok(())
}

fn run_banks() {
    for bank in BankType::ALL {
        println!(
            "{:<12} {} ({}, dates as {})",
            bank.id(),
            bank.name(),
            bank.currency(),
            bank.date_format()
        );
    }
}

fn format_transaction(tx: &Transaction) -> String {
    format!(
        "{}  {:>12}  {:<10}  {}{}",
        tx.date,
        tx.amount.display(),
        tx.bank,
        tx.description,
        tx.category
            .as_deref()
            .map(|c| format!(" [{}]", c))
            .unwrap_or_default()
    )
}
