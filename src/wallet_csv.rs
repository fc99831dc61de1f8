//! CSV import/export of wallet groups.
//!
//! Import columns (headers matched case-insensitively, in any order):
//! `walletAddress, tokenName, investedAmount, entryMarketCap, exitMarketCap`.

use crate::domain::{new_wallet_id, CalculatedWallet, Decimal, WalletRecord};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

const WALLET_ADDRESS: &str = "walletAddress";
const TOKEN_NAME: &str = "tokenName";
const INVESTED_AMOUNT: &str = "investedAmount";
const ENTRY_MARKET_CAP: &str = "entryMarketCap";
const EXIT_MARKET_CAP: &str = "exitMarketCap";

const EXPORT_HEADERS: [&str; 11] = [
    "id",
    WALLET_ADDRESS,
    TOKEN_NAME,
    INVESTED_AMOUNT,
    ENTRY_MARKET_CAP,
    EXIT_MARKET_CAP,
    "rawPnl",
    "pnlPercentage",
    "redistributionAmount",
    "finalBalance",
    "isProfit",
];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing column: {0}")]
    MissingColumn(&'static str),
    #[error("line {line}: invalid {column}: {value:?}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
}

struct Columns {
    wallet_address: usize,
    token_name: usize,
    invested_amount: usize,
    entry_market_cap: usize,
    exit_market_cap: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, CsvError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(CsvError::MissingColumn(name))
        };
        Ok(Self {
            wallet_address: find(WALLET_ADDRESS)?,
            token_name: find(TOKEN_NAME)?,
            invested_amount: find(INVESTED_AMOUNT)?,
            entry_market_cap: find(ENTRY_MARKET_CAP)?,
            exit_market_cap: find(EXIT_MARKET_CAP)?,
        })
    }
}

/// Parse wallet records from CSV. Each row gets a fresh id; blank rows are skipped.
pub fn import_wallets<R: Read>(reader: R) -> Result<Vec<WalletRecord>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::locate(reader.headers()?)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let wallet_address = field(columns.wallet_address);
        if wallet_address.is_empty() {
            return Err(CsvError::InvalidValue {
                line,
                column: WALLET_ADDRESS,
                value: String::new(),
            });
        }

        records.push(WalletRecord::new(
            new_wallet_id(),
            wallet_address,
            field(columns.token_name),
            parse_amount(field(columns.invested_amount), line, INVESTED_AMOUNT)?,
            parse_amount(field(columns.entry_market_cap), line, ENTRY_MARKET_CAP)?,
            parse_amount(field(columns.exit_market_cap), line, EXIT_MARKET_CAP)?,
        ));
    }

    Ok(records)
}

pub fn import_wallets_from_path(path: &Path) -> Result<Vec<WalletRecord>, CsvError> {
    let file = std::fs::File::open(path)?;
    import_wallets(file)
}

/// Non-negative decimal; a leading `$` and thousands separators are tolerated.
fn parse_amount(raw: &str, line: u64, column: &'static str) -> Result<Decimal, CsvError> {
    let cleaned: String = raw
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let invalid = || CsvError::InvalidValue {
        line,
        column,
        value: raw.to_string(),
    };
    let value = Decimal::from_str_canonical(&cleaned).map_err(|_| invalid())?;
    if value.is_negative() {
        return Err(invalid());
    }
    Ok(value)
}

/// Write calculated wallets as CSV with a header row.
pub fn export_wallets<W: Write>(writer: W, wallets: &[CalculatedWallet]) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADERS)?;
    for w in wallets {
        writer.write_record([
            w.wallet.id.clone(),
            w.wallet.wallet_address.clone(),
            w.wallet.token_name.clone(),
            w.wallet.invested_amount.to_canonical_string(),
            w.wallet.entry_market_cap.to_canonical_string(),
            w.wallet.exit_market_cap.to_canonical_string(),
            w.raw_pnl.to_canonical_string(),
            w.pnl_percentage.to_canonical_string(),
            w.redistribution_amount.to_canonical_string(),
            w.final_balance.to_canonical_string(),
            w.is_profit.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_wallets_to_string(wallets: &[CalculatedWallet]) -> Result<String, CsvError> {
    let mut buf = Vec::new();
    export_wallets(&mut buf, wallets)?;
    String::from_utf8(buf).map_err(|e| CsvError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
