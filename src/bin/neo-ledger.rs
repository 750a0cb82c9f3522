use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use neo_ledger::{
    bin_utils::{Report, RowError, Service},
    clock::SystemClock,
    config::LedgerConfig,
    processor::session::{Session, Stores},
    store::file::{CsvTransactionLog, JsonLedgerStore, JsonPremiumStore},
};

const CONFIG_ENV: &str = "NEO_LEDGER_CONFIG";
const USAGE: &str = "neo-ledger <data-dir> <username> <operations.csv> [balances|history]";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(
        args.next()
            .with_context(|| format!("Expected a data directory. Usage: {USAGE}"))?,
    );
    let username = args
        .next()
        .with_context(|| format!("Expected a username. Usage: {USAGE}"))?;
    let filename = args
        .next()
        .with_context(|| format!("Expected an operations file. Usage: {USAGE}"))?;
    let report = match args.next().as_deref() {
        None | Some("balances") => Report::Balances,
        Some("history") => Report::History,
        Some(other) => anyhow::bail!("Unknown report `{other}`. Usage: {USAGE}"),
    };

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => LedgerConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from {CONFIG_ENV}"))?,
        None => LedgerConfig::default(),
    };

    let file = File::open(&filename).with_context(|| format!("Failed to open `{filename}`"))?;
    let stores = Stores {
        ledger: JsonLedgerStore::new(&data_dir)
            .with_context(|| format!("Failed to prepare `{}`", data_dir.display()))?,
        log: CsvTransactionLog::new(data_dir.join("transactions.csv")),
        premium: JsonPremiumStore::new(data_dir.join("premium_members.json")),
    };
    let mut session = Session::open(username, stores, Arc::new(SystemClock), config)
        .context("Failed to load ledger")?;

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        report,
        error_printer: Box::new(|line, err| match err {
            RowError::Process(err) => eprintln!("Rejected operation at line {line}: {err}"),
            err => eprintln!("Error at line {line}: {err}"),
        }),
    };
    service.run(&mut session)
}
