//! Batch runner used by the binary and the integration tests: reads operations
//! as CSV, feeds them to a [`Session`] and writes a CSV report.

use std::io::{Read, Write};

use anyhow::Result;
use chrono::Duration;
use csv_parser::CsvOperationParser;
use csv_printer::{AccountRow, HistoryRow, print_rows};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    command::LedgerCommand,
    premium::PremiumStore,
    processor::{Outcome, TransactionProcessError, TransactionProcessor, session::Session},
    recorder::TransactionLog,
    store::{LedgerStore, StoreError},
};

pub mod csv_parser;
pub mod csv_printer;

/// Premium members get a warning this close to expiry.
const EXPIRY_WARNING_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("Malformed row: {0}")]
    Parse(#[from] csv::Error),
    #[error(transparent)]
    Process(#[from] TransactionProcessError),
    #[error("Applied, but the transaction was not recorded: {0}")]
    Unrecorded(StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Report {
    #[default]
    Balances,
    History,
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub report: Report,
    pub error_printer: Box<dyn FnMut(u64, RowError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run<L, T, P>(mut self, session: &mut Session<L, T, P>) -> Result<()>
    where
        L: LedgerStore,
        T: TransactionLog,
        P: PremiumStore,
    {
        let parser = CsvOperationParser::new(self.input);

        for (line, row) in parser {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    (self.error_printer)(line, err.into());
                    continue;
                }
            };
            let outcome = LedgerCommand::parse_command(
                row.action,
                row.account,
                row.amount,
                row.target,
                row.kind,
            )
            .map_err(TransactionProcessError::from)
            .and_then(|cmd| session.process_command(cmd));

            match outcome {
                Ok(Outcome::BalancesChanged { log_failures, .. }) => {
                    for err in log_failures {
                        (self.error_printer)(line, RowError::Unrecorded(err));
                    }
                }
                Ok(Outcome::PremiumUpgrade { activated: false }) => {
                    info!(line, username = session.username(), "already a premium member");
                }
                Ok(_) => {}
                Err(err) => (self.error_printer)(line, err.into()),
            }
        }

        if session.premium_expires_within(Duration::days(EXPIRY_WARNING_DAYS))? {
            warn!(
                username = session.username(),
                days_left = session.premium_days_left()?,
                "premium membership expires soon"
            );
        }

        match self.report {
            Report::Balances => print_rows(
                self.output,
                session.accounts().map(|acc| AccountRow {
                    account: acc.name(),
                    kind: acc.kind().as_str(),
                    balance: acc.balance(),
                }),
            ),
            Report::History => {
                let history = session.history()?;
                print_rows(
                    self.output,
                    history.iter().map(|record| HistoryRow {
                        account: &record.account,
                        kind: record.kind,
                        amount: record.amount,
                        fee: record.fee,
                        timestamp: record.timestamp,
                    }),
                )
            }
        }
    }
}
