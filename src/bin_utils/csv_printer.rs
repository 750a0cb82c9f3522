use std::io::Write;

use chrono::{DateTime, Utc};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::recorder::TransactionType;

#[derive(Debug, Serialize)]
pub struct AccountRow<'a> {
    pub account: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HistoryRow<'a> {
    pub account: &'a str,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

pub fn print_rows<W, S>(output: &mut W, rows: impl Iterator<Item = S>) -> anyhow::Result<()>
where
    W: Write,
    S: Serialize,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
