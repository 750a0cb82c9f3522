use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{account::AccountKind, command::OperationKind};

#[derive(Debug, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub action: OperationKind,
    pub account: Option<String>,
    pub amount: Option<Decimal>,
    /// Receiving account of a transfer.
    pub target: Option<String>,
    /// Variant of an account being opened.
    pub kind: Option<AccountKind>,
}

/// Parses an operation list in CSV format, yielding each row with its line number.
pub struct CsvOperationParser<R> {
    iter: DeserializeRecordsIntoIter<R, Operation>,
}

impl<R> CsvOperationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvOperationParser<R>
where
    R: Read,
{
    type Item = (u64, Result<Operation, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
